// src/label.rs — 凭据文字块：字体查找、测量、延迟绘制

use crate::config::LabelConfig;
use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use std::path::{Path, PathBuf};

const BITMAP_GLYPH: u32 = 8;
/// 字号上限，超出时截断
const MAX_FONT_PX: f32 = 512.0;

#[cfg(target_os = "macos")]
const PLATFORM_FONTS: &[&str] = &[
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Helvetica.ttc",
];

#[cfg(target_os = "windows")]
const PLATFORM_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\arialuni.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

/// 标签字体；内嵌点阵字体总是可用
pub enum LabelFont {
    TrueType {
        font: Font<'static>,
        scale: Scale,
        source: PathBuf,
    },
    Bitmap {
        /// 8x8 点阵的整数放大倍数
        factor: u32,
    },
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::TrueType { source, scale, .. } => f
                .debug_struct("TrueType")
                .field("source", source)
                .field("px", &scale.y)
                .finish(),
            LabelFont::Bitmap { factor } => f.debug_struct("Bitmap").field("factor", factor).finish(),
        }
    }
}

impl LabelFont {
    /// 取第一个能加载的候选字体，不会失败
    pub fn load(cfg: &LabelConfig) -> Self {
        let px = effective_size(cfg.font_size);
        for path in font_candidates(cfg) {
            match load_truetype(&path) {
                Some(font) => {
                    tracing::debug!(path = %path.display(), "label font loaded");
                    return LabelFont::TrueType {
                        font,
                        scale: Scale::uniform(px),
                        source: path,
                    };
                }
                None => tracing::debug!(path = %path.display(), "label font unavailable"),
            }
        }
        tracing::debug!("falling back to embedded bitmap font");
        Self::builtin(px)
    }

    pub fn builtin(px: f32) -> Self {
        let factor = (effective_size(px) / BITMAP_GLYPH as f32).round().max(1.0) as u32;
        LabelFont::Bitmap { factor }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, LabelFont::Bitmap { .. })
    }

    /// 单行 `text` 的宽高（像素）
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            LabelFont::TrueType { font, scale, .. } => {
                let v = font.v_metrics(*scale);
                let height = (v.ascent - v.descent).ceil().max(0.0) as u32;
                let mut width: f32 = 0.0;
                for g in font.layout(text, *scale, point(0.0, v.ascent)) {
                    let advance_end = g.position().x + g.unpositioned().h_metrics().advance_width;
                    width = width.max(advance_end);
                    if let Some(bb) = g.pixel_bounding_box() {
                        width = width.max(bb.max.x as f32);
                    }
                }
                (width.ceil() as u32, height)
            }
            LabelFont::Bitmap { factor } => {
                let cell = BITMAP_GLYPH.saturating_mul(*factor);
                let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
                (chars.saturating_mul(cell), cell)
            }
        }
    }

    /// 以 (`x`, `y`) 为左上角绘制 `text`，画布外的像素裁掉
    pub fn draw(&self, canvas: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
        match self {
            LabelFont::TrueType { font, scale, .. } => {
                let v = font.v_metrics(*scale);
                let origin = point(x as f32, y as f32 + v.ascent);
                for g in font.layout(text, *scale, origin) {
                    let Some(bb) = g.pixel_bounding_box() else {
                        continue;
                    };
                    g.draw(|gx, gy, coverage| {
                        blend(
                            canvas,
                            bb.min.x as i64 + gx as i64,
                            bb.min.y as i64 + gy as i64,
                            color,
                            coverage,
                        );
                    });
                }
            }
            LabelFont::Bitmap { factor } => {
                let f = *factor as i64;
                let cell = BITMAP_GLYPH as i64 * f;
                for (i, ch) in text.chars().enumerate() {
                    let glyph = bitmap_glyph(ch);
                    let cx = x + i as i64 * cell;
                    for (row, bits) in glyph.iter().enumerate() {
                        for col in 0..BITMAP_GLYPH as i64 {
                            if (*bits >> col) & 1 == 0 {
                                continue;
                            }
                            for sy in 0..f {
                                for sx in 0..f {
                                    blend(canvas, cx + col * f + sx, y + row as i64 * f + sy, color, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// 已测量的一行标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelLine {
    pub text: String,
    pub width: u32,
    pub height: u32,
}

/// 已测量的标签，稍后画到合成画布上
#[derive(Debug)]
pub struct LabelBlock {
    font: LabelFont,
    pub lines: Vec<LabelLine>,
    pub line_spacing: u32,
    pub width: u32,
    pub height: u32,
}

impl LabelBlock {
    /// 在 `canvas_width` 内逐行居中绘制，第一行顶部在 `top`
    pub fn draw(&self, canvas: &mut RgbImage, top: u32, canvas_width: u32, color: Rgb<u8>) {
        let mut y = top as i64;
        for line in &self.lines {
            let x = (canvas_width.saturating_sub(line.width) / 2) as i64;
            self.font.draw(canvas, x, y, &line.text, color);
            y += line.height as i64 + self.line_spacing as i64;
        }
    }
}

/// 显示原始（未转义）凭据的标签
pub fn render_label(ssid: &str, password: &str, cfg: &LabelConfig) -> LabelBlock {
    render_label_with(ssid, password, LabelFont::load(cfg), cfg.line_spacing)
}

pub fn render_label_with(ssid: &str, password: &str, font: LabelFont, line_spacing: u32) -> LabelBlock {
    let lines: Vec<LabelLine> = [format!("SSID: {ssid}"), format!("Password: {password}")]
        .into_iter()
        .map(|text| {
            let (width, height) = font.measure(&text);
            LabelLine { text, width, height }
        })
        .collect();

    let width = lines.iter().map(|l| l.width).max().unwrap_or(0);
    let gaps = line_spacing.saturating_mul((lines.len() as u32).saturating_sub(1));
    let height = lines
        .iter()
        .fold(gaps, |acc, l| acc.saturating_add(l.height));
    tracing::debug!(width, height, font = ?font, "measured label");

    LabelBlock {
        font,
        lines,
        line_spacing,
        width,
        height,
    }
}

fn font_candidates(cfg: &LabelConfig) -> Vec<PathBuf> {
    let mut v: Vec<PathBuf> = cfg.font_paths.clone();
    if cfg.system_fonts {
        v.extend(PLATFORM_FONTS.iter().map(PathBuf::from));
    }
    v
}

fn load_truetype(path: &Path) -> Option<Font<'static>> {
    let data = std::fs::read(path).ok()?;
    Font::try_from_vec(data)
}

fn effective_size(px: f32) -> f32 {
    if px > MAX_FONT_PX {
        tracing::warn!(px, max = MAX_FONT_PX, "label font size too large, clamped");
        MAX_FONT_PX
    } else if px.is_finite() && px > 0.0 {
        px
    } else {
        tracing::warn!(px, "invalid label font size, using 16");
        16.0
    }
}

fn bitmap_glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| GREEK_FONTS.get(ch))
        .or_else(|| HIRAGANA_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn blend(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let a = coverage.clamp(0.0, 1.0);
    if a == 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * (1.0 - a)).round() as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_system_fonts() -> LabelConfig {
        LabelConfig {
            system_fonts: false,
            ..LabelConfig::default()
        }
    }

    #[test]
    fn missing_fonts_fall_back_to_bitmap() {
        let cfg = LabelConfig {
            font_paths: vec![PathBuf::from("/nonexistent/font.ttf")],
            ..no_system_fonts()
        };
        let font = LabelFont::load(&cfg);
        assert!(font.is_builtin());
    }

    #[test]
    fn garbage_font_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let cfg = LabelConfig {
            font_paths: vec![path],
            ..no_system_fonts()
        };
        assert!(LabelFont::load(&cfg).is_builtin());
    }

    #[test]
    fn bitmap_scale_follows_font_size() {
        assert!(matches!(LabelFont::builtin(16.0), LabelFont::Bitmap { factor: 2 }));
        assert!(matches!(LabelFont::builtin(3.0), LabelFont::Bitmap { factor: 1 }));
        assert!(matches!(LabelFont::builtin(f32::NAN), LabelFont::Bitmap { factor: 2 }));
    }

    #[test]
    fn absurd_font_size_is_clamped() {
        let cfg = LabelConfig {
            font_size: 1.0e12,
            ..no_system_fonts()
        };
        let block = render_label("Guest", "letmein123", &cfg);
        // 512px → 放大 64 倍
        assert_eq!(block.lines[0].height, 512);
        assert_eq!(block.lines[1].width, 20 * 512);
        assert_eq!(block.height, 512 + 512 + 4);
        assert!(matches!(LabelFont::builtin(f32::INFINITY), LabelFont::Bitmap { factor: 64 }));
    }

    #[test]
    fn huge_line_spacing_saturates() {
        let block = render_label_with("a", "b", LabelFont::builtin(8.0), u32::MAX);
        assert_eq!(block.height, u32::MAX);
        let mut canvas = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        block.draw(&mut canvas, 0, 40, Rgb([0, 0, 0]));
    }

    #[test]
    fn block_dimensions_from_lines() {
        let block = render_label("Guest", "letmein123", &no_system_fonts());
        assert_eq!(block.lines[0].text, "SSID: Guest");
        assert_eq!(block.lines[1].text, "Password: letmein123");
        // 16px → 8x8 点阵放大 2 倍
        assert_eq!(block.lines[0].width, 11 * 16);
        assert_eq!(block.lines[1].width, 20 * 16);
        assert_eq!(block.width, 20 * 16);
        assert_eq!(block.height, 16 + 16 + 4);
    }

    #[test]
    fn label_shows_unescaped_text() {
        let block = render_label("a;b", "c:d\\e", &no_system_fonts());
        assert_eq!(block.lines[0].text, "SSID: a;b");
        assert_eq!(block.lines[1].text, "Password: c:d\\e");
    }

    #[test]
    fn multibyte_width_counts_chars() {
        let font = LabelFont::builtin(8.0);
        assert_eq!(font.measure("Café").0, 4 * 8);
    }

    #[test]
    fn draw_marks_pixels_inside_line_box() {
        let block = render_label("X", "Y", &no_system_fonts());
        let mut canvas = RgbImage::from_pixel(200, 60, Rgb([255, 255, 255]));
        block.draw(&mut canvas, 5, 200, Rgb([0, 0, 0]));

        let dark: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 128)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!dark.is_empty());
        let left = block.lines.iter().map(|l| (200 - l.width) / 2).min().unwrap();
        let right = block.lines.iter().map(|l| (200 - l.width) / 2 + l.width).max().unwrap();
        for (x, y) in dark {
            assert!(y >= 5 && y < 5 + block.height, "row {y} outside label");
            assert!(x >= left && x < right, "column {x} outside label");
        }
    }

    /// 第一个能解析的平台字体（如果装了的话）
    fn installed_font() -> Option<PathBuf> {
        PLATFORM_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|p| load_truetype(p).is_some())
    }

    #[test]
    fn truetype_line_height_and_ink_bounds() {
        let Some(path) = installed_font() else {
            eprintln!("no platform font installed, skipping");
            return;
        };
        let cfg = LabelConfig {
            font_paths: vec![path.clone()],
            ..no_system_fonts()
        };
        let font = LabelFont::load(&cfg);
        let LabelFont::TrueType { font: tt, scale, source } = &font else {
            panic!("{} did not load as TrueType", path.display());
        };
        assert_eq!(source, &path);

        let v = tt.v_metrics(*scale);
        let text = "SSID: Guest";
        let (w, h) = font.measure(text);
        assert_eq!(h, (v.ascent - v.descent).ceil() as u32);
        assert!(w > 0);

        let (ox, oy) = (20u32, 20u32);
        let mut canvas = RgbImage::from_pixel(w + 40, h + 40, Rgb([255, 255, 255]));
        font.draw(&mut canvas, ox as i64, oy as i64, text, Rgb([0, 0, 0]));

        let ink: Vec<(u32, u32)> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] < 250)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(!ink.is_empty());
        for (x, y) in ink {
            assert!(x >= ox && x <= ox + w, "column {x} outside measured width {w}");
            assert!(y >= oy && y <= oy + h, "row {y} outside measured height {h}");
        }
    }

    #[test]
    fn drawing_clips_at_canvas_edges() {
        let font = LabelFont::builtin(16.0);
        let mut canvas = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        font.draw(&mut canvas, -5, -5, "WWW", Rgb([0, 0, 0]));
        font.draw(&mut canvas, 8, 8, "WWW", Rgb([0, 0, 0]));
    }
}
