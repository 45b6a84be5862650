// src/qr.rs — 用 qrcode crate 生成二维码并栅格化

use crate::compose::MAX_CANVAS_PIXELS;
use crate::config::QrConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::payload::EscapedPayload;
use image::RgbImage;
use qrcode::render::unicode;
use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode, Version};
use serde::{Deserialize, Serialize};

/// 纠错等级，冗余从低到高
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QrTier {
    L,
    M,
    Q,
    H,
}

impl QrTier {
    fn ec_level(self) -> EcLevel {
        match self {
            QrTier::L => EcLevel::L,
            QrTier::M => EcLevel::M,
            QrTier::Q => EcLevel::Q,
            QrTier::H => EcLevel::H,
        }
    }

    /// 下一档纠错等级，L 以下为 `None`
    fn lower(self) -> Option<QrTier> {
        match self {
            QrTier::H => Some(QrTier::Q),
            QrTier::Q => Some(QrTier::M),
            QrTier::M => Some(QrTier::L),
            QrTier::L => None,
        }
    }
}

/// 二维码版本：按内容自动选择，或固定为 1..=40
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "VersionSetting", into = "VersionSetting")]
pub enum QrVersion {
    #[default]
    Auto,
    Fixed(i16),
}

/// 配置文件中的写法：`"auto"` 或数字
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionSetting {
    Number(i16),
    Keyword(String),
}

impl TryFrom<VersionSetting> for QrVersion {
    type Error = String;

    fn try_from(v: VersionSetting) -> Result<Self, Self::Error> {
        match v {
            VersionSetting::Number(n) if (1..=40).contains(&n) => Ok(QrVersion::Fixed(n)),
            VersionSetting::Number(n) => Err(format!("QR version {n} out of range 1..=40")),
            VersionSetting::Keyword(k) if k.eq_ignore_ascii_case("auto") => Ok(QrVersion::Auto),
            VersionSetting::Keyword(k) => Err(format!("QR version must be a number or \"auto\", got `{k}`")),
        }
    }
}

impl From<QrVersion> for VersionSetting {
    fn from(v: QrVersion) -> Self {
        match v {
            QrVersion::Auto => VersionSetting::Keyword("auto".into()),
            QrVersion::Fixed(n) => VersionSetting::Number(n),
        }
    }
}

/// 渲染结果及其参数
#[derive(Debug, Clone)]
pub struct QrBitmap {
    pub image: RgbImage,
    /// 每边模块数，不含静区
    pub modules: u32,
    pub version: i16,
    pub tier: QrTier,
    pub box_size: u32,
    pub border: u32,
}

impl QrBitmap {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// 编码 `payload`，每个模块画成 `cfg.box_size` 像素
pub fn render(payload: &EscapedPayload, cfg: &QrConfig) -> PipelineResult<QrBitmap> {
    if cfg.box_size == 0 {
        return Err(PipelineError::InvalidConfig("box_size must be at least 1".into()));
    }
    if let QrVersion::Fixed(v) = cfg.version {
        if !(1..=40).contains(&v) {
            return Err(PipelineError::InvalidConfig(format!("QR version {v} out of range 1..=40")));
        }
    }

    let (code, tier) = build_symbol(payload, cfg.error_correction, cfg.version)?;
    let version = match code.version() {
        Version::Normal(v) | Version::Micro(v) => v,
    };
    let modules = code.width() as u32;
    let (side, border_px) = bitmap_geometry(modules, cfg)?;

    let colors = code.to_colors();
    let (fg, bg) = (cfg.foreground.rgb(), cfg.background.rgb());
    let mut img = RgbImage::from_pixel(side, side, bg);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        if x < border_px || y < border_px {
            continue;
        }
        let mx = (x - border_px) / cfg.box_size;
        let my = (y - border_px) / cfg.box_size;
        if mx >= modules || my >= modules {
            continue;
        }
        if colors[(my * modules + mx) as usize] == Color::Dark {
            *pixel = fg;
        }
    }

    tracing::debug!(version, ?tier, modules, side, "rendered QR bitmap");
    Ok(QrBitmap {
        image: img,
        modules,
        version,
        tier,
        box_size: cfg.box_size,
        border: cfg.border,
    })
}

/// 边长与静区宽度（像素），分配内存前先检查
fn bitmap_geometry(modules: u32, cfg: &QrConfig) -> PipelineResult<(u32, u32)> {
    let too_large = || {
        PipelineError::InvalidConfig(format!(
            "QR image too large (box_size {}, border {})",
            cfg.box_size, cfg.border
        ))
    };
    let side = cfg
        .border
        .checked_mul(2)
        .and_then(|b| b.checked_add(modules))
        .and_then(|m| m.checked_mul(cfg.box_size))
        .ok_or_else(too_large)?;
    let border_px = cfg.border.checked_mul(cfg.box_size).ok_or_else(too_large)?;
    if side as u64 * side as u64 > MAX_CANVAS_PIXELS {
        return Err(too_large());
    }
    Ok((side, border_px))
}

/// 先试请求的纠错等级，放不下再逐级降低
fn build_symbol(
    payload: &EscapedPayload,
    requested: QrTier,
    version: QrVersion,
) -> PipelineResult<(QrCode, QrTier)> {
    let data = payload.as_str().as_bytes();
    let mut tier = Some(requested);
    while let Some(t) = tier {
        let attempt = match version {
            QrVersion::Auto => QrCode::with_error_correction_level(data, t.ec_level()),
            QrVersion::Fixed(v) => QrCode::with_version(data, Version::Normal(v), t.ec_level()),
        };
        match attempt {
            Ok(code) => {
                if t != requested {
                    tracing::warn!(?requested, used = ?t, "payload too long for requested error correction, lowered tier");
                }
                return Ok((code, t));
            }
            Err(QrError::DataTooLong) => tier = t.lower(),
            Err(e) => return Err(PipelineError::Composition(format!("QR encoding failed: {e}"))),
        }
    }
    Err(PipelineError::PayloadTooLarge { len: payload.len() })
}

/// 终端预览（半高块字符）
pub fn preview(payload: &EscapedPayload, tier: QrTier) -> PipelineResult<String> {
    let (code, _) = build_symbol(payload, tier, QrVersion::Auto)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .quiet_zone(true)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color as Rgb;
    use crate::payload::encode;
    use crate::types::Encryption;

    fn guest_payload() -> EscapedPayload {
        encode("Guest", "letmein123", Encryption::Wpa).unwrap()
    }

    /// 用独立的二维码识别库扫描位图
    fn decode(bmp: &QrBitmap) -> String {
        let luma = image::DynamicImage::ImageRgb8(bmp.image.clone()).into_luma8();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32).0[0],
        );
        let grids = prepared.detect_grids();
        assert_eq!(grids.len(), 1, "expected exactly one QR symbol");
        let (_, content) = grids[0].decode().unwrap();
        content
    }

    #[test]
    fn decoded_bitmap_yields_payload() {
        let cases = [
            ("Home WiFi", "p:a;ss,w\\rd", Encryption::Wpa),
            ("Guest", "letmein123", Encryption::Wpa2),
            ("Cafe", "", Encryption::Open),
            ("lab", "0123456789", Encryption::Wep),
        ];
        for (ssid, password, encryption) in cases {
            let payload = encode(ssid, password, encryption).unwrap();
            let bmp = render(&payload, &QrConfig::default()).unwrap();
            assert_eq!(decode(&bmp), payload.as_str(), "ssid {ssid}");
        }
    }

    #[test]
    fn decoded_bitmap_matches_escaped_example() {
        let payload = encode("Home WiFi", "p:a;ss,w\\rd", Encryption::Wpa).unwrap();
        let bmp = render(&payload, &QrConfig::default()).unwrap();
        assert_eq!(decode(&bmp), "WIFI:T:WPA;S:Home WiFi;P:p\\:a\\;ss\\,w\\\\rd;;");
    }

    #[test]
    fn decodes_with_pinned_version_and_colors() {
        let cfg = QrConfig {
            version: QrVersion::Fixed(6),
            error_correction: QrTier::H,
            box_size: 4,
            border: 2,
            foreground: Rgb([20, 20, 90]),
            background: Rgb([250, 250, 210]),
        };
        let payload = guest_payload();
        let bmp = render(&payload, &cfg).unwrap();
        assert_eq!(bmp.version, 6);
        assert_eq!(decode(&bmp), payload.as_str());
    }

    #[test]
    fn quiet_zone_is_blank() {
        let cfg = QrConfig::default();
        let bmp = render(&guest_payload(), &cfg).unwrap();
        let border_px = cfg.border * cfg.box_size;
        let white = image::Rgb([255, 255, 255]);
        for (x, y, p) in bmp.image.enumerate_pixels() {
            let inside = x >= border_px
                && y >= border_px
                && x < bmp.width() - border_px
                && y < bmp.height() - border_px;
            if !inside {
                assert_eq!(*p, white, "pixel ({x},{y}) in quiet zone");
            }
        }
    }

    #[test]
    fn auto_version_picks_smallest_fit() {
        // 33 字节超过 2-M（26 字节），放得进 3-M
        let bmp = render(&guest_payload(), &QrConfig::default()).unwrap();
        assert_eq!(bmp.version, 3);
        assert_eq!(bmp.modules, 29);
        assert_eq!((bmp.width(), bmp.height()), (370, 370));
    }

    #[test]
    fn geometry_follows_box_size_and_border() {
        let cfg = QrConfig {
            box_size: 3,
            border: 1,
            ..QrConfig::default()
        };
        let bmp = render(&guest_payload(), &cfg).unwrap();
        assert_eq!(bmp.width(), (bmp.modules + 2) * 3);
        assert_eq!(bmp.width(), bmp.height());
    }

    #[test]
    fn custom_colors_are_applied() {
        let cfg = QrConfig {
            foreground: Rgb([200, 0, 0]),
            background: Rgb([0, 0, 80]),
            ..QrConfig::default()
        };
        let bmp = render(&guest_payload(), &cfg).unwrap();
        assert_eq!(*bmp.image.get_pixel(0, 0), image::Rgb([0, 0, 80]));
        // 左上角定位图案的角总是深色
        let corner = cfg.border * cfg.box_size;
        assert_eq!(*bmp.image.get_pixel(corner, corner), image::Rgb([200, 0, 0]));
    }

    #[test]
    fn too_long_for_pinned_version_lowers_tier_then_fails() {
        let mut cfg = QrConfig {
            version: QrVersion::Fixed(1),
            error_correction: QrTier::H,
            ..QrConfig::default()
        };
        // 25 字节：版本 1 各档都放不下，2-M 可以，2-H 不行
        let payload = encode("abcdef", "x", Encryption::Wep).unwrap();
        assert_eq!(payload.len(), 25);
        let err = render(&payload, &cfg).unwrap_err();
        assert!(matches!(err, PipelineError::PayloadTooLarge { len: 25 }));

        cfg.version = QrVersion::Fixed(2);
        let bmp = render(&payload, &cfg).unwrap();
        assert_eq!(bmp.version, 2);
        assert!(bmp.tier < QrTier::H);
    }

    #[test]
    fn oversized_payload_is_reported() {
        let huge = "x".repeat(4000);
        let payload = encode(&huge, "pw", Encryption::Wpa).unwrap();
        let err = render(&payload, &QrConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::PayloadTooLarge { .. }));
        assert!(err.is_user_correctable());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = QrConfig {
            box_size: 0,
            ..QrConfig::default()
        };
        assert!(matches!(
            render(&guest_payload(), &cfg),
            Err(PipelineError::InvalidConfig(_))
        ));
        let cfg = QrConfig {
            version: QrVersion::Fixed(41),
            ..QrConfig::default()
        };
        assert!(matches!(
            render(&guest_payload(), &cfg),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn huge_border_or_box_size_is_refused() {
        let cfg = QrConfig {
            border: u32::MAX / 2,
            ..QrConfig::default()
        };
        assert!(matches!(
            render(&guest_payload(), &cfg),
            Err(PipelineError::InvalidConfig(_))
        ));

        // 乘法不溢出，但需要约 160 TB 内存
        let cfg = QrConfig {
            box_size: 200_000,
            ..QrConfig::default()
        };
        assert!(matches!(
            render(&guest_payload(), &cfg),
            Err(PipelineError::InvalidConfig(_))
        ));

        let cfg = QrConfig {
            border: 100_000,
            box_size: 100_000,
            ..QrConfig::default()
        };
        assert!(matches!(
            render(&guest_payload(), &cfg),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn preview_is_block_text() {
        let text = preview(&guest_payload(), QrTier::M).unwrap();
        assert!(text.lines().count() > 10);
        assert!(text.contains('█') || text.contains('▀') || text.contains('▄'));
    }
}
