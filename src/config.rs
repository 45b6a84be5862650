// src/config.rs — 配置加载，支持文件覆盖

use crate::output::DEFAULT_PREFIX;
use crate::qr::{QrTier, QrVersion};
use crate::types::Encryption;
use anyhow::{Context, Result};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PNG 输出目录，不存在时自动创建
    pub output_dir: PathBuf,
    /// 文件名前缀，`<prefix>_<timestamp>.png`
    pub prefix: String,
    /// 表单默认选中的加密方式
    pub encryption: Encryption,
    /// 发送桌面通知（关闭或不可用时降级到 stderr）
    pub notify: bool,
    pub qr: QrConfig,
    pub label: LabelConfig,
    pub layout: LayoutConfig,
    pub rofi: RofiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("qrcode"),
            prefix: DEFAULT_PREFIX.into(),
            encryption: Encryption::default(),
            notify: true,
            qr: QrConfig::default(),
            label: LabelConfig::default(),
            layout: LayoutConfig::default(),
            rofi: RofiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// 每个模块的像素数
    pub box_size: u32,
    /// 静区宽度（模块数）
    pub border: u32,
    pub error_correction: QrTier,
    pub version: QrVersion,
    pub foreground: Color,
    pub background: Color,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            box_size: 10,
            border: 4,
            error_correction: QrTier::M,
            version: QrVersion::Auto,
            foreground: Color::BLACK,
            background: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// 字号（像素）
    pub font_size: f32,
    /// 两行标签之间的间距
    pub line_spacing: u32,
    /// 优先于内置平台字体列表尝试
    pub font_paths: Vec<PathBuf>,
    /// 是否尝试平台字体；`false` 直接用内嵌字体
    pub system_fonts: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            line_spacing: 4,
            font_paths: vec![],
            system_fonts: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub padding: u32,
    pub background: Color,
    pub foreground: Color,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: 10,
            background: Color::WHITE,
            foreground: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RofiConfig {
    pub font: String,
    /// rofi 窗口位置 (0–8, 同 rofi -location)
    pub position: u8,
    pub x_offset: i32,
    pub y_offset: i32,
}

impl Default for RofiConfig {
    fn default() -> Self {
        Self {
            font: "DejaVu Sans Mono 10".into(),
            position: 0,
            x_offset: 0,
            y_offset: 0,
        }
    }
}

/// 24 位颜色，写作 `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Color = Color([0, 0, 0]);
    pub const WHITE: Color = Color([255, 255, 255]);

    pub fn rgb(self) -> Rgb<u8> {
        Rgb(self.0)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("invalid color `{s}`, expected #RRGGBB"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("invalid color `{s}`, expected #RRGGBB"))
        };
        Ok(Color([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        format!("#{:02X}{:02X}{:02X}", c.0[0], c.0[1], c.0[2])
    }
}

impl Config {
    /// 按优先级查找并加载配置文件，都不存在时用默认值
    pub fn load() -> Result<Self> {
        for path in config_candidates() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Config::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: Config =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// 返回生成互斥锁文件路径（防止两次生成并发）
    pub fn lock_path() -> PathBuf {
        runtime_dir().join("wifi2qr.lock")
    }
}

fn runtime_dir() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn config_candidates() -> Vec<PathBuf> {
    let mut v = vec![];
    // 同目录下的 config.toml
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            v.push(dir.join("config.toml"));
        }
    }
    // ~/.config/wifi2qr/config.toml
    if let Some(dir) = dirs::config_dir() {
        v.push(dir.join("wifi2qr").join("config.toml"));
    }
    v
}
