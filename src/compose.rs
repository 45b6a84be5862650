// src/compose.rs — 最终画布：上方二维码，下方居中的凭据标签

use crate::config::{LabelConfig, LayoutConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::label::{render_label, LabelBlock};
use crate::qr::QrBitmap;
use image::{imageops, RgbImage};

/// 超过该像素数的画布直接拒绝，不分配
pub(crate) const MAX_CANVAS_PIXELS: u64 = 1 << 28;

#[derive(Debug, Clone)]
pub struct ComposedImage {
    pub image: RgbImage,
    /// 二维码位图左上角坐标
    pub qr_origin: (u32, u32),
    /// 第一行标签的顶部
    pub label_top: u32,
}

impl ComposedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// 测量 `ssid`/`password` 标签并排在 `qr` 下方
pub fn compose(
    qr: &QrBitmap,
    ssid: &str,
    password: &str,
    label_cfg: &LabelConfig,
    layout: &LayoutConfig,
) -> PipelineResult<ComposedImage> {
    let label = render_label(ssid, password, label_cfg);
    compose_with_label(qr, &label, layout)
}

/// width  = max(qr, label + 2*padding)
/// height = qr + label + 3*padding
pub fn compose_with_label(
    qr: &QrBitmap,
    label: &LabelBlock,
    layout: &LayoutConfig,
) -> PipelineResult<ComposedImage> {
    let (width, height) = canvas_size(qr.width(), qr.height(), label, layout.padding)?;
    if width as u64 * height as u64 > MAX_CANVAS_PIXELS {
        return Err(PipelineError::Composition(format!(
            "canvas {width}x{height} is too large"
        )));
    }

    let mut canvas = RgbImage::from_pixel(width, height, layout.background.rgb());
    let qr_x = (width - qr.width()) / 2;
    let qr_y = layout.padding;
    imageops::replace(&mut canvas, &qr.image, qr_x as i64, qr_y as i64);

    let label_top = qr.height() + 2 * layout.padding;
    label.draw(&mut canvas, label_top, width, layout.foreground.rgb());

    tracing::debug!(width, height, qr_x, label_top, "composed canvas");
    Ok(ComposedImage {
        image: canvas,
        qr_origin: (qr_x, qr_y),
        label_top,
    })
}

fn canvas_size(qr_w: u32, qr_h: u32, label: &LabelBlock, padding: u32) -> PipelineResult<(u32, u32)> {
    let overflow = || PipelineError::Composition("canvas dimensions overflow".into());
    let label_w = padding
        .checked_mul(2)
        .and_then(|p| label.width.checked_add(p))
        .ok_or_else(overflow)?;
    let height = padding
        .checked_mul(3)
        .and_then(|p| p.checked_add(qr_h))
        .and_then(|h| h.checked_add(label.height))
        .ok_or_else(overflow)?;
    Ok((qr_w.max(label_w), height))
}
