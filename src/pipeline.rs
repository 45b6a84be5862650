// src/pipeline.rs — 编码 → 二维码 → 标签 → 合成 → 写盘，每次提交跑一遍

use crate::compose::{compose, ComposedImage};
use crate::config::Config;
use crate::error::PipelineResult;
use crate::output::{self, OutputArtifact};
use crate::payload::{encode_credential, EscapedPayload};
use crate::qr;
use crate::types::{Credential, Submission};

/// 一次生成的全部产物（尚未写盘）
#[derive(Debug)]
pub struct Rendered {
    pub payload: EscapedPayload,
    pub image: ComposedImage,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 只在内存中生成最终图片，不碰文件系统
    pub fn render(&self, cred: &Credential) -> PipelineResult<Rendered> {
        tracing::info!(ssid = %cred.ssid(), encryption = %cred.encryption(), "generating QR image");

        let payload = encode_credential(cred);
        tracing::debug!(bytes = payload.len(), "payload encoded");

        let bitmap = qr::render(&payload, &self.config.qr)?;
        tracing::debug!(
            version = bitmap.version,
            tier = ?bitmap.tier,
            modules = bitmap.modules,
            side = bitmap.width(),
            "QR rendered"
        );

        let image = compose(
            &bitmap,
            cred.ssid(),
            cred.password(),
            &self.config.label,
            &self.config.layout,
        )?;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            qr_origin = ?image.qr_origin,
            label_top = image.label_top,
            "image composed"
        );

        Ok(Rendered { payload, image })
    }

    /// 校验、渲染并保存；完整写入后才返回路径
    pub fn generate(&self, submission: &Submission) -> PipelineResult<OutputArtifact> {
        let cred = submission.credential()?;
        let rendered = self.render(&cred)?;
        output::save(&rendered.image, &self.config.output_dir, &self.config.prefix)
    }
}
