// src/error.rs — 生成流水线的错误分类

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// SSID 为空、缺少密码，或不支持的加密方式
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("payload of {len} bytes does not fit in any QR version, even at error correction L")]
    PayloadTooLarge { len: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot create output directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("permission denied creating output directory {}", path.display())]
    DirectoryPermission {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image composition failed: {0}")]
    Composition(String),
}

impl PipelineError {
    /// 用户改一下输入就能解决的错误
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidCredential(_) | PipelineError::PayloadTooLarge { .. }
        )
    }

    /// 通知标题
    pub fn title(&self) -> &'static str {
        match self {
            PipelineError::InvalidCredential(_) => "Invalid input",
            PipelineError::PayloadTooLarge { .. } => "Input too long",
            PipelineError::InvalidConfig(_) => "Configuration error",
            PipelineError::DirectoryCreation { .. } | PipelineError::DirectoryPermission { .. } => {
                "Cannot create output folder"
            }
            PipelineError::Write { .. } => "Save failed",
            PipelineError::Composition(_) => "Rendering failed",
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
