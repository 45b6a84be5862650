// src/app.rs — Application：持有配置、流水线、表单与通知

use crate::config::Config;
use crate::error::PipelineError;
use crate::lock::GenerationLock;
use crate::notify::Notifier;
use crate::output::OutputArtifact;
use crate::pipeline::Pipeline;
use crate::rofi;
use crate::types::Submission;
use anyhow::Result;
use std::path::PathBuf;

/// 一次提交的结果
#[derive(Debug)]
pub enum SubmitOutcome {
    Saved(OutputArtifact),
    /// 另一次生成持有锁，未写入任何文件
    Busy,
    Failed(PipelineError),
}

pub struct Application {
    pipeline: Pipeline,
    notifier: Notifier,
    lock_path: PathBuf,
}

impl Application {
    pub fn new(config: Config) -> Self {
        Self::with_lock_path(config, Config::lock_path())
    }

    pub fn with_lock_path(config: Config, lock_path: PathBuf) -> Self {
        let notifier = Notifier::new(config.notify);
        Self {
            pipeline: Pipeline::new(config),
            notifier,
            lock_path,
        }
    }

    pub fn config(&self) -> &Config {
        self.pipeline.config()
    }

    /// 持锁执行一次生成
    pub fn submit(&self, submission: &Submission) -> Result<SubmitOutcome> {
        let Some(_guard) = GenerationLock::try_acquire(&self.lock_path)? else {
            tracing::warn!("generation already in progress, submission ignored");
            return Ok(SubmitOutcome::Busy);
        };
        Ok(match self.pipeline.generate(submission) {
            Ok(artifact) => SubmitOutcome::Saved(artifact),
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                SubmitOutcome::Failed(e)
            }
        })
    }

    /// 交互循环：表单 → 提交 → 通知，直到用户取消
    pub async fn run_form(&self) -> Result<()> {
        let cfg = self.config();
        loop {
            let Some(submission) = rofi::read_submission(cfg.encryption, &cfg.rofi).await else {
                return Ok(());
            };

            match self.submit(&submission)? {
                SubmitOutcome::Saved(artifact) => {
                    self.notifier.normal("QR code saved", &artifact.path.display().to_string());
                    if !rofi::confirm("Generate another?", &cfg.rofi).await {
                        return Ok(());
                    }
                }
                SubmitOutcome::Busy => {
                    self.notifier.low("Busy", "A QR code is already being generated");
                }
                // 用户可修正的错误：直接回到表单
                SubmitOutcome::Failed(e) if e.is_user_correctable() => {
                    self.notifier.critical(e.title(), &e.to_string());
                }
                SubmitOutcome::Failed(e) => {
                    self.notifier.critical(e.title(), &e.to_string());
                    if !rofi::confirm("Try again?", &cfg.rofi).await {
                        return Ok(());
                    }
                }
            }
        }
    }
}
