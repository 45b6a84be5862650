// src/output.rs — PNG 落盘：先写临时文件再不覆盖地改名，不会报告写一半的图片

use crate::compose::ComposedImage;
use crate::error::{PipelineError, PipelineResult};
use chrono::{DateTime, Local};
use image::ImageFormat;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_PREFIX: &str = "wifi2qr";

/// 已成功写入的图片
#[derive(Debug, Clone, Serialize)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub timestamp: DateTime<Local>,
}

/// 把 `image` 写到 `<output_dir>/<prefix>_<YYYYMMDD_HHMMSS>.png`
pub fn save(image: &ComposedImage, output_dir: &Path, prefix: &str) -> PipelineResult<OutputArtifact> {
    save_at(image, output_dir, prefix, Local::now())
}

/// 同 [`save`]，时间戳由调用方给出
pub fn save_at(
    image: &ComposedImage,
    output_dir: &Path,
    prefix: &str,
    timestamp: DateTime<Local>,
) -> PipelineResult<OutputArtifact> {
    ensure_dir(output_dir)?;

    let mut tmp = NamedTempFile::new_in(output_dir).map_err(|source| PipelineError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;
    if let Err(source) = write_png(image, tmp.as_file_mut()) {
        return Err(PipelineError::Write {
            path: tmp.path().to_path_buf(),
            source,
        });
    }

    // 绝不覆盖已有文件，包括其他程序写的
    let stem = format!("{prefix}_{}", timestamp.format("%Y%m%d_%H%M%S"));
    let mut n = 0u32;
    loop {
        let path = candidate_path(output_dir, &stem, n);
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                if n > 0 {
                    tracing::warn!(
                        using = %path.display(),
                        "output name already used this second, added a suffix"
                    );
                }
                tracing::info!(path = %path.display(), "saved QR image");
                return Ok(OutputArtifact { path, timestamp });
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                tmp = e.file;
                n += 1;
            }
            Err(e) => return Err(PipelineError::Write { path, source: e.error }),
        }
    }
}

fn ensure_dir(dir: &Path) -> PipelineResult<()> {
    fs::create_dir_all(dir).map_err(|source| {
        let path = dir.to_path_buf();
        if source.kind() == ErrorKind::PermissionDenied {
            PipelineError::DirectoryPermission { path, source }
        } else {
            PipelineError::DirectoryCreation { path, source }
        }
    })
}

/// `<stem>.png`, then `<stem>_<n>.png`.
fn candidate_path(dir: &Path, stem: &str, n: u32) -> PathBuf {
    if n == 0 {
        dir.join(format!("{stem}.png"))
    } else {
        dir.join(format!("{stem}_{n}.png"))
    }
}

fn write_png(image: &ComposedImage, file: &mut File) -> std::io::Result<()> {
    let mut out = BufWriter::new(&mut *file);
    image
        .image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(std::io::Error::other)?;
    out.flush()?;
    drop(out);
    file.sync_all()
}
