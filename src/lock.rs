// src/lock.rs — 生成互斥锁，防止重叠提交同时写输出目录

use anyhow::{Context, Result};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

/// 一次生成期间持有，drop 时释放
#[derive(Debug)]
pub struct GenerationLock {
    file: File,
}

impl GenerationLock {
    /// 其他生成正持有锁时返回 `Ok(None)`
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("cannot open lock file {}", path.display()))?;

        // LOCK_EX | LOCK_NB: 已被占用则立即失败
        if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } != 0 {
            return Ok(None);
        }
        Ok(Some(Self { file }))
    }
}

impl Drop for GenerationLock {
    fn drop(&mut self) {
        unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) };
    }
}
