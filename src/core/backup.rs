use crate::utils::error::{OpsError, Result};
use chrono::{DateTime, TimeZone};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const PREFIX: &str = "backup_";
const EXTENSION: &str = ".sql";

/// 資料庫備份檔目錄，檔名格式 `backup_YYYYMMDD_HHMMSS.sql`
#[derive(Debug, Clone)]
pub struct BackupStore {
    directory: PathBuf,
}

impl BackupStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn file_name_for<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!("{}{}{}", PREFIX, timestamp.format("%Y%m%d_%H%M%S"), EXTENSION)
    }

    /// 寫入新的備份檔；同名檔案已存在時回傳錯誤而不覆寫
    pub fn write<Tz: TimeZone>(&self, timestamp: &DateTime<Tz>, dump: &[u8]) -> Result<PathBuf>
    where
        Tz::Offset: std::fmt::Display,
    {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.directory.join(Self::file_name_for(timestamp));

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => OpsError::BackupError {
                    message: format!("{} already exists", path.display()),
                },
                _ => OpsError::IoError(e),
            })?;
        fill_or_remove(&path, file, |file| {
            file.write_all(dump)?;
            file.sync_all()
        })?;

        tracing::info!("💾 Wrote {} ({} bytes)", path.display(), dump.len());
        Ok(path)
    }

    /// 依時間由舊到新排序（檔名中的時間戳可直接字典排序）
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }

        let mut backups: Vec<PathBuf> = std::fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(is_backup_name)
                        .unwrap_or(false)
            })
            .collect();
        backups.sort();
        Ok(backups)
    }

    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.pop())
    }

    pub fn read(&self, path: &Path) -> Result<Vec<u8>> {
        if !path.is_file() {
            return Err(OpsError::BackupError {
                message: format!("{} does not exist", path.display()),
            });
        }
        Ok(std::fs::read(path)?)
    }
}

/// 寫入失敗時刪除不完整的檔案
fn fill_or_remove<F>(path: &Path, mut file: File, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let result = fill(&mut file);
    drop(file);
    if let Err(e) = result {
        tracing::error!("❌ Writing {} failed: {}", path.display(), e);
        if let Err(cleanup) = std::fs::remove_file(path) {
            tracing::warn!("⚠️ Could not remove partial backup {}: {}", path.display(), cleanup);
        }
        return Err(OpsError::IoError(e));
    }
    Ok(())
}

fn is_backup_name(name: &str) -> bool {
    name.strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_suffix(EXTENSION))
        .map(|stamp| {
            stamp.len() == 15
                && stamp
                    .char_indices()
                    .all(|(i, c)| if i == 8 { c == '_' } else { c.is_ascii_digit() })
        })
        .unwrap_or(false)
}
