use crate::domain::ports::Prompter;
use crate::utils::error::{OpsError, Result};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvFileStatus {
    Existing,
    CreatedFromTemplate,
    /// dry-run：範本存在但未複製
    WouldCreate,
}

/// 確保 `.env` 存在；不存在時從範本複製，並在互動模式下讓操作者先檢查內容
///
/// With `dry_run` set nothing is written and the operator is not paused.
pub fn ensure_env_file(
    path: &Path,
    template: &Path,
    prompter: &dyn Prompter,
    interactive: bool,
    dry_run: bool,
) -> Result<EnvFileStatus> {
    if path.exists() {
        tracing::debug!("✅ {} found", path.display());
        return Ok(EnvFileStatus::Existing);
    }

    if !template.exists() {
        return Err(OpsError::EnvFileError {
            path: path.display().to_string(),
            message: format!("missing, and template {} does not exist", template.display()),
        });
    }

    if dry_run {
        tracing::info!(
            "🔍 [dry-run] would create {} from {}",
            path.display(),
            template.display()
        );
        return Ok(EnvFileStatus::WouldCreate);
    }

    tracing::warn!(
        "⚠️ {} not found, creating it from {}",
        path.display(),
        template.display()
    );
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(template, path)?;

    if interactive {
        prompter.pause(&format!(
            "📝 Review {} and adjust secrets before continuing.",
            path.display()
        ))?;
    }

    Ok(EnvFileStatus::CreatedFromTemplate)
}

/// 解析 `.env` 為鍵值對；檔案不存在時回傳空集合
pub fn read_env_file(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let entries = dotenv::from_path_iter(path).map_err(|e| OpsError::EnvFileError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut vars = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry.map_err(|e| OpsError::EnvFileError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        vars.insert(key, value);
    }
    Ok(vars)
}
