use crate::utils::error::{OpsError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 驗證 URL 格式與協定
pub fn validate_url(field_name: &str, url_str: &str, allowed_schemes: &[&str]) -> Result<Url> {
    if url_str.is_empty() {
        return Err(OpsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => {
            if allowed_schemes.contains(&url.scheme()) {
                Ok(url)
            } else {
                Err(OpsError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: url_str.to_string(),
                    reason: format!(
                        "Unsupported URL scheme: {}. Allowed schemes: {}",
                        url.scheme(),
                        allowed_schemes.join(", ")
                    ),
                })
            }
        }
        Err(e) => Err(OpsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(OpsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(OpsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(OpsError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_command(field_name: &str, argv: &[String]) -> Result<()> {
    match argv.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(OpsError::ConfigValidationError {
            field: field_name.to_string(),
            message: "Command must name a program to run".to_string(),
        }),
    }
}

pub fn validate_non_empty_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
        return Err(OpsError::ConfigValidationError {
            field: field_name.to_string(),
            message: "List must contain at least one non-empty entry".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        let http = ["http", "https"];
        assert!(validate_url("deploy.health_url", "http://localhost:8000/health", &http).is_ok());
        assert!(validate_url("deploy.health_url", "https://example.com", &http).is_ok());
        assert!(validate_url("deploy.health_url", "", &http).is_err());
        assert!(validate_url("deploy.health_url", "invalid-url", &http).is_err());
        assert!(validate_url("deploy.health_url", "ftp://example.com", &http).is_err());
        assert!(validate_url("DATABASE_URL", "postgresql://u:p@db:5432/x", &["postgresql"]).is_ok());
    }

    #[test]
    fn test_validate_command_and_lists() {
        assert!(validate_command("entrypoint.migrate_command", &["alembic".to_string()]).is_ok());
        assert!(validate_command("entrypoint.migrate_command", &[]).is_err());
        assert!(validate_command("entrypoint.migrate_command", &[" ".to_string()]).is_err());

        assert!(validate_non_empty_list("deploy.required_tools", &["docker".to_string()]).is_ok());
        assert!(validate_non_empty_list("deploy.required_tools", &[]).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("entrypoint.poll_interval_ms", 100, 1).is_ok());
        assert!(validate_positive_number("entrypoint.poll_interval_ms", 0, 1).is_err());
    }
}
