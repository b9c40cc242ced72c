// ⚙️ Configuration - global CLI flags, overridable through the environment

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use crate::credentials::ConnectContext;
use crate::grouping::DateFormat;

/// Global options shared by every subcommand
#[derive(Debug, Clone, Args)]
pub struct HubArgs {
    /// Base URL of the integrations backend
    #[arg(long, global = true, env = "INTEGRATION_HUB_BACKEND", default_value = "http://localhost:8000")]
    pub backend: String,

    /// User ID passed to credential adapters
    #[arg(long, global = true, env = "INTEGRATION_HUB_USER", default_value = "TestUser")]
    pub user: String,

    /// Organization ID passed to credential adapters
    #[arg(long, global = true, env = "INTEGRATION_HUB_ORG", default_value = "TestOrg")]
    pub org: String,

    /// JSON file with provider credentials
    #[arg(long, global = true, env = "INTEGRATION_HUB_CREDENTIALS", default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// strftime pattern for record creation dates
    #[arg(long, global = true, env = "INTEGRATION_HUB_DATE_FORMAT", default_value = DateFormat::DEFAULT_PATTERN)]
    pub date_format: String,

    /// Backend request timeout in seconds
    #[arg(long, global = true, env = "INTEGRATION_HUB_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Write logs to this file (the TUI discards logs otherwise)
    #[arg(long, global = true, env = "INTEGRATION_HUB_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

/// Settings - validated configuration
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: String,
    pub context: ConnectContext,
    pub credentials_path: PathBuf,
    pub date_format: DateFormat,
    pub timeout: Duration,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_args(args: &HubArgs) -> Result<Self> {
        let backend_url = args.backend.trim().trim_end_matches('/').to_string();
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            bail!("backend URL must start with http:// or https://, got {:?}", args.backend);
        }

        if args.user.trim().is_empty() || args.org.trim().is_empty() {
            bail!("user and organization IDs must not be empty");
        }

        if args.timeout_secs == 0 {
            bail!("timeout must be at least one second");
        }

        let date_format = DateFormat::new(args.date_format.clone())
            .context("Invalid --date-format")?;

        Ok(Settings {
            backend_url,
            context: ConnectContext::new(args.user.trim(), args.org.trim()),
            credentials_path: args.credentials.clone(),
            date_format,
            timeout: Duration::from_secs(args.timeout_secs),
            log_file: args.log_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> HubArgs {
        HubArgs {
            backend: "http://localhost:8000/".to_string(),
            user: "TestUser".to_string(),
            org: "TestOrg".to_string(),
            credentials: PathBuf::from("credentials.json"),
            date_format: DateFormat::DEFAULT_PATTERN.to_string(),
            timeout_secs: 30,
            log_file: None,
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::from_args(&args()).unwrap();

        assert_eq!(settings.backend_url, "http://localhost:8000");
        assert_eq!(settings.context, ConnectContext::new("TestUser", "TestOrg"));
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.date_format.pattern(), "%-m/%-d/%Y");
    }

    #[test]
    fn test_rejects_bad_backend_scheme() {
        let mut a = args();
        a.backend = "localhost:8000".to_string();
        assert!(Settings::from_args(&a).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut a = args();
        a.timeout_secs = 0;
        assert!(Settings::from_args(&a).is_err());
    }

    #[test]
    fn test_rejects_invalid_date_format() {
        let mut a = args();
        a.date_format = "%Q".to_string();
        assert!(Settings::from_args(&a).is_err());
    }

    #[test]
    fn test_rejects_blank_user() {
        let mut a = args();
        a.user = "  ".to_string();
        assert!(Settings::from_args(&a).is_err());
    }
}
