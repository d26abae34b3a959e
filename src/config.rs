//! Configuration loading.
//!
//! Settings come from (lowest to highest precedence) built-in defaults, a
//! TOML file, `WORKLOG_*` environment variables, and finally the secret
//! variables the scheduled job exports (`MS_CLIENT_ID`, `MS_REFRESH_TOKEN`, ...).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::FixedOffset;
use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use worklog_core::WorklogError;
use worklog_core::leak_guard::SecretSet;
use worklog_core::settings::{RedactionConfig, RenderOptions};

const CONFIG_FILE_NAME: &str = "worklog.toml";

/// Well-known secret variables and the settings keys they override.
const SECRET_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("MS_CLIENT_ID", "graph.client_id"),
    ("MS_CLIENT_SECRET", "graph.client_secret"),
    ("MS_TENANT_ID", "graph.tenant_id"),
    ("MS_REFRESH_TOKEN", "graph.refresh_token"),
    ("GIT_PUSH_TOKEN", "publish.push_token"),
];

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub graph: GraphConfig,
    pub schedule: ScheduleConfig,
    pub redaction: RedactionConfig,
    pub render: RenderOptions,
    pub publish: PublishConfig,
}

/// Identity provider and calendar/task API settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub authority_url: String,
    pub api_base_url: String,
    pub scopes: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            tenant_id: "common".to_string(),
            client_id: String::new(),
            client_secret: None,
            refresh_token: None,
            authority_url: "https://login.microsoftonline.com".to_string(),
            api_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            scopes: "Calendars.Read Tasks.Read offline_access".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Fixed offset of the target zone, e.g. "+08:00". Decides the target
    /// day, the calendar query window and every rendered time.
    pub utc_offset: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            utc_offset: "+08:00".to_string(),
        }
    }
}

impl ScheduleConfig {
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset.trim().parse::<FixedOffset>().map_err(|_| {
            WorklogError::Config(format!(
                "Invalid schedule.utc_offset '{}'. Expected something like \"+08:00\"",
                self.utc_offset
            ))
            .into()
        })
    }
}

/// Where and how documents are committed.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub repo_dir: PathBuf,
    /// Relative to `repo_dir`.
    pub log_dir: PathBuf,
    pub remote: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub committer_name: String,
    pub committer_email: String,
    #[serde(skip_serializing)]
    pub push_token: Option<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        PublishConfig {
            repo_dir: PathBuf::from("."),
            log_dir: PathBuf::from("logs"),
            remote: "origin".to_string(),
            branch: None,
            committer_name: "GitHub Action".to_string(),
            committer_email: "action@github.com".to_string(),
            push_token: None,
        }
    }
}

impl PublishConfig {
    /// `repo_dir` with `~` expanded.
    pub fn repo_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.repo_dir.to_string_lossy()).into_owned())
    }
}

impl Config {
    /// Check everything a run needs before any network call is made.
    pub fn validate(&self) -> Result<()> {
        if self.graph.refresh_token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(WorklogError::Config(
                "Missing refresh token. Set MS_REFRESH_TOKEN or graph.refresh_token".into(),
            )
            .into());
        }

        if self.graph.client_id.trim().is_empty() {
            return Err(WorklogError::Config(
                "Missing client id. Set MS_CLIENT_ID or graph.client_id".into(),
            )
            .into());
        }

        self.schedule.offset()?;

        Ok(())
    }

    /// Every live secret the process holds, for the leak guard.
    pub fn secrets(&self) -> SecretSet {
        let mut secrets = SecretSet::new();
        secrets.insert_opt("client secret", self.graph.client_secret.as_deref());
        secrets.insert_opt("refresh token", self.graph.refresh_token.as_deref());
        secrets.insert_opt("push token", self.publish.push_token.as_deref());
        secrets
    }
}

/// Config file used when none is given: `./worklog.toml` if present, else
/// the platform config directory.
pub fn default_config_path() -> Result<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("worklog");

    Ok(config_dir.join("config.toml"))
}

/// Load configuration. An explicit `path` must exist; the default one may not.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::from(default_config_path()?).required(false),
    };

    let mut builder = ConfigBuilder::builder().add_source(file).add_source(
        Environment::with_prefix("WORKLOG")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("redaction.keywords"),
    );

    for (var, key) in SECRET_ENV_OVERRIDES {
        let value = std::env::var(var).ok().filter(|v| !v.is_empty());
        builder = builder
            .set_override_option(*key, value)
            .with_context(|| format!("Failed to apply {var}"))?;
    }

    let config: Config = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(config)
}

/// Write a starter config file with every non-secret default spelled out.
pub fn write_default(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists at {}", path.display());
    }

    let body = toml::to_string_pretty(&Config::default()).context("Failed to serialize defaults")?;
    let contents = format!(
        "# worklog configuration\n\
         #\n\
         # Secrets are read from the environment, never from this file:\n\
         #   MS_CLIENT_ID, MS_CLIENT_SECRET, MS_TENANT_ID, MS_REFRESH_TOKEN, GIT_PUSH_TOKEN\n\
         #\n\
         # schedule.utc_offset is the only time zone setting. Calendar times are\n\
         # fetched in UTC and shown in that offset, like task completion times.\n\n\
         {body}"
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config file at {}", path.display()))?;

    Ok(())
}
