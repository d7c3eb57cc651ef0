use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use chatmetric_core::locations::S3Location;
use chatmetric_core::rubric::DEFAULT_RUBRIC;

/// Current config version. Bump this when adding fields or changing shape.
/// Each bump requires a corresponding entry in [`migrate`].
const CURRENT_VERSION: u32 = 1;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CHATMETRIC_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatmetricConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    pub region: String,
    pub credentials: CredentialSource,
    /// Where session records live, e.g. `s3://survey-data/sessions/`.
    pub source_base: String,
    /// Where scored results go, one partition per client.
    pub export_base: String,
    pub clients: Vec<String>,
    pub model_id: String,
    /// Rubric file; the built-in rubric is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rubric_path: Option<PathBuf>,
    #[serde(default = "default_oracle_timeout_secs")]
    pub oracle_timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Glue crawler to start once results are written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawler_name: Option<String>,
}

fn default_oracle_timeout_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_concurrency() -> usize {
    4
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialSource {
    Inline {
        access_key_id: String,
        secret_access_key: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        session_token: Option<String>,
    },
    Profile {
        profile_name: String,
    },
    DefaultChain,
}

impl ChatmetricConfig {
    pub fn source_base(&self) -> eyre::Result<S3Location> {
        self.source_base
            .parse()
            .map_err(|e| eyre::eyre!("invalid source_base: {e}"))
    }

    pub fn export_base(&self) -> eyre::Result<S3Location> {
        self.export_base
            .parse()
            .map_err(|e| eyre::eyre!("invalid export_base: {e}"))
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// The configured rubric text, or the built-in one.
    pub fn rubric(&self) -> eyre::Result<String> {
        match &self.rubric_path {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| eyre::eyre!("failed to read rubric at {}: {e}", path.display())),
            None => Ok(DEFAULT_RUBRIC.to_string()),
        }
    }
}

/// Resolve the config path: explicit flag, then `CHATMETRIC_CONFIG`, then
/// the platform config directory.
pub fn config_path(explicit: Option<&Path>) -> eyre::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("chatmetric").join("config.json"))
}

pub fn load_config(path: &Path) -> eyre::Result<ChatmetricConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Parse as raw JSON so we can run migrations before deserializing.
    let json: serde_json::Value = serde_json::from_str(&contents)?;
    let on_disk_version = json
        .get("config_version")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;

    let migrated = migrate(json, on_disk_version)?;
    let config: ChatmetricConfig = serde_json::from_value(migrated)?;
    validate(&config)?;
    Ok(config)
}

/// Run sequential migrations from `from_version` up to [`CURRENT_VERSION`].
fn migrate(mut json: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}). \
             Please update chatmetric."
        ));
    }

    // v0 → v1: the client list used to be called `sources`.
    if from_version < 1 {
        let obj = json
            .as_object_mut()
            .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;
        if !obj.contains_key("clients")
            && let Some(sources) = obj.remove("sources")
        {
            obj.insert("clients".to_string(), sources);
        }
        obj.insert(
            "config_version".to_string(),
            serde_json::Value::Number(1.into()),
        );
        tracing::info!("migrated config v0 → v1 (renamed sources to clients)");
    }

    Ok(json)
}

fn validate(config: &ChatmetricConfig) -> eyre::Result<()> {
    let source = config.source_base()?;
    let export = config.export_base()?;
    // The sink deletes everything under the export prefix except its
    // results object, so the two trees must be disjoint.
    if source.bucket == export.bucket
        && (source.prefix.starts_with(&export.prefix) || export.prefix.starts_with(&source.prefix))
    {
        return Err(eyre::eyre!(
            "export_base {export} overlaps source_base {source}; results would replace session records"
        ));
    }
    if config.model_id.trim().is_empty() {
        return Err(eyre::eyre!("model_id must not be empty"));
    }
    if config.clients.iter().any(|c| c.trim_matches('/').is_empty()) {
        return Err(eyre::eyre!("client names must not be empty"));
    }
    if config.oracle_timeout_secs == 0 {
        return Err(eyre::eyre!("oracle_timeout_secs must be positive"));
    }
    Ok(())
}

pub fn save_config(path: &Path, config: &ChatmetricConfig) -> eyre::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| eyre::eyre!("config path {} has no parent", path.display()))?;
    std::fs::create_dir_all(dir)?;

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;
    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;

    // Inline credentials may live in this file.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

/// One-line description of the credential source, without secrets.
pub fn describe_credentials(creds: &CredentialSource) -> String {
    match creds {
        CredentialSource::Inline {
            access_key_id,
            session_token,
            ..
        } => {
            let kind = if session_token.is_some() {
                "temporary"
            } else {
                "inline"
            };
            format!("{kind} ({})", redact_access_key(access_key_id))
        }
        CredentialSource::Profile { profile_name } => format!("profile ({profile_name})"),
        CredentialSource::DefaultChain => "default_chain".to_string(),
    }
}

fn redact_access_key(key: &str) -> String {
    if key.len() <= 8 {
        return "****".to_string();
    }
    let prefix = &key[..4];
    let suffix = &key[key.len() - 4..];
    format!("{prefix}...{suffix}")
}
