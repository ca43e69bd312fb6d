//! Environment-variable configuration, `ECSS_`-prefixed (spec §6).
//!
//! Every key is read as `ECSS_{KEY}`. Values may contain `{NAME}`
//! placeholders substituted from the process environment (spec §6) —
//! e.g. `ECSS_S3_PREFIX=jobs/{HOSTNAME}` picks up `HOSTNAME` from the
//! process's own environment, not from another `ECSS_` var.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const PREFIX: &str = "ECSS";

/// Load `.env` file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    let full = format!("{PREFIX}_{key}");
    env::var(&full).ok().filter(|s| !s.is_empty()).map(|v| substitute_placeholders(&v))
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Replace every `{NAME}` placeholder in `value` with the process
/// environment variable `NAME`, left unresolved if that variable is
/// unset (spec §6: "Values may contain `{NAME}` placeholders substituted
/// from the process environment").
fn substitute_placeholders(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find('{') {
        let Some(end) = rest[start..].find('}') else {
            out.push_str(rest);
            return out;
        };
        let end = start + end;
        out.push_str(&rest[..start]);
        let name = &rest[start + 1..end];
        match env::var(name) {
            Ok(v) => out.push_str(&v),
            Err(_) => out.push_str(&rest[start..=end]),
        }
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    out
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cluster: ClusterConfig,
    pub store: StoreConfig,
    pub aws: AwsConfig,
    pub log: LogConfig,
}

impl Config {
    /// Build config from `ECSS_`-prefixed environment variables. Call
    /// [`load_dotenv`] first if a `.env` file should be honored.
    pub fn from_env() -> Self {
        let mut config = Self {
            server: ServerConfig::from_env(),
            cluster: ClusterConfig::from_env(),
            store: StoreConfig::from_env(),
            aws: AwsConfig::from_env(),
            log: LogConfig::from_env(),
        };
        if let Some(path) = env_opt("CONFIG_FILE") {
            config = config.merge_yaml(&PathBuf::from(path)).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ECSS_CONFIG_FILE set but could not be applied, using env-only config");
                config
            });
        }
        config
    }

    /// Overlay a `CONFIG_FILE` YAML document onto environment-derived
    /// config. Precedence is explicit, not shared mutable state (design
    /// note "Cyclic config merge"): the YAML document's top-level key
    /// names which backend's fields it supplies, and only fields present
    /// in the document override the environment-derived value.
    pub fn merge_yaml(mut self, path: &std::path::Path) -> Result<Self, std::io::Error> {
        let raw = std::fs::read_to_string(path)?;
        let overlay: ConfigOverlay = serde_yaml::from_str(&raw)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;

        if let Some(store) = overlay.store {
            self.store = store;
        }
        if let Some(aws) = overlay.aws {
            self.aws = aws;
        }
        Ok(self)
    }

    /// Redacted view safe for API responses and startup logs — no
    /// credentials.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "server": { "host": self.server.host, "port": self.server.port },
            "cluster": { "ecsCluster": self.cluster.ecs_cluster, "name": self.cluster.name },
            "store": {
                "sqliteFile": self.store.sqlite_file,
                "s3Bucket": self.store.s3_bucket,
                "dynamodbTable": self.store.dynamodb_table,
                "elasticsearchIndex": self.store.elasticsearch_index,
            },
            "aws": { "region": self.aws.region, "configured": self.aws.access_key_id.is_some() },
            "log": { "level": self.log.level, "folder": self.log.folder },
        })
    }

    pub fn log_summary(&self) {
        tracing::info!("config loaded:");
        tracing::info!("  server:  {}:{}", self.server.host, self.server.port);
        tracing::info!("  cluster: ecs_cluster={:?} name={:?}", self.cluster.ecs_cluster, self.cluster.name);
        tracing::info!(
            "  store:   sqlite={:?} s3={:?} dynamodb={:?} elasticsearch={:?}",
            self.store.sqlite_file,
            self.store.s3_bucket,
            self.store.dynamodb_table,
            self.store.elasticsearch_index,
        );
    }
}

/// Shape of a `CONFIG_FILE` YAML document. Unknown top-level keys are
/// ignored rather than rejected — an operator supplying extra sections
/// for future backends shouldn't break startup.
#[derive(Debug, Clone, Deserialize)]
struct ConfigOverlay {
    #[serde(default)]
    store: Option<StoreConfig>,
    #[serde(default)]
    aws: Option<AwsConfig>,
}

// ── Server (ambient — not in spec §6's table, needed to bind the API) ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 8080),
            cors_origin: env_or("CORS_ORIGIN", "*"),
        }
    }
}

// ── Cluster / orchestrator ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// `ECS_CLUSTER` — required at runtime by the launcher, but kept
    /// optional here so `Config` can load before that's validated (the
    /// server's CLI entry point is where a missing value is fatal).
    pub ecs_cluster: Option<String>,
    /// `startedBy` label attached to launched tasks.
    pub name: Option<String>,
}

impl ClusterConfig {
    fn from_env() -> Self {
        Self {
            ecs_cluster: env_opt("ECS_CLUSTER"),
            name: env_opt("NAME"),
        }
    }
}

// ── Store backend selection ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub sqlite_file: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub dynamodb_table: Option<String>,
    pub elasticsearch_index: Option<String>,
    pub elasticsearch_hosts: Option<String>,
}

impl StoreConfig {
    fn from_env() -> Self {
        Self {
            sqlite_file: env_opt("SQLITE_FILE"),
            s3_bucket: env_opt("S3_BUCKET"),
            s3_prefix: env_opt("S3_PREFIX"),
            dynamodb_table: env_opt("DYNAMODB_TABLE"),
            elasticsearch_index: env_opt("ELASTICSEARCH_INDEX"),
            elasticsearch_hosts: env_opt("ELASTICSEARCH_HOSTS"),
        }
    }

    /// Comma-separated `ELASTICSEARCH_HOSTS` split into individual URLs.
    pub fn elasticsearch_host_list(&self) -> Vec<String> {
        self.elasticsearch_hosts
            .as_deref()
            .map(|hosts| hosts.split(',').map(|h| h.trim().to_string()).filter(|h| !h.is_empty()).collect())
            .unwrap_or_default()
    }
}

// ── AWS ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env() -> Self {
        Self {
            region: env_or("AWS_REGION", "us-east-1"),
            access_key_id: env_opt("AWS_ACCESS_KEY_ID"),
            secret_access_key: env_opt("AWS_SECRET_ACCESS_KEY"),
            session_token: env_opt("AWS_SESSION_TOKEN"),
            endpoint_url: env_opt("AWS_ENDPOINT_URL"),
        }
    }
}

// ── Logging ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub folder: Option<String>,
}

impl LogConfig {
    fn from_env() -> Self {
        Self {
            level: env_or("LOG_LEVEL", "INFO"),
            folder: env_opt("LOG_FOLDER"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_substitution_picks_up_process_env() {
        std::env::set_var("CONFIG_TEST_HOST", "worker-7");
        let resolved = substitute_placeholders("jobs/{CONFIG_TEST_HOST}/prefix");
        assert_eq!(resolved, "jobs/worker-7/prefix");
        std::env::remove_var("CONFIG_TEST_HOST");
    }

    #[test]
    fn unresolved_placeholder_is_left_intact() {
        let resolved = substitute_placeholders("jobs/{DEFINITELY_UNSET_VAR}/x");
        assert_eq!(resolved, "jobs/{DEFINITELY_UNSET_VAR}/x");
    }

    #[test]
    fn elasticsearch_hosts_split_on_comma() {
        let store = StoreConfig {
            sqlite_file: None,
            s3_bucket: None,
            s3_prefix: None,
            dynamodb_table: None,
            elasticsearch_index: None,
            elasticsearch_hosts: Some("http://a:9200, http://b:9200".to_string()),
        };
        assert_eq!(store.elasticsearch_host_list(), vec!["http://a:9200", "http://b:9200"]);
    }
}
