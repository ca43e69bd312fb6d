//! CLI entry point (SPEC_FULL.md "server" module): flags mirror spec §6's
//! `ECSS_`-prefixed environment variables, each `clap`-`env`-backed so a
//! flag and its env var are interchangeable — the same `clap = {
//! features = ["derive", "env"] }` dependency already established
//! elsewhere in the pack (e.g. `stupid-rules`'s `rules-worker` bin).

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "ecss-server", version, about = "Schedules ephemeral container tasks on a cron-like schedule")]
pub struct Cli {
    /// Target orchestrator cluster name (spec §6 `ECS_CLUSTER`, required).
    #[arg(long, env = "ECSS_ECS_CLUSTER")]
    pub ecs_cluster: Option<String>,

    /// Label attached to launched tasks (spec §6 `NAME`).
    #[arg(long, env = "ECSS_NAME")]
    pub name: Option<String>,

    /// HTTP bind host.
    #[arg(long, env = "ECSS_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP bind port.
    #[arg(long, env = "ECSS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Log level: DEBUG/INFO/WARNING/ERROR/CRITICAL (spec §6 `LOG_LEVEL`).
    #[arg(long, env = "ECSS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Directory for file logs (spec §6 `LOG_FOLDER`); stdout/stderr
    /// always receive logs too.
    #[arg(long, env = "ECSS_LOG_FOLDER")]
    pub log_folder: Option<String>,

    /// Selects the embedded-SQL backend at this path (spec §6 `SQLITE_FILE`).
    #[arg(long, env = "ECSS_SQLITE_FILE")]
    pub sqlite_file: Option<String>,

    /// Selects the object-store backend (spec §6 `S3_BUCKET`).
    #[arg(long, env = "ECSS_S3_BUCKET")]
    pub s3_bucket: Option<String>,

    /// Object-store key prefix (spec §6 `S3_PREFIX`).
    #[arg(long, env = "ECSS_S3_PREFIX")]
    pub s3_prefix: Option<String>,

    /// Selects the key-value backend (spec §6 `DYNAMODB_TABLE`).
    #[arg(long, env = "ECSS_DYNAMODB_TABLE")]
    pub dynamodb_table: Option<String>,

    /// Selects the search-index backend (spec §6 `ELASTICSEARCH_INDEX`).
    #[arg(long, env = "ECSS_ELASTICSEARCH_INDEX")]
    pub elasticsearch_index: Option<String>,

    /// Comma-separated search-index hosts (spec §6 `ELASTICSEARCH_HOSTS`).
    #[arg(long, env = "ECSS_ELASTICSEARCH_HOSTS")]
    pub elasticsearch_hosts: Option<String>,

    /// Path to a YAML file providing extended backend parameters (spec
    /// §6 `CONFIG_FILE`).
    #[arg(long, env = "ECSS_CONFIG_FILE")]
    pub config_file: Option<String>,
}

impl Cli {
    /// Overlay parsed CLI flags onto environment-derived config. A flag
    /// only overrides its `ECSS_`-prefixed environment counterpart when
    /// explicitly set — clap's `env` attribute already merges the two
    /// for most fields, so this only needs to handle the ones clap
    /// can't default from `Config::from_env` directly (the backend
    /// selectors, which `Config` models as `Option<String>` with no
    /// `clap` default).
    pub fn apply_to(self, mut config: ecss_core::Config) -> ecss_core::Config {
        if let Some(v) = self.ecs_cluster {
            config.cluster.ecs_cluster = Some(v);
        }
        if let Some(v) = self.name {
            config.cluster.name = Some(v);
        }
        config.server.host = self.host;
        config.server.port = self.port;
        if let Some(v) = self.log_level {
            config.log.level = v;
        }
        if let Some(v) = self.log_folder {
            config.log.folder = Some(v);
        }
        if let Some(v) = self.sqlite_file {
            config.store.sqlite_file = Some(v);
        }
        if let Some(v) = self.s3_bucket {
            config.store.s3_bucket = Some(v);
        }
        if let Some(v) = self.s3_prefix {
            config.store.s3_prefix = Some(v);
        }
        if let Some(v) = self.dynamodb_table {
            config.store.dynamodb_table = Some(v);
        }
        if let Some(v) = self.elasticsearch_index {
            config.store.elasticsearch_index = Some(v);
        }
        if let Some(v) = self.elasticsearch_hosts {
            config.store.elasticsearch_hosts = Some(v);
        }
        config
    }
}
