pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod validate;

pub use config::{AwsConfig, ClusterConfig, Config, LogConfig, ServerConfig, StoreConfig};
pub use error::*;
pub use job::*;
pub use validate::{strip_managed_fields, validate_job, validate_patch, FieldError, ValidationError};
