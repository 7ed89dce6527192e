pub mod config;
pub mod target;

pub use config::{AppConfig, ConfigError, CorsConfig, Secrets, TargetConfig};
pub use target::{RouteTable, Target};
