// src/config/mod.rs
pub mod monitor;

pub use monitor::{
    MatrixConfig, MonitorConfig, NotifyConfig, SourceConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH,
};
