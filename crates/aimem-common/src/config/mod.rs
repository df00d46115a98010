//! Configuration structs

mod client_config;

pub use client_config::{
    AppSettings, ApiConfig, ClientConfig, ConfigError, Environment, ReconnectConfig, SyncConfig,
};
