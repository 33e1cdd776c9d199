use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub draw: DrawDefaults,
}

/// Boot-time defaults for the runtime-tunable knobs. Values in the config
/// store override these per key.
#[derive(Debug, Deserialize, Clone)]
pub struct DrawDefaults {
    pub daily_draw_cap: i64,
    pub exclusion_threshold: i64,
    pub redemption_grace_minutes: i64,
    #[serde(default = "default_place_count")]
    pub default_place_count: usize,
}

fn default_place_count() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of SPOTTO)
            // Eg.. `SPOTTO_DEBUG=1` would set the `debug` key
            .add_source(config::Environment::with_prefix("SPOTTO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
