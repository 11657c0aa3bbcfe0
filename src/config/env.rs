//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `PALAVER_IRC_SERVER` - IRC server host
//! - `PALAVER_IRC_PORT` - IRC server port
//! - `PALAVER_IRC_NICK` - Bridge nick on IRC
//! - `PALAVER_OWNER_NICK` - Operator nick on IRC
//! - `PALAVER_GATEWAY` - Messenger gateway address
//! - `PALAVER_LOG_FILE` - Message log path

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "PALAVER";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(server) = env::var(format!("{}_IRC_SERVER", ENV_PREFIX)) {
        config.irc.server = server;
    }
    if let Ok(port) = env::var(format!("{}_IRC_PORT", ENV_PREFIX)) {
        if let Ok(port) = port.parse() {
            config.irc.port = port;
        }
    }
    if let Ok(nick) = env::var(format!("{}_IRC_NICK", ENV_PREFIX)) {
        config.irc.nick = nick;
    }
    if let Ok(owner) = env::var(format!("{}_OWNER_NICK", ENV_PREFIX)) {
        config.irc.owner_nick = owner;
    }

    if let Ok(gateway) = env::var(format!("{}_GATEWAY", ENV_PREFIX)) {
        config.messenger.gateway = gateway;
    }

    if let Ok(log_file) = env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
        config.log_file = log_file;
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `PALAVER_CONFIG` environment variable, otherwise returns "palaver.json".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "palaver.json".to_string())
}
