//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::collections::HashSet;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Credential value shipped in the example configuration.
const PLACEHOLDER_CREDENTIAL: &str = "YOUR_CREDENTIAL_HERE";

/// Longest nick most IRC networks accept.
const MAX_NICK_LEN: usize = 30;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // IRC
    if config.irc.server.is_empty() {
        errors.push("irc.server is required".to_string());
    }
    if config.irc.port == 0 {
        errors.push("irc.port must be non-zero".to_string());
    }
    check_nick("irc.nick", &config.irc.nick, &mut errors);
    check_nick("irc.owner_nick", &config.irc.owner_nick, &mut errors);

    // Messenger
    if config.messenger.gateway.is_empty() {
        errors.push("messenger.gateway is required".to_string());
    }
    if config.messenger.accounts.is_empty() {
        errors.push("messenger.accounts must contain at least one account".to_string());
    }
    let mut seen_accounts = HashSet::new();
    for (i, account) in config.messenger.accounts.iter().enumerate() {
        if account.identifier.is_empty() {
            errors.push(format!("messenger.accounts[{}].identifier is required", i));
        } else if !seen_accounts.insert(account.identifier.as_str()) {
            errors.push(format!(
                "messenger.accounts[{}].identifier '{}' is listed twice",
                i, account.identifier
            ));
        }
        if account.credential.is_empty() {
            errors.push(format!("messenger.accounts[{}].credential is required", i));
        }
        if account.credential == PLACEHOLDER_CREDENTIAL {
            errors.push(format!("messenger.accounts[{}].credential is still the placeholder", i));
        }
    }

    // Contacts
    let mut seen_ids = HashSet::new();
    for contact in &config.contacts {
        if contact.id.is_empty() {
            errors.push(format!("contacts entry '{}' has an empty id", contact.name));
        } else if !seen_ids.insert(contact.id.as_str()) {
            errors.push(format!("contacts id '{}' is listed twice", contact.id));
        }
        if contact.name.is_empty() {
            errors.push(format!("contacts['{}'] has an empty name", contact.id));
        }
    }

    if config.log_file.is_empty() {
        errors.push("log_file is required".to_string());
    }
    if config.connect_timeout_secs == 0 {
        errors.push("connect_timeout_secs must be non-zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

fn check_nick(field: &str, nick: &str, errors: &mut Vec<String>) {
    if nick.is_empty() {
        errors.push(format!("{} is required", field));
        return;
    }
    if nick.len() > MAX_NICK_LEN {
        errors.push(format!(
            "{} must be at most {} characters (got {})",
            field,
            MAX_NICK_LEN,
            nick.len()
        ));
    }
    if nick.chars().any(|c| c.is_whitespace() || c == ',' || c == ':') || nick.starts_with('#') {
        errors.push(format!("{} '{}' is not a valid IRC nick", field, nick));
    }
}
