//! Configuration type definitions.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Default network-B domain appended to resolved private targets.
pub const DEFAULT_DOMAIN_SUFFIX: &str = "@s.whatsapp.net";

/// Default bound on connection startup.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory entries in file order: messenger id -> display or channel name.
    #[serde(deserialize_with = "ordered_contacts")]
    pub contacts: Vec<ContactEntry>,
    pub irc: IrcConfig,
    pub messenger: MessengerConfig,
    pub log_file: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// One configured contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEntry {
    pub id: String,
    pub name: String,
}

/// IRC (network A) connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    pub server: String,
    pub port: u16,
    /// The bridge's own nick.
    pub nick: String,
    /// Nick that receives messages sent privately to the bridge.
    pub owner_nick: String,
}

/// Messenger (network B) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MessengerConfig {
    /// Gateway address (`host:port`) every account session connects to.
    pub gateway: String,
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,
    /// Worker accounts. The first one is the primary.
    pub accounts: Vec<AccountConfig>,
}

/// Credentials for one messenger account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub identifier: String,
    pub credential: String,
}

fn default_domain_suffix() -> String {
    DEFAULT_DOMAIN_SUFFIX.to_string()
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// Deserialize the `contacts` object keeping document order, so name
/// lookups resolve duplicates to the first entry in the file.
fn ordered_contacts<'de, D>(deserializer: D) -> Result<Vec<ContactEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ContactsVisitor;

    impl<'de> Visitor<'de> for ContactsVisitor {
        type Value = Vec<ContactEntry>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an object mapping contact ids to names")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((id, name)) = map.next_entry::<String, String>()? {
                entries.push(ContactEntry { id, name });
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(ContactsVisitor)
}
