//! Configuration for the Microsoft Graph mailbox connection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the Graph API client.
///
/// The credentials identify an app registration with application-level
/// `Mail.Read` permission on the vendor feed mailbox.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphConfig {
    /// Entra tenant id
    #[serde(default)]
    pub tenant_id: String,

    /// App registration client id
    #[serde(default)]
    pub client_id: String,

    /// App registration client secret
    #[serde(default)]
    pub client_secret: String,

    /// The mailbox the vendors send price lists to
    #[serde(default = "default_user")]
    pub user: String,

    /// Directory attachments are downloaded into
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// How many days back to search for attachment-bearing mail
    #[serde(default = "default_days_back")]
    pub days_back: i64,
}

fn default_user() -> String {
    "vendorfeed@streetsmarket.com".to_owned()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_days_back() -> i64 {
    7
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            user: default_user(),
            download_dir: default_download_dir(),
            days_back: default_days_back(),
        }
    }
}
