//! Microsoft Graph mailbox client.
//!
//! App-only access: a client-credentials token is acquired per
//! operation, then messages and file attachments are fetched for the
//! configured mailbox user. Only the small slice of the Graph surface
//! this service needs is modeled.

use crate::config::GraphConfig;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;

const GRAPH_API: &str = "https://graph.microsoft.com/v1.0";
const LOGIN_BASE: &str = "https://login.microsoftonline.com";

/// File extensions accepted as vendor feeds.
const FEED_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".csv"];

/// Errors from the Graph client.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Transport-level failure talking to Graph or the login endpoint
    #[error("graph request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint refused the client credentials
    #[error("token request rejected ({status}): {body}")]
    Token {
        /// HTTP status of the refusal
        status: reqwest::StatusCode,
        /// The provider's error body, verbatim
        body: String,
    },

    /// An attachment's base64 body failed to decode
    #[error("attachment {name} carried undecodable content")]
    Content {
        /// The attachment's file name
        name: String,
        /// The decode failure
        #[source]
        source: base64::DecodeError,
    },

    /// Filesystem failure writing a download
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Message {
    id: String,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    from: Option<Recipient>,
    #[serde(default)]
    received_date_time: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    #[serde(default)]
    email_address: Option<EmailAddress>,
}

#[derive(Deserialize)]
struct EmailAddress {
    #[serde(default)]
    address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Attachment {
    id: String,
    name: String,
    #[serde(rename = "@odata.type", default)]
    odata_type: Option<String>,
    #[serde(default)]
    content_bytes: Option<String>,
}

/// A mailbox message, reduced to what the operator cares about.
#[derive(Debug, Clone)]
pub struct MessageSummary {
    /// Subject line, when present
    pub subject: Option<String>,
    /// Sender address, when present
    pub from: Option<String>,
    /// Received timestamp, as reported by Graph
    pub received: Option<String>,
}

/// Client for the vendor feed mailbox.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    config: GraphConfig,
}

impl GraphClient {
    /// Build a client for the given mailbox configuration.
    pub fn new(config: GraphConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { http, config }
    }

    /// The configured download directory.
    pub fn download_dir(&self) -> &std::path::Path {
        &self.config.download_dir
    }

    /// Acquire an app-only access token via the client-credentials
    /// grant.
    async fn token(&self) -> Result<String, GraphError> {
        let url = format!(
            "{LOGIN_BASE}/{}/oauth2/v2.0/token",
            self.config.tenant_id
        );
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", "https://graph.microsoft.com/.default"),
            ("grant_type", "client_credentials"),
        ];

        let response = self.http.post(&url).form(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Token { status, body });
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// The most recent messages in the mailbox, newest first.
    pub async fn latest_messages(&self, limit: usize) -> Result<Vec<MessageSummary>, GraphError> {
        let token = self.token().await?;
        let url = format!("{GRAPH_API}/users/{}/messages", self.config.user);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("$top", limit.to_string()),
                ("$orderby", "receivedDateTime desc".to_owned()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let messages: ListResponse<Message> = response.json().await?;
        Ok(messages
            .value
            .into_iter()
            .map(|m| MessageSummary {
                subject: m.subject,
                from: m
                    .from
                    .and_then(|r| r.email_address)
                    .and_then(|a| a.address),
                received: m.received_date_time,
            })
            .collect())
    }

    /// Download every spreadsheet/CSV attachment from recent mail into
    /// the download directory, newest message first.
    ///
    /// Returns the written paths in download order.
    pub async fn download_recent_attachments(&self) -> Result<Vec<PathBuf>, GraphError> {
        let token = self.token().await?;

        tokio::fs::create_dir_all(&self.config.download_dir).await?;

        let start = time::OffsetDateTime::now_utc()
            - time::Duration::days(self.config.days_back.max(0));
        let filter = format!(
            "receivedDateTime ge {} and hasAttachments eq true",
            start
                .format(&Rfc3339)
                .expect("rfc3339 formatting of a utc timestamp cannot fail")
        );

        let url = format!("{GRAPH_API}/users/{}/messages", self.config.user);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("$filter", filter.as_str()),
                ("$orderby", "receivedDateTime desc"),
                ("$top", "20"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let messages: ListResponse<Message> = response.json().await?;
        tracing::info!(
            messages = messages.value.len(),
            days_back = self.config.days_back,
            "found attachment-bearing mail"
        );

        let mut downloaded = Vec::new();
        for message in &messages.value {
            let attachments_url = format!(
                "{GRAPH_API}/users/{}/messages/{}/attachments",
                self.config.user, message.id
            );
            let attachments: ListResponse<Attachment> = self
                .http
                .get(&attachments_url)
                .bearer_auth(&token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            for attachment in &attachments.value {
                if attachment.odata_type.as_deref() != Some("#microsoft.graph.fileAttachment") {
                    continue;
                }
                if !is_feed_filename(&attachment.name) {
                    continue;
                }

                let content = match &attachment.content_bytes {
                    Some(content) => content.clone(),
                    // listing endpoints may omit the body; fetch the attachment itself
                    None => {
                        let detail_url = format!("{attachments_url}/{}", attachment.id);
                        let detail: Attachment = self
                            .http
                            .get(&detail_url)
                            .bearer_auth(&token)
                            .send()
                            .await?
                            .error_for_status()?
                            .json()
                            .await?;
                        detail.content_bytes.unwrap_or_default()
                    }
                };

                let bytes = BASE64
                    .decode(content.as_bytes())
                    .map_err(|source| GraphError::Content {
                        name: attachment.name.clone(),
                        source,
                    })?;

                let path = self.config.download_dir.join(&attachment.name);
                tokio::fs::write(&path, &bytes).await?;
                tracing::info!(
                    file = %attachment.name,
                    subject = message.subject.as_deref().unwrap_or(""),
                    "downloaded attachment"
                );
                downloaded.push(path);
            }
        }

        Ok(downloaded)
    }
}

fn is_feed_filename(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    FEED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_filenames_by_extension() {
        assert!(is_feed_filename("STM 070125.xlsx"));
        assert!(is_feed_filename("J44PBM01-CSV02.HA1LFO20689620.CSV"));
        assert!(is_feed_filename("legacy.XLS"));
        assert!(!is_feed_filename("invoice.pdf"));
        assert!(!is_feed_filename("notes.txt"));
    }
}
