//! Workers KV over the Cloudflare REST API.
//!
//! Every response is wrapped in the standard envelope
//! `{ success, errors, result, result_info }`. Listing follows
//! `result_info.cursor` until the namespace is exhausted.

use std::collections::BTreeSet;

use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{KvStore, StoreError, UploadItem};
use crate::config::{Config, ConfigError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Largest `limit` the list-keys endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyEntry {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct BulkWriteResult {
    #[serde(default)]
    unsuccessful_keys: Vec<String>,
}

/// One page of the list-keys endpoint.
#[derive(Debug, Default, PartialEq, Eq)]
struct KeysPage {
    names: Vec<String>,
    cursor: Option<String>,
}

pub struct CloudflareKv {
    client: Client,
    base_url: String,
    account_id: String,
    namespace_id: String,
    api_token: String,
}

impl CloudflareKv {
    /// Builds a client from the process configuration. Account, namespace and
    /// API token must all be present.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let remote = config.remote()?;
        let api_token = config
            .api_token
            .clone()
            .ok_or(ConfigError::MissingVar(crate::config::API_TOKEN_VAR))?;
        let client = Client::builder()
            .user_agent(concat!("pwd-upload/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(format!("{e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            account_id: remote.account_id.to_string(),
            namespace_id: remote.namespace_id.to_string(),
            api_token,
        })
    }

    fn namespace_url(&self, suffix: &str) -> String {
        format!(
            "{}/accounts/{}/storage/kv/namespaces/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.account_id,
            self.namespace_id,
            suffix
        )
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<Envelope<T>, StoreError> {
        let transport = |e: reqwest::Error| StoreError::Transport {
            url: url.to_string(),
            message: format!("{e}"),
        };
        let response = request.bearer_auth(&self.api_token).send().map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(transport)?;
        decode_envelope(url, status, &body)
    }

    fn fetch_keys_page(&self, page_size: usize, cursor: Option<&str>) -> Result<KeysPage, StoreError> {
        let url = self.namespace_url("keys");
        let mut request = self.client.get(&url).query(&[("limit", page_size)]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let envelope: Envelope<Vec<KeyEntry>> = self.send(request, &url)?;
        Ok(KeysPage {
            names: envelope
                .result
                .unwrap_or_default()
                .into_iter()
                .map(|entry| entry.name)
                .collect(),
            cursor: envelope.result_info.and_then(|info| info.cursor),
        })
    }
}

impl KvStore for CloudflareKv {
    fn list_keys(&self, page_size: usize) -> Result<BTreeSet<String>, StoreError> {
        collect_pages(|cursor| self.fetch_keys_page(page_size, cursor))
    }

    fn bulk_write(&self, items: &[UploadItem]) -> Result<(), StoreError> {
        let url = self.namespace_url("bulk");
        let request = self.client.put(&url).json(items);
        let envelope: Envelope<BulkWriteResult> = self.send(request, &url)?;

        let unsuccessful = envelope.result.unwrap_or_default().unsuccessful_keys;
        if !unsuccessful.is_empty() {
            return Err(StoreError::Api(format!(
                "{} key(s) were not written: {}",
                unsuccessful.len(),
                unsuccessful.join(", ")
            )));
        }
        debug!(count = items.len(), "bulk write accepted");
        Ok(())
    }
}

/// Drains a cursor-paginated listing. Stops on an empty cursor, or when the
/// API hands back the cursor it was just given.
fn collect_pages<F>(mut fetch: F) -> Result<BTreeSet<String>, StoreError>
where
    F: FnMut(Option<&str>) -> Result<KeysPage, StoreError>,
{
    let mut keys = BTreeSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(cursor.as_deref())?;
        pages += 1;
        keys.extend(page.names);

        match page.cursor {
            Some(next) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) => {
                cursor = Some(next);
            }
            _ => break,
        }
    }

    debug!(pages, keys = keys.len(), "listed existing keys");
    Ok(keys)
}

fn decode_envelope<T: DeserializeOwned>(url: &str, status: u16, body: &str) -> Result<Envelope<T>, StoreError> {
    let envelope: Envelope<T> = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) if (200..300).contains(&status) => {
            return Err(StoreError::Decode {
                url: url.to_string(),
                message: format!("{e}"),
            })
        }
        Err(_) => {
            return Err(StoreError::Status {
                url: url.to_string(),
                status,
                body: body.chars().take(200).collect(),
            })
        }
    };

    if !envelope.success {
        let messages: Vec<String> = envelope
            .errors
            .iter()
            .map(|err| format!("[{}] {}", err.code, err.message))
            .collect();
        let detail = if messages.is_empty() {
            format!("HTTP {status} without error details")
        } else {
            messages.join("; ")
        };
        return Err(StoreError::Api(detail));
    }

    if !(200..300).contains(&status) {
        return Err(StoreError::Status {
            url: url.to_string(),
            status,
            body: body.chars().take(200).collect(),
        });
    }

    Ok(envelope)
}
