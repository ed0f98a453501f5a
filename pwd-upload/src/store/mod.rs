//! Remote key-value storage for password hashes.
//!
//! The job only needs two capabilities from the store: listing the keys that
//! already exist and writing a batch of pairs. Anything implementing
//! [`KvStore`] can stand in for Workers KV.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

pub mod cloudflare;
#[cfg(test)]
pub(crate) mod memory;

pub use cloudflare::CloudflareKv;

/// Prefix shared by every password key in the namespace.
pub const KEY_PREFIX: &str = "pwd:";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} answered with HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("unexpected response body from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("KV API reported failure: {0}")]
    Api(String),
}

/// One key/value pair destined for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadItem {
    pub key: String,
    pub value: String,
}

impl UploadItem {
    /// Builds the item for a post slug and its password hash.
    pub fn for_slug(slug: &str, hash: String) -> Self {
        Self {
            key: format!("{KEY_PREFIX}{slug}"),
            value: hash,
        }
    }
}

pub trait KvStore {
    /// Returns every key currently stored in the namespace, requesting at most
    /// `page_size` keys per round trip.
    fn list_keys(&self, page_size: usize) -> Result<BTreeSet<String>, StoreError>;

    /// Writes all items in one request.
    fn bulk_write(&self, items: &[UploadItem]) -> Result<(), StoreError>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn list_keys(&self, page_size: usize) -> Result<BTreeSet<String>, StoreError> {
        (**self).list_keys(page_size)
    }

    fn bulk_write(&self, items: &[UploadItem]) -> Result<(), StoreError> {
        (**self).bulk_write(items)
    }
}

#[cfg(test)]
mod tests {
    use super::UploadItem;

    #[test]
    fn prefixes_keys() {
        let item = UploadItem::for_slug("blog/my-post", "$argon2id$...".to_string());
        assert_eq!(item.key, "pwd:blog/my-post");
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            serde_json::json!({"key": "pwd:blog/my-post", "value": "$argon2id$..."})
        );
    }
}
