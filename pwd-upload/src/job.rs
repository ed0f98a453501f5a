//! The password upload job.
//!
//! One linear pass: scan posts, hash the password of every protected post,
//! drop keys the namespace already holds (unless forced), then write the rest
//! in a single bulk request. Nothing is retried. The read-then-write against
//! the store is not transactional, so two concurrent runs may both upload the
//! same missing key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::content::{markdown_files, parse_document, resolve_slug, FrontMatter, ScanError};
use crate::crypto::passwords::{hash_password, HashParams};
use crate::store::cloudflare::MAX_PAGE_SIZE;
use crate::store::{KvStore, StoreError, UploadItem};

pub const DEFAULT_CONTENT_DIR: &str = "src/contents";

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("unable to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("hashing the password for {slug} failed: {message}")]
    Hash { slug: String, message: String },
    #[error("fetching existing keys failed: {0}")]
    ListKeys(#[source] StoreError),
    #[error("bulk upload failed: {0}")]
    BulkWrite(#[source] StoreError),
}

#[derive(Debug, Clone)]
pub struct JobOptions {
    pub content_root: PathBuf,
    /// Hash and report, but never touch the network.
    pub dry: bool,
    /// Upload every candidate even when its key already exists.
    pub force: bool,
    pub page_size: usize,
    pub hash_params: HashParams,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from(DEFAULT_CONTENT_DIR),
            dry: false,
            force: false,
            page_size: MAX_PAGE_SIZE,
            hash_params: HashParams::default(),
        }
    }
}

/// How a run ended. Every variant is a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    NothingProtected,
    DryRun { keys: Vec<String> },
    NothingNew { skipped_existing: usize },
    Uploaded { keys: Vec<String>, skipped_existing: usize },
}

/// Where a post's password comes from.
#[derive(Debug, PartialEq, Eq)]
enum Protection<'a> {
    Unprotected,
    /// `encrypt: true` with nothing to hash.
    MissingPassword,
    Default(&'a str),
    Explicit { password: &'a str, encrypt: bool },
}

fn classify<'a>(front_matter: &'a FrontMatter, default_password: Option<&'a str>) -> Protection<'a> {
    if !front_matter.is_protected() {
        return Protection::Unprotected;
    }

    match (front_matter.usable_password(), default_password) {
        (Some(password), _) => Protection::Explicit {
            password,
            encrypt: front_matter.encrypt,
        },
        (None, Some(password)) => Protection::Default(password),
        (None, None) => Protection::MissingPassword,
    }
}

/// Runs the job end to end.
///
/// `connect` is only invoked once a network call is actually needed, so dry
/// runs and runs without protected posts never build a store client.
pub fn run<S, F>(config: &Config, options: &JobOptions, connect: F) -> Result<JobOutcome, JobError>
where
    S: KvStore,
    F: FnOnce(&Config) -> Result<S, ConfigError>,
{
    info!(dry = options.dry, force = options.force, "password hashing run starting");

    if !options.dry {
        config.remote()?;
    }
    if options.page_size == 0 || options.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::InvalidPageSize {
            value: options.page_size,
            max: MAX_PAGE_SIZE,
        }
        .into());
    }

    let candidates = collect_candidates(config, options)?;

    if candidates.is_empty() {
        info!("no protected posts found");
        return Ok(JobOutcome::NothingProtected);
    }

    if options.dry {
        for item in &candidates {
            info!(key = %item.key, "would upload");
        }
        info!(count = candidates.len(), "dry run: KV left untouched");
        return Ok(JobOutcome::DryRun {
            keys: candidates.into_iter().map(|item| item.key).collect(),
        });
    }

    let store = connect(config)?;

    let total = candidates.len();
    let payload = if options.force {
        candidates
    } else {
        info!("checking for existing keys to avoid overwrite");
        let existing = store.list_keys(options.page_size).map_err(JobError::ListKeys)?;
        candidates
            .into_iter()
            .filter(|item| {
                let exists = existing.contains(&item.key);
                if exists {
                    debug!(key = %item.key, "already in KV, skipping");
                }
                !exists
            })
            .collect::<Vec<_>>()
    };
    let skipped_existing = total - payload.len();

    if payload.is_empty() {
        info!(skipped_existing, "nothing new to upload");
        return Ok(JobOutcome::NothingNew { skipped_existing });
    }

    store.bulk_write(&payload).map_err(JobError::BulkWrite)?;
    info!(uploaded = payload.len(), skipped_existing, "bulk upload complete");

    Ok(JobOutcome::Uploaded {
        keys: payload.into_iter().map(|item| item.key).collect(),
        skipped_existing,
    })
}

/// Scans the content root and hashes every protected post.
pub fn collect_candidates(config: &Config, options: &JobOptions) -> Result<Vec<UploadItem>, JobError> {
    let files = markdown_files(&options.content_root)?;
    debug!(files = files.len(), root = %options.content_root.display(), "scanning posts");

    let mut items = Vec::new();
    for file in files {
        if let Some(item) = candidate_for(&file, config, options)? {
            items.push(item);
        }
    }
    Ok(items)
}

fn candidate_for(file: &Path, config: &Config, options: &JobOptions) -> Result<Option<UploadItem>, JobError> {
    let raw = fs::read_to_string(file).map_err(|source| JobError::Read {
        path: file.to_path_buf(),
        source,
    })?;

    let front_matter = match parse_document(&raw) {
        Ok(Some(front_matter)) => front_matter,
        Ok(None) => {
            debug!(path = %file.display(), "no front matter");
            return Ok(None);
        }
        Err(err) => {
            warn!(path = %file.display(), error = %err, "skipped: invalid front matter");
            return Ok(None);
        }
    };

    let protection = classify(&front_matter, config.default_password.as_deref());
    let slug = resolve_slug(&options.content_root, file, front_matter.slug.as_deref());
    let password = match protection {
        Protection::Unprotected => return Ok(None),
        Protection::MissingPassword => {
            warn!(%slug, "skipped: encrypt=true but no password and no DEFAULT_PASSWORD set");
            return Ok(None);
        }
        Protection::Default(password) => {
            warn!(%slug, "using the default password");
            password
        }
        Protection::Explicit { password, encrypt } => {
            if !encrypt {
                warn!(%slug, "'encrypt' is false but 'password' is set, hashing anyway");
            }
            password
        }
    };

    let hash = hash_password(password, &options.hash_params).map_err(|e| JobError::Hash {
        slug: slug.clone(),
        message: format!("{e}"),
    })?;
    debug!(%slug, "hashed");

    Ok(Some(UploadItem::for_slug(&slug, hash)))
}
