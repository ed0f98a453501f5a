//! Pre-build job for the blog: hash the passwords of protected posts and
//! publish them to Workers KV so the site can check visitors' answers.

pub mod config;
pub mod content;
pub mod crypto;
pub mod job;
pub mod store;
