//! Password hashing for protected posts.

pub mod passwords;
