//! WordPress REST integration: authenticated client, publishing, and
//! taxonomy resolution.
//!
//! This crate provides:
//! - [`CmsClient`] — basic-auth client with `get`/`post` verbs, the
//!   authentication probe, and post publishing
//! - [`TaxonomyResolver`] — author/category/tag name → id, creating missing
//!   categories and tags
//! - [`AuthorCache`] — per-run memo of author ids

pub mod client;
pub mod taxonomy;

pub use client::CmsClient;
pub use taxonomy::{AuthorCache, TaxonomyResolver};
