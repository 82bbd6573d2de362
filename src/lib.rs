//! inoliblist crate
//!
//! This crate is an implementation detail of the `inoliblist` tool. It crawls GitHub for repositories that contain
//! Arduino libraries, locates the library inside each repository, and collects the metadata needed to build a
//! tab-separated catalog. The crate's API is fluid and may change without warning.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod catalog;

#[doc(hidden)]
pub mod config;

#[doc(hidden)]
pub mod crawl;

#[doc(hidden)]
pub mod reports;
