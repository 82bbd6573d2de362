//! The crawl engine
//!
//! Everything that talks to GitHub lives here. The layers, from the bottom up:
//!
//! - [`RateLimiter`] tracks the `search` and `core` request pools and parks the crawl when a pool is exhausted.
//! - [`Fetcher`] issues a single GET with fixed-delay retry on transient failures and decodes the JSON body.
//! - [`GitHubApi`] routes API requests through the rate limiter and collects paginated results.
//! - [`Locator`] decides whether, and where, a repository holds an Arduino library.
//! - [`descriptors`] reads the `library.properties` and `library.json` metadata files.
//!
//! Failures are reported through [`FetchError`], which distinguishes a missing resource from a malformed
//! response and from transient faults that outlasted the retry budget. Callers make different decisions for each.

pub mod descriptors;

mod api;
mod fetcher;
mod locator;
mod rate_limiter;
mod repo_spec;
mod repository;

pub use api::{GitHubApi, ROOT_FOLDER};
pub use fetcher::{FetchError, FetchResult, Fetcher, RetryPolicy, normalize_url};
pub use locator::{LibraryPath, Locator, RootDecision, RootObservation, decide};
pub use rate_limiter::{QuotaPool, QuotaSnapshot, QuotaSource, RateLimiter};
pub use repo_spec::RepoSpec;
pub use repository::{ContentEntry, EntryKind, License, Owner, Repository};
