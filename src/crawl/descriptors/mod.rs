//! Library descriptor files
//!
//! Arduino libraries describe themselves with `library.properties`, the Library Manager format, and
//! PlatformIO libraries with `library.json`. Many repositories carry both. Each reader downloads its file
//! from the repository's default branch and fills whatever fields it recognizes.

mod library_json;
mod properties;

pub use library_json::LibraryManifest;
pub use properties::LibraryProperties;

use super::api::GitHubApi;
use super::fetcher::FetchError;
use super::repository::Repository;

const LOG_TARGET: &str = "descriptor";

pub const PROPERTIES_FILE: &str = "library.properties";
pub const MANIFEST_FILE: &str = "library.json";

/// Read `library.properties` from `folder` of `repo` into `fields`.
///
/// Returns whether the file exists.
pub async fn read_properties(api: &GitHubApi, repo: &Repository, folder: &str, fields: &mut LibraryProperties) -> bool {
    let url = api.raw_file_url(repo, folder, PROPERTIES_FILE);
    match api.fetch_raw_text(&url).await {
        Ok(text) => {
            fields.parse(&text);
            true
        }
        Err(e) => {
            log::debug!(target: LOG_TARGET, "No {PROPERTIES_FILE} for '{}': {e}", repo.html_url);
            false
        }
    }
}

/// Read `library.json` from `folder` of `repo` into `fields`.
///
/// Returns whether the file exists, which includes a file whose content can't be decoded.
pub async fn read_manifest(api: &GitHubApi, repo: &Repository, folder: &str, fields: &mut LibraryManifest) -> bool {
    let url = api.raw_file_url(repo, folder, MANIFEST_FILE);
    match api.fetch_json(&url).await {
        Ok(result) => {
            fields.parse(&result.body, &repo.html_url);
            true
        }
        Err(e @ FetchError::Malformed { .. }) => {
            log::warn!(target: LOG_TARGET, "Unable to decode {MANIFEST_FILE} for '{}': {e}", repo.html_url);
            true
        }
        Err(e) => {
            log::debug!(target: LOG_TARGET, "No {MANIFEST_FILE} for '{}': {e}", repo.html_url);
            false
        }
    }
}
