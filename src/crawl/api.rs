use super::fetcher::{FetchError, FetchResult, Fetcher};
use super::rate_limiter::{QuotaPool, QuotaSnapshot, QuotaSource, RateLimiter};
use super::repository::{ContentEntry, Repository};
use crate::Result;
use crate::config::Config;
use chrono::DateTime;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use serde::Deserialize;
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use url::Url;

const LOG_TARGET: &str = "       api";

/// Folder name that designates the repository root.
pub const ROOT_FOLDER: &str = "/";

/// Where the items of a result page live.
#[derive(Debug, Clone, Copy)]
enum PageItems {
    /// The page body is the item array.
    Body,

    /// The item array is the named field of the page body, as with search results.
    Field(&'static str),
}

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: RateLimitEntry,
    search: RateLimitEntry,
}

#[derive(Debug, Deserialize)]
struct RateLimitEntry {
    limit: u64,
    remaining: u64,
    reset: i64,
}

/// GitHub REST API access for the crawl.
///
/// API requests go through the rate limiter with the quota pool of their endpoint and push the quota
/// reported on the response back into it. Raw file downloads and the library index bypass the limiter.
#[derive(Debug)]
pub struct GitHubApi {
    fetcher: Fetcher,
    limiter: RateLimiter,
    api_base: Url,
    raw_base: Url,
    per_page: u32,
}

impl GitHubApi {
    pub fn new(config: &Config, token: Option<&str>) -> Result<Self> {
        let api_base = parse_base_url(&config.api_base_url)?;
        let raw_base = parse_base_url(&config.raw_base_url)?;

        Ok(Self {
            fetcher: Fetcher::new(token, api_base.clone(), config.retry_policy())?,
            limiter: RateLimiter::new(Duration::from_secs(config.notification_interval), token.is_some()),
            api_base,
            raw_base,
            per_page: config.results_per_page,
        })
    }

    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Fetch a repository object.
    pub async fn repository(&self, owner: &str, name: &str) -> Result<Repository, FetchError> {
        let result = self.request(&["repos", owner, name], &[]).await?;
        decode(result)
    }

    /// Run a repository search and collect every result page.
    ///
    /// Results are ordered by fork count, the least volatile sort key available, so items don't shift
    /// between pages while the search is being paged through.
    pub async fn search_repositories(&self, query: &str) -> Result<Vec<Repository>, FetchError> {
        let params = [("q", query.to_string()), ("sort", "forks".to_string()), ("order", "desc".to_string())];
        self.collect_pages(&["search", "repositories"], &params, PageItems::Field("items"))
            .await
    }

    /// List the root of `repo`, or one of its folders.
    pub async fn list_contents(&self, repo: &Repository, folder: Option<&str>) -> Result<Vec<ContentEntry>, FetchError> {
        let mut segments = vec!["repos", repo.owner.login.as_str(), repo.name.as_str(), "contents"];
        if let Some(folder) = folder.filter(|f| *f != ROOT_FOLDER) {
            segments.push(folder);
        }

        self.collect_pages(&segments, &[], PageItems::Body).await
    }

    /// Count the contributors of `repo` by requesting one contributor per page and reading the page count.
    pub async fn contributor_count(&self, repo: &Repository) -> Result<u64, FetchError> {
        let result = self
            .request(
                &["repos", repo.owner.login.as_str(), repo.name.as_str(), "contributors"],
                &[("per_page", "1".to_string())],
            )
            .await?;

        Ok(result.total_page_count)
    }

    /// URL of `file` inside `folder` on the default branch of `repo`.
    #[must_use]
    pub fn raw_file_url(&self, repo: &Repository, folder: &str, file: &str) -> Url {
        let mut url = self.raw_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            let _ = path
                .pop_if_empty()
                .push(&repo.owner.login)
                .push(&repo.name)
                .extend(repo.default_branch.split('/'));

            if folder != ROOT_FOLDER {
                let _ = path.push(folder);
            }

            let _ = path.push(file);
        }

        url
    }

    /// Download a raw file as text.
    pub async fn fetch_raw_text(&self, url: &Url) -> Result<String, FetchError> {
        self.fetcher.fetch_text(url).await
    }

    /// Fetch and decode a JSON document outside the API, such as a raw file or the library index.
    pub async fn fetch_json(&self, url: &Url) -> Result<FetchResult, FetchError> {
        self.fetcher.fetch(url).await
    }

    fn api_url(&self, segments: &[&str], query: &[(&str, String)]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            let _ = path.pop_if_empty().extend(segments);
        }

        if !query.is_empty() {
            let _ = url
                .query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        url
    }

    async fn request(&self, segments: &[&str], query: &[(&str, String)]) -> Result<FetchResult, FetchError> {
        let pool = QuotaPool::for_endpoint(segments.first().copied().unwrap_or_default());
        let url = self.api_url(segments, query);

        self.limiter.acquire(pool, self).await?;
        let result = self.fetcher.fetch(&url).await?;
        if let Some(quota) = result.quota {
            self.limiter.observe(pool, quota).await;
        }

        Ok(result)
    }

    async fn collect_pages<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        items: PageItems,
    ) -> Result<Vec<T>, FetchError> {
        let per_page = self.per_page.to_string();
        let mut collected = Vec::new();
        let mut page: u64 = 1;

        loop {
            let mut params = query.to_vec();
            params.push(("page", page.to_string()));
            params.push(("per_page", per_page.clone()));

            let FetchResult {
                url, body, has_more_pages, ..
            } = self.request(segments, &params).await?;

            let page_items = match (items, body) {
                (_, Value::Null) => Value::Null,
                (PageItems::Body, body) => body,
                (PageItems::Field(name), Value::Object(mut fields)) => fields.remove(name).ok_or_else(|| FetchError::Malformed {
                    url: url.clone(),
                    source: serde_json::Error::missing_field(name),
                })?,
                (PageItems::Field(_), _) => {
                    return Err(FetchError::Malformed {
                        url,
                        source: serde_json::Error::custom("expected an object"),
                    });
                }
            };

            if !page_items.is_null() {
                let decoded: Vec<T> =
                    serde_json::from_value(page_items).map_err(|source| FetchError::Malformed { url: url.clone(), source })?;
                log::debug!(target: LOG_TARGET, "Page {page} of '{url}' held {} items", decoded.len());
                collected.extend(decoded);
            }

            if !has_more_pages {
                break;
            }
            page += 1;
        }

        Ok(collected)
    }
}

impl QuotaSource for GitHubApi {
    async fn quota_status(&self, pool: QuotaPool) -> Result<QuotaSnapshot, FetchError> {
        let url = self.api_url(&["rate_limit"], &[]);
        let result = self.fetcher.fetch(&url).await?;

        let response: RateLimitResponse =
            serde_json::from_value(result.body).map_err(|source| FetchError::Malformed { url: url.clone(), source })?;

        let entry = match pool {
            QuotaPool::Core => response.resources.core,
            QuotaPool::Search => response.resources.search,
        };

        let reset_at = DateTime::from_timestamp(entry.reset, 0).ok_or_else(|| FetchError::Malformed {
            url,
            source: serde_json::Error::custom(format!("reset timestamp {} out of range", entry.reset)),
        })?;

        Ok(QuotaSnapshot {
            limit: Some(entry.limit),
            remaining: entry.remaining,
            reset_at,
        })
    }
}

fn decode<T: DeserializeOwned>(result: FetchResult) -> Result<T, FetchError> {
    serde_json::from_value(result.body).map_err(|source| FetchError::Malformed { url: result.url, source })
}

fn parse_base_url(s: &str) -> Result<Url> {
    let url = Url::parse(s).into_app_err_with(|| format!("invalid base URL '{s}'"))?;
    if url.cannot_be_a_base() {
        bail!("'{s}' cannot be used as a base URL");
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api() -> GitHubApi {
        let config = Config {
            api_base_url: "https://api.example.com/v3/".to_string(),
            raw_base_url: "https://raw.example.com".to_string(),
            ..Config::default()
        };
        GitHubApi::new(&config, None).unwrap()
    }

    fn repository(branch: &str) -> Repository {
        serde_json::from_value(json!({
            "html_url": "https://github.com/octo/blink",
            "owner": { "login": "octo" },
            "name": "blink",
            "default_branch": branch,
        }))
        .unwrap()
    }

    #[test]
    fn test_api_url_segments_and_query() {
        let url = api().api_url(
            &["search", "repositories"],
            &[("q", "topic:arduino created:<=2018-01-01".to_string()), ("page", "2".to_string())],
        );
        assert_eq!(url.path(), "/v3/search/repositories");

        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs[0].1, "topic:arduino created:<=2018-01-01");
        assert_eq!(pairs[1].1, "2");
    }

    #[test]
    fn test_api_url_encodes_folder_names() {
        let url = api().api_url(&["repos", "octo", "blink", "contents", "My Lib #2"], &[]);
        assert_eq!(url.path(), "/v3/repos/octo/blink/contents/My%20Lib%20%232");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_raw_file_url_root() {
        let url = api().raw_file_url(&repository("main"), ROOT_FOLDER, "library.properties");
        assert_eq!(url.as_str(), "https://raw.example.com/octo/blink/main/library.properties");
    }

    #[test]
    fn test_raw_file_url_folder_and_nested_branch() {
        let url = api().raw_file_url(&repository("release/1.x"), "src lib", "library.json");
        assert_eq!(url.as_str(), "https://raw.example.com/octo/blink/release/1.x/src%20lib/library.json");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let _ = parse_base_url("not a url").unwrap_err();
        let _ = parse_base_url("mailto:someone@example.com").unwrap_err();
    }
}
