use super::{Catalog, Provenance, RepositoryRecord};
use crate::Result;
use crate::config::{Config, SearchSpec};
use crate::crawl::{GitHubApi, Locator, RepoSpec, Repository};
use ohno::{IntoAppError, bail};
use serde_json::Value;
use url::Url;

const LOG_TARGET: &str = "   crawler";

/// A crawl session.
///
/// Owns the API access, and with it the quota state, as well as the catalog being built. Sources are
/// processed one at a time and a record enters the catalog only once it is complete.
#[derive(Debug)]
pub struct Crawler {
    api: GitHubApi,
    catalog: Catalog,
    library_index_url: Url,
    search_ceiling: u64,
}

impl Crawler {
    pub fn new(config: &Config, token: Option<&str>) -> Result<Self> {
        let library_index_url = Url::parse(&config.library_index_url)
            .into_app_err_with(|| format!("invalid library index URL '{}'", config.library_index_url))?;

        Ok(Self {
            api: GitHubApi::new(config, token)?,
            catalog: Catalog::new(),
            library_index_url,
            search_ceiling: config.search_ceiling,
        })
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn into_catalog(self) -> Catalog {
        self.catalog
    }

    /// Process the library index, when requested, then each search in order.
    pub async fn run(&mut self, include_library_index: bool, searches: &[SearchSpec]) -> Result<()> {
        if include_library_index {
            self.process_library_index().await?;
        }

        for spec in searches {
            self.search(spec).await?;
        }

        log::info!(target: LOG_TARGET, "Crawl complete, {} repositories cataloged", self.catalog.len());
        Ok(())
    }

    /// Add every GitHub repository listed in the Library Manager index.
    pub async fn process_library_index(&mut self) -> Result<()> {
        log::info!(target: LOG_TARGET, "Processing the Library Manager index at '{}'", self.library_index_url);

        let index = self
            .api
            .fetch_json(&self.library_index_url)
            .await
            .into_app_err("unable to fetch the Library Manager index")?;

        let specs = index_repositories(&index.body)?;
        log::info!(target: LOG_TARGET, "Library Manager index lists {} GitHub repositories", specs.len());

        for spec in specs {
            let repo = match self.api.repository(spec.owner(), spec.repo()).await {
                Ok(repo) => repo,
                Err(e) if e.is_missing() => {
                    log::info!(target: LOG_TARGET, "Skipping '{spec}', the repository no longer exists");
                    continue;
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("unable to fetch repository '{spec}'")),
            };

            let _ = self.populate_row(&repo, Provenance::LibraryManager, false).await;
        }

        Ok(())
    }

    /// Run one search of the plan over each of its creation date ranges.
    pub async fn search(&mut self, spec: &SearchSpec) -> Result<()> {
        log::info!(target: LOG_TARGET, "Running search '{}'", spec.name);

        let ranges: Vec<Option<&str>> = if spec.created.is_empty() {
            vec![None]
        } else {
            spec.created.iter().map(|r| Some(r.as_str())).collect()
        };

        for range in ranges {
            let query = search_query(spec, range);
            let items = self
                .api
                .search_repositories(&query)
                .await
                .into_app_err_with(|| format!("search '{query}' failed"))?;

            log::info!(target: LOG_TARGET, "Search '{query}' returned {} repositories", items.len());
            if items.len() as u64 >= self.search_ceiling {
                log::warn!(
                    target: LOG_TARGET,
                    "Search '{query}' reached the limit of {} results, split its date range to see everything",
                    self.search_ceiling
                );
            }

            for repo in &items {
                let _ = self.populate_row(repo, Provenance::Search, spec.verify).await;
            }
        }

        Ok(())
    }

    /// Build a record for `repo` and add it to the catalog.
    ///
    /// Returns whether a record was added. Repositories already in the catalog are skipped without any
    /// request, and in verify mode so are repositories where no library was found.
    pub async fn populate_row(&mut self, repo: &Repository, provenance: Provenance, verify: bool) -> bool {
        if self.catalog.contains(&repo.html_url) {
            log::debug!(target: LOG_TARGET, "Skipping duplicate '{}'", repo.html_url);
            return false;
        }

        log::debug!(target: LOG_TARGET, "Populating row for '{}'", repo.html_url);

        let mut record = RepositoryRecord::new(provenance);
        let library_path = Locator::new(&self.api).locate(repo, verify, &mut record).await;
        if verify && library_path.is_none() {
            log::debug!(target: LOG_TARGET, "No library found in '{}', skipping", repo.html_url);
            return false;
        }

        record.library_path = library_path;
        record.fill_from(repo);
        record.contributors = match self.api.contributor_count(repo).await {
            Ok(count) => Some(count),
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Unable to count the contributors of '{}': {e}", repo.html_url);
                None
            }
        };

        log::info!(target: LOG_TARGET, "Added '{}'", repo.html_url);
        self.catalog.insert(record)
    }
}

fn search_query(spec: &SearchSpec, created: Option<&str>) -> String {
    let mut query = spec.query.clone();
    if let Some(range) = created {
        query.push_str(" created:");
        query.push_str(range);
    }

    query.push_str(" fork:");
    query.push_str(spec.fork.as_str());
    query
}

/// GitHub repositories listed in a Library Manager index document.
///
/// The index holds one entry per library release and the releases of a library are adjacent, so an entry
/// is skipped when its repository matches the previous entry's. Repositories hosted elsewhere are skipped.
pub fn index_repositories(index: &Value) -> Result<Vec<RepoSpec>> {
    let Some(libraries) = index.get("libraries").and_then(Value::as_array) else {
        bail!("the Library Manager index has no 'libraries' list");
    };

    let mut specs = Vec::new();
    let mut previous: Option<&str> = None;

    for library in libraries {
        let Some(repository) = library.get("repository").and_then(Value::as_str) else {
            continue;
        };

        if previous == Some(repository) {
            continue;
        }
        previous = Some(repository);

        match RepoSpec::parse(repository) {
            Ok(spec) => specs.push(spec),
            Err(e) => log::debug!(target: LOG_TARGET, "Skipping index entry: {e}"),
        }
    }

    Ok(specs)
}
