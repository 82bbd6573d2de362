use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use url::Url;

/// A GitHub repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    owner: Box<str>,
    repo: Box<str>,
}

impl RepoSpec {
    /// Parse a repository URL such as `https://github.com/owner/repo.git`.
    ///
    /// Only `github.com` URLs are accepted. Any path beyond the repository name is ignored.
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim()).into_app_err_with(|| format!("invalid repository URL '{url}'"))?;

        if parsed.host_str() != Some("github.com") {
            bail!("not a GitHub URL: {url}");
        }

        let path_segments: Vec<_> = parsed.path_segments().map(Iterator::collect).unwrap_or_default();
        if path_segments.len() < 2 {
            bail!("invalid repository URL format: {url}");
        }

        let owner = path_segments[0];
        let repo = path_segments[1].trim_end_matches(".git");
        if owner.is_empty() || repo.is_empty() {
            bail!("invalid repository URL, empty owner or repo name: {url}");
        }

        Ok(Self {
            owner: Box::from(owner),
            repo: Box::from(repo),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
