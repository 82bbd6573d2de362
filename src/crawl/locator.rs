use super::api::{GitHubApi, ROOT_FOLDER};
use super::descriptors;
use super::repository::{ContentEntry, Repository};
use crate::catalog::RepositoryRecord;
use core::fmt::{Display, Formatter};

const LOG_TARGET: &str = "   locator";

const HEADER_EXTENSIONS: [&str; 3] = ["h", "hh", "hpp"];
const SKETCH_EXTENSIONS: [&str; 2] = ["ino", "pde"];
const EXAMPLES_FOLDERS: [&str; 6] = ["examples", "example", "Examples", "Example", "EXAMPLES", "EXAMPLE"];

/// Where a library lives inside its repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryPath {
    Root,
    Folder(String),
}

impl Display for LibraryPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Root => f.write_str(ROOT_FOLDER),
            Self::Folder(name) => f.write_str(name),
        }
    }
}

/// What a listing of the repository root revealed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootObservation {
    pub header: bool,
    pub sketch: bool,
    pub examples_dir: bool,
}

impl RootObservation {
    /// Summarize a root listing. Sketches and examples folders are only looked for when verifying.
    #[must_use]
    pub fn classify(entries: &[ContentEntry], verify: bool) -> Self {
        let mut obs = Self::default();
        for entry in entries {
            if entry.is_file() {
                obs.header |= has_extension(&entry.name, &HEADER_EXTENSIONS);
                obs.sketch |= verify && has_extension(&entry.name, &SKETCH_EXTENSIONS);
            } else if entry.is_dir() {
                obs.examples_dir |= verify && EXAMPLES_FOLDERS.contains(&entry.name.as_str());
            }
        }

        obs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootDecision {
    /// The library is at the root.
    Accept,

    /// The repository does not hold a library.
    Reject,

    /// Look for the library one folder down.
    ScanSubfolders,
}

/// Decide what a root observation means.
///
/// When verifying, the library must sit at the root and a root with sketches must also carry an
/// examples folder, otherwise the repository is most likely a sketch rather than a library.
#[must_use]
pub const fn decide(obs: RootObservation, verify: bool) -> RootDecision {
    if verify {
        if obs.header && (!obs.sketch || obs.examples_dir) {
            RootDecision::Accept
        } else {
            RootDecision::Reject
        }
    } else if obs.header {
        RootDecision::Accept
    } else {
        RootDecision::ScanSubfolders
    }
}

/// Finds the library inside a repository, filling in descriptor fields as they are found.
#[derive(Debug, Clone, Copy)]
pub struct Locator<'a> {
    api: &'a GitHubApi,
}

impl<'a> Locator<'a> {
    #[must_use]
    pub const fn new(api: &'a GitHubApi) -> Self {
        Self { api }
    }

    /// Locate the library in `repo`.
    ///
    /// Returns `None` when no library was found. Descriptor files found along the way are parsed into
    /// `record` even when the search fails afterwards.
    pub async fn locate(&self, repo: &Repository, verify: bool, record: &mut RepositoryRecord) -> Option<LibraryPath> {
        // Both descriptors are read so every available field is filled in
        let has_properties = descriptors::read_properties(self.api, repo, ROOT_FOLDER, &mut record.properties).await;
        let has_manifest = descriptors::read_manifest(self.api, repo, ROOT_FOLDER, &mut record.manifest).await;
        if has_properties || has_manifest {
            log::debug!(target: LOG_TARGET, "Found a descriptor at the root of '{}'", repo.html_url);
            return Some(LibraryPath::Root);
        }

        let entries = match self.api.list_contents(repo, None).await {
            Ok(entries) => entries,
            Err(e) if e.is_missing() => {
                log::debug!(target: LOG_TARGET, "'{}' is empty", repo.html_url);
                return None;
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Unable to list the root of '{}': {e}", repo.html_url);
                return None;
            }
        };

        match decide(RootObservation::classify(&entries, verify), verify) {
            RootDecision::Accept => Some(LibraryPath::Root),
            RootDecision::Reject => {
                log::debug!(target: LOG_TARGET, "Rejecting '{}', no library at the root", repo.html_url);
                None
            }
            RootDecision::ScanSubfolders => self.scan_subfolders(repo, &entries, record).await,
        }
    }

    async fn scan_subfolders(&self, repo: &Repository, entries: &[ContentEntry], record: &mut RepositoryRecord) -> Option<LibraryPath> {
        for folder in entries.iter().filter(|e| e.is_dir() && !e.name.starts_with('.')) {
            let contents = match self.api.list_contents(repo, Some(&folder.name)).await {
                Ok(contents) => contents,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Unable to list folder '{}' of '{}': {e}", folder.name, repo.html_url);
                    continue;
                }
            };

            let mut found = false;
            for entry in contents.iter().filter(|e| e.is_file()) {
                if has_extension(&entry.name, &HEADER_EXTENSIONS) {
                    found = true;
                } else if entry.name == descriptors::PROPERTIES_FILE {
                    let _ = descriptors::read_properties(self.api, repo, &folder.name, &mut record.properties).await;
                    found = true;
                } else if entry.name == descriptors::MANIFEST_FILE {
                    let _ = descriptors::read_manifest(self.api, repo, &folder.name, &mut record.manifest).await;
                    found = true;
                }
            }

            if found {
                log::debug!(target: LOG_TARGET, "Found the library of '{}' in folder '{}'", repo.html_url, folder.name);
                return Some(LibraryPath::Folder(folder.name.clone()));
            }
        }

        None
    }
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| extensions.contains(&ext))
}
