use crate::crawl::descriptors::{LibraryManifest, LibraryProperties};
use crate::crawl::{LibraryPath, Repository};
use chrono::{DateTime, Utc};
use strum::{EnumIter, IntoEnumIterator};

/// How a repository first came to the catalog's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Listed in the Arduino Library Manager index.
    LibraryManager,

    /// Returned by a repository search.
    Search,
}

/// One catalog row.
#[derive(Debug, Clone)]
pub struct RepositoryRecord {
    pub url: String,
    pub owner: String,
    pub name: String,
    pub default_branch: String,
    pub library_path: Option<LibraryPath>,
    pub archived: bool,
    pub fork: bool,
    pub pushed_at: Option<DateTime<Utc>>,
    pub forks: u64,
    pub stars: u64,
    pub contributors: Option<u64>,
    pub license: String,
    pub language: Option<String>,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub properties: LibraryProperties,
    pub manifest: LibraryManifest,
    provenance: Provenance,
}

impl RepositoryRecord {
    #[must_use]
    pub fn new(provenance: Provenance) -> Self {
        Self {
            url: String::new(),
            owner: String::new(),
            name: String::new(),
            default_branch: String::new(),
            library_path: None,
            archived: false,
            fork: false,
            pushed_at: None,
            forks: 0,
            stars: 0,
            contributors: None,
            license: String::new(),
            language: None,
            description: None,
            topics: Vec::new(),
            properties: LibraryProperties::default(),
            manifest: LibraryManifest::default(),
            provenance,
        }
    }

    #[must_use]
    pub const fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Copy the repository-level fields of `repo`.
    pub fn fill_from(&mut self, repo: &Repository) {
        self.url.clone_from(&repo.html_url);
        self.owner.clone_from(&repo.owner.login);
        self.name.clone_from(&repo.name);
        self.default_branch.clone_from(&repo.default_branch);
        self.archived = repo.archived;
        self.fork = repo.fork;
        self.pushed_at = repo.pushed_at;
        self.forks = repo.forks_count;
        self.stars = repo.stargazers_count;
        self.license = repo.license_id().to_string();
        self.language.clone_from(&repo.language);
        self.description.clone_from(&repo.description);
        self.topics.clone_from(&repo.topics);
    }

    /// The text of one cell, before sanitizing.
    #[must_use]
    pub fn cell(&self, column: Column) -> String {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let props = &self.properties;
        let manifest = &self.manifest;

        match column {
            Column::RepositoryUrl => self.url.clone(),
            Column::Owner => self.owner.clone(),
            Column::RepoName => self.name.clone(),
            Column::DefaultBranch => self.default_branch.clone(),
            Column::LibraryPath => self.library_path.as_ref().map(ToString::to_string).unwrap_or_default(),
            Column::Archived => flag(self.archived).to_string(),
            Column::Fork => flag(self.fork).to_string(),
            Column::LastPush => self
                .pushed_at
                .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_default(),
            Column::Forks => self.forks.to_string(),
            Column::Stars => self.stars.to_string(),
            Column::Contributors => self.contributors.map(|c| c.to_string()).unwrap_or_default(),
            Column::License => self.license.clone(),
            Column::Language => text(&self.language),
            Column::Description => text(&self.description),
            Column::Topics => self.topics.join(", "),
            Column::InLibraryManager => flag(self.provenance == Provenance::LibraryManager).to_string(),
            Column::LmName => text(&props.name),
            Column::LmVersion => text(&props.version),
            Column::LmAuthor => text(&props.author),
            Column::LmMaintainer => text(&props.maintainer),
            Column::LmSentence => text(&props.sentence),
            Column::LmParagraph => text(&props.paragraph),
            Column::LmCategory => text(&props.category),
            Column::LmUrl => text(&props.url),
            Column::LmArchitectures => text(&props.architectures),
            Column::PioName => text(&manifest.name),
            Column::PioDescription => text(&manifest.description),
            Column::PioKeywords => text(&manifest.keywords),
            Column::PioAuthors => text(&manifest.authors),
            Column::PioRepository => text(&manifest.repository),
            Column::PioVersion => text(&manifest.version),
            Column::PioLicense => text(&manifest.license),
            Column::PioDownloadUrl => text(&manifest.download_url),
            Column::PioHomepage => text(&manifest.homepage),
            Column::PioFrameworks => text(&manifest.frameworks),
            Column::PioPlatforms => text(&manifest.platforms),
        }
    }

    /// Every cell in column order, with tabs and line breaks replaced and surrounding whitespace removed.
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        Column::iter().map(|column| sanitize(&self.cell(column))).collect()
    }
}

const fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn sanitize(cell: &str) -> String {
    cell.replace('\t', "    ").replace("\r\n", " ").replace(['\r', '\n'], " ").trim().to_string()
}

/// Catalog columns, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Column {
    RepositoryUrl,
    Owner,
    RepoName,
    DefaultBranch,
    LibraryPath,
    Archived,
    Fork,
    LastPush,
    Forks,
    Stars,
    Contributors,
    License,
    Language,
    Description,
    Topics,
    InLibraryManager,
    LmName,
    LmVersion,
    LmAuthor,
    LmMaintainer,
    LmSentence,
    LmParagraph,
    LmCategory,
    LmUrl,
    LmArchitectures,
    PioName,
    PioDescription,
    PioKeywords,
    PioAuthors,
    PioRepository,
    PioVersion,
    PioLicense,
    PioDownloadUrl,
    PioHomepage,
    PioFrameworks,
    PioPlatforms,
}

impl Column {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::RepositoryUrl => "Repository URL",
            Self::Owner => "Owner",
            Self::RepoName => "Repo Name",
            Self::DefaultBranch => "Default Branch",
            Self::LibraryPath => "Library Path",
            Self::Archived => "Archived",
            Self::Fork => "Fork",
            Self::LastPush => "Last Push",
            Self::Forks => "#Forks",
            Self::Stars => "#Stars",
            Self::Contributors => "#Contributors",
            Self::License => "License",
            Self::Language => "Language",
            Self::Description => "Repo Description",
            Self::Topics => "GitHub Topics",
            Self::InLibraryManager => "In Library Manager",
            Self::LmName => "LM name",
            Self::LmVersion => "LM version",
            Self::LmAuthor => "LM author",
            Self::LmMaintainer => "LM maintainer",
            Self::LmSentence => "LM sentence",
            Self::LmParagraph => "LM paragraph",
            Self::LmCategory => "LM category",
            Self::LmUrl => "LM url",
            Self::LmArchitectures => "LM architectures",
            Self::PioName => "PIO name",
            Self::PioDescription => "PIO description",
            Self::PioKeywords => "PIO keywords",
            Self::PioAuthors => "PIO authors",
            Self::PioRepository => "PIO repository",
            Self::PioVersion => "PIO version",
            Self::PioLicense => "PIO license",
            Self::PioDownloadUrl => "PIO downloadUrl",
            Self::PioHomepage => "PIO homepage",
            Self::PioFrameworks => "PIO frameworks",
            Self::PioPlatforms => "PIO platforms",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repository() -> Repository {
        serde_json::from_value(json!({
            "html_url": "https://github.com/octo/blink",
            "owner": { "login": "octo" },
            "name": "blink",
            "default_branch": "main",
            "archived": true,
            "fork": false,
            "pushed_at": "2019-07-04T12:30:00Z",
            "forks_count": 7,
            "stargazers_count": 42,
            "language": null,
            "description": "\tBlinks\tLEDs  ",
            "topics": ["arduino", "led"],
            "license": { "spdx_id": "MIT" },
        }))
        .unwrap()
    }

    #[test]
    fn test_column_count_and_titles() {
        assert_eq!(Column::iter().count(), 36);
        assert_eq!(Column::iter().next().map(Column::title), Some("Repository URL"));
        assert_eq!(Column::iter().last().map(Column::title), Some("PIO platforms"));
    }

    #[test]
    fn test_cells_from_repository() {
        let mut record = RepositoryRecord::new(Provenance::LibraryManager);
        record.fill_from(&repository());
        record.library_path = Some(LibraryPath::Root);
        record.contributors = Some(3);
        record.properties.name = Some("Blink".to_string());

        let cells = record.cells();
        assert_eq!(cells.len(), 36);
        assert_eq!(cells[0], "https://github.com/octo/blink");
        assert_eq!(cells[1], "octo");
        assert_eq!(cells[4], "/");
        assert_eq!(cells[5], "True");
        assert_eq!(cells[6], "False");
        assert_eq!(cells[7], "2019-07-04T12:30:00Z");
        assert_eq!(cells[8], "7");
        assert_eq!(cells[9], "42");
        assert_eq!(cells[10], "3");
        assert_eq!(cells[11], "MIT");
        assert_eq!(cells[12], "");
        assert_eq!(cells[13], "Blinks    LEDs");
        assert_eq!(cells[14], "arduino, led");
        assert_eq!(cells[15], "True");
        assert_eq!(cells[16], "Blink");
    }

    #[test]
    fn test_unknown_values_render_empty() {
        let mut record = RepositoryRecord::new(Provenance::Search);
        record.fill_from(&repository());

        assert_eq!(record.cell(Column::LibraryPath), "");
        assert_eq!(record.cell(Column::Contributors), "");
        assert_eq!(record.cell(Column::InLibraryManager), "False");
        assert_eq!(record.cell(Column::PioName), "");
    }

    #[test]
    fn test_folder_path() {
        let mut record = RepositoryRecord::new(Provenance::Search);
        record.library_path = Some(LibraryPath::Folder("src".to_string()));
        assert_eq!(record.cell(Column::LibraryPath), "src");
    }

    #[test]
    fn test_line_breaks_do_not_split_rows() {
        let mut record = RepositoryRecord::new(Provenance::Search);
        record.description = Some("Blinks\r\nthe LED\nfast\r".to_string());
        record.manifest.description = Some("one\ttwo\nthree".to_string());

        let cells = record.cells();
        assert_eq!(cells[13], "Blinks the LED fast");
        assert_eq!(cells[26], "one    two three");
        assert!(cells.iter().all(|c| !c.contains(['\r', '\n', '\t'])));
    }
}
