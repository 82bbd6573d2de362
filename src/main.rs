//! A tool to build a catalog of Arduino library repositories hosted on GitHub.
//!
//! # Overview
//!
//! `inoliblist` finds GitHub repositories that contain Arduino libraries and writes one tab-separated row per
//! repository. Repositories come from the Arduino Library Manager index and from a plan of GitHub searches.
//! For each one it locates the library inside the repository, reads its `library.properties` and
//! `library.json` descriptors, and records repository metadata such as stars, forks, license and
//! contributor count.
//!
//! # Quick Start
//!
//! ```bash
//! export GITHUB_TOKEN=ghp_xxxxxxxxxxxxxxxxxxxx
//! inoliblist crawl
//! ```
//!
//! This writes `inoliblist.csv` in the current directory. A full crawl issues many thousands of API requests;
//! without a token GitHub allows only 60 requests per hour and the crawl spends most of its time waiting.
//!
//! # Usage
//!
//! **Write the catalog somewhere else:**
//! ```bash
//! inoliblist crawl --output libraries.tsv
//! ```
//!
//! **Run only some searches, skipping the Library Manager index:**
//! ```bash
//! inoliblist crawl --skip-library-index --search arduino-topic
//! ```
//!
//! **See every request:**
//! ```bash
//! inoliblist crawl --verbose
//! ```
//!
//! # Configuration
//!
//! Endpoints, retry behavior and the search plan are configurable. Without `--config`, the first of
//! `inoliblist.toml`, `inoliblist.yml`, `inoliblist.yaml` and `inoliblist.json` in the current directory is used.
//!
//! ```bash
//! inoliblist init                 # writes the default configuration to inoliblist.toml
//! inoliblist validate -c my.toml  # checks a configuration
//! ```
//!
//! A search runs once per `created` date range because GitHub returns at most 1000 results per search:
//!
//! ```toml
//! [[searches]]
//! name = "esp32-topic"
//! query = "topic:esp32 topic:arduino"
//! created = ["<=2019-12-31", ">=2020-01-01"]
//! fork = "false"
//! verify = true
//! ```
//!
//! With `verify` set, a repository is only cataloged when a library is found at its root and the root doesn't
//! look like a sketch. Without it, a library one folder down is accepted too, and repositories without a
//! recognizable library are still cataloged with an empty library path.

use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use inoliblist::Result;

mod commands;

use crate::commands::{CrawlArgs, InitArgs, ValidateArgs, init_config, process_crawl, validate_config};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "inoliblist", version, about)]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl GitHub and write the library catalog
    Crawl(Box<CrawlArgs>),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    match &Cli::parse().command {
        Command::Crawl(crawl_args) => process_crawl(crawl_args).await,
        Command::Init(init_args) => init_config(init_args),
        Command::Validate(validate_args) => validate_config(validate_args),
    }
}
