mod common;
mod crawl;
mod init;
mod validate;

pub use crawl::{CrawlArgs, process_crawl};
pub use init::{InitArgs, init_config};
pub use validate::{ValidateArgs, validate_config};
