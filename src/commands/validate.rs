use super::common::print_warnings;
use camino::Utf8PathBuf;
use clap::Parser;
use inoliblist::Result;
use inoliblist::config::Config;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file [default: one of inoliblist.[toml|yml|yaml|json] ]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

#[expect(clippy::unnecessary_wraps, reason = "Consistent interface with other subcommands")]
pub fn validate_config(args: &ValidateArgs) -> Result<()> {
    let dir = Utf8PathBuf::from(".");
    let config_path = args.config.as_deref();

    match Config::load(&dir, config_path) {
        Ok((config, warnings)) => {
            println!("Configuration validation successful");
            if let Some(path) = config_path {
                println!("Config file: {path}");
            }

            let ranges: usize = config.searches.iter().map(|s| s.created.len().max(1)).sum();
            println!("Search plan: {} searches, {ranges} date ranges", config.searches.len());

            print_warnings(&warnings);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            std::process::exit(1);
        }
    }
}
