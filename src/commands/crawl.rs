use super::common::{LogLevel, init_logging, print_warnings};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use inoliblist::Result;
use inoliblist::catalog::Crawler;
use inoliblist::config::{Config, SearchSpec};
use inoliblist::reports::generate_tsv;
use ohno::{IntoAppError, bail};
use std::fs::File;
use std::io::BufWriter;

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN")]
    pub github_token: Option<String>,

    /// Path to configuration file [default: one of inoliblist.[toml|yml|yaml|json] ]
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Where to write the catalog
    #[arg(long, short = 'o', value_name = "PATH", default_value = "inoliblist.csv")]
    pub output: Utf8PathBuf,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Shorthand for --log-level debug
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Don't catalog the repositories listed in the Library Manager index
    #[arg(long)]
    pub skip_library_index: bool,

    /// Only run the named searches of the search plan
    #[arg(long = "search", value_name = "NAME")]
    pub searches: Vec<String>,
}

pub async fn process_crawl(args: &CrawlArgs) -> Result<()> {
    init_logging(if args.verbose { LogLevel::Debug } else { args.log_level });

    let (config, warnings) = Config::load(Utf8Path::new("."), args.config.as_deref())?;
    print_warnings(&warnings);

    let searches = select_searches(&config.searches, &args.searches)?;
    let include_library_index = config.include_library_index && !args.skip_library_index;

    // Fail on a bad output path before crawling
    let file = File::create(&args.output).into_app_err_with(|| format!("creating output file {}", args.output))?;

    let mut crawler = Crawler::new(&config, args.github_token.as_deref())?;
    crawler.run(include_library_index, &searches).await?;

    let records = crawler.into_catalog().into_sorted();
    generate_tsv(&records, BufWriter::new(file))?;

    println!("Wrote {} repositories to {}", records.len(), args.output);
    Ok(())
}

fn select_searches(plan: &[SearchSpec], names: &[String]) -> Result<Vec<SearchSpec>> {
    if names.is_empty() {
        return Ok(plan.to_vec());
    }

    for name in names {
        if !plan.iter().any(|s| &s.name == name) {
            bail!("the search plan has no search named '{name}'");
        }
    }

    Ok(plan.iter().filter(|s| names.contains(&s.name)).cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_by_default() {
        let plan = Config::default().searches;
        assert_eq!(select_searches(&plan, &[]).unwrap(), plan);
    }

    #[test]
    fn test_select_named_keeps_plan_order() {
        let plan = Config::default().searches;
        let names = [plan[2].name.clone(), plan[0].name.clone()];

        let selected = select_searches(&plan, &names).unwrap();
        assert_eq!(selected, [plan[0].clone(), plan[2].clone()]);
    }

    #[test]
    fn test_select_unknown_name() {
        let plan = Config::default().searches;
        let _ = select_searches(&plan, &["nope".to_string()]).unwrap_err();
    }
}
