use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use slotweave::engine::{Corpus, Search, SearchConfig};
use slotweave::results::SearchResults;

#[derive(Parser, Debug)]
#[command(name = "slotweave")]
#[command(about = "Search a slot-anchored corpus with a structural template")]
#[command(version)]
struct Args {
    /// Corpus file (JSON, optionally gzipped)
    #[arg(short, long)]
    corpus: PathBuf,

    /// File containing the search template
    #[arg(short, long, conflicts_with = "query")]
    template: Option<PathBuf>,

    /// Search template given inline
    #[arg(short, long)]
    query: Option<String>,

    /// Stitching strategy (small_choice_first, big_choice_first, spread_1_first)
    #[arg(short, long)]
    strategy: Option<String>,

    /// Maximum number of results to show
    #[arg(short, long)]
    limit: Option<usize>,

    /// Only count the results
    #[arg(long)]
    count: bool,

    /// Print the stitch plan before the results
    #[arg(long)]
    plan: bool,

    /// Print the relation legend and exit
    #[arg(long)]
    legend: bool,

    /// Search configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

fn read_template(args: &Args) -> Result<String> {
    match (&args.template, &args.query) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read template file {}", path.display())),
        (None, Some(query)) => Ok(query.clone()),
        (None, None) => Err(anyhow!("Give a template with --template <file> or --query <text>")),
    }
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SearchConfig::from_yaml(path)?,
        None => SearchConfig::new(),
    };
    let limit = args.limit.unwrap_or(config.limit);
    let progress = config.progress;

    log::info!("Loading corpus from {}", args.corpus.display());
    let corpus = Corpus::from_file(&args.corpus)?.with_config(config);

    if args.legend {
        print!("{}", corpus.legend());
        return Ok(());
    }

    let template = read_template(&args)?;
    let mut search = Search::new(&corpus);
    let problems = search.study(&template, args.strategy.as_deref());
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("{}", problem);
        }
        return Err(anyhow!("Search template cannot be executed ({} problem(s))", problems.len()));
    }

    if args.plan {
        print!("{}", search.show_plan(true));
    }

    if args.count {
        let total = search.count(Some(progress), Some(limit));
        println!("{} result(s)", total);
        return Ok(());
    }

    let results = SearchResults::collect(&search, &template, Some(limit));
    if args.json {
        println!("{}", results.to_json_pretty());
    } else {
        print!("{}", results.to_formatted_string(&corpus));
    }
    Ok(())
}
