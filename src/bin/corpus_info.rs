//! Print the object types of a corpus with their levels and node counts.
//!
//! Usage:
//!   corpus_info --corpus corpus.json.gz
//!   corpus_info --corpus corpus.json --features --json

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use slotweave::data::FeatureProvider;
use slotweave::engine::Corpus;
use slotweave::grid::Level;

#[derive(Parser)]
#[command(name = "corpus_info")]
#[command(about = "Show levels, node counts and features of a corpus")]
struct Args {
    /// Corpus file (JSON, optionally gzipped)
    #[arg(short, long)]
    corpus: PathBuf,

    /// Also list node and edge features
    #[arg(short, long)]
    features: bool,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct LevelInfo<'a> {
    #[serde(flatten)]
    level: &'a Level,
    count: usize,
}

#[derive(Serialize)]
struct CorpusInfo<'a> {
    slot_type: &'a str,
    max_slot: u32,
    max_node: u32,
    levels: Vec<LevelInfo<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    edge_features: Option<Vec<String>>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let corpus = Corpus::from_file(&args.corpus)?;
    let grid = corpus.grid();
    let provider: &dyn FeatureProvider = corpus.provider();

    let info = CorpusInfo {
        slot_type: grid.slot_type(),
        max_slot: grid.max_slot(),
        max_node: grid.max_node(),
        levels: grid
            .levels()
            .iter()
            .map(|level| LevelInfo { level, count: grid.nodes_of_type(&level.otype).len() })
            .collect(),
        node_features: args.features.then(|| provider.node_feature_names()),
        edge_features: args.features.then(|| provider.edge_feature_names()),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Slot type: {} ({} slots, {} nodes)", info.slot_type, info.max_slot, info.max_node);
    println!("{:<20} {:>10} {:>10} {:>10} {:>10}", "type", "avg slots", "count", "first", "last");
    for l in &info.levels {
        println!(
            "{:<20} {:>10.2} {:>10} {:>10} {:>10}",
            l.level.otype, l.level.avg_slots, l.count, l.level.min_node, l.level.max_node
        );
    }
    if let Some(features) = &info.node_features {
        println!("Node features: {}", features.join(", "));
    }
    if let Some(features) = &info.edge_features {
        println!("Edge features: {}", features.join(", "));
    }
    Ok(())
}
