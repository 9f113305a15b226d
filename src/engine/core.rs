//! Core Corpus struct and constructors

use std::path::Path;

use anyhow::Result;

use crate::data::{CorpusError, CorpusParser, FeatureProvider};
use crate::engine::config::SearchConfig;
use crate::engine::error::SearchError;
use crate::engine::search::Search;
use crate::grid::Grid;
use crate::relations::{RelationContext, RelationTable};
use crate::types::Node;

/// A loaded corpus: the feature provider, its grid and the base relations.
///
/// Immutable after construction, so any number of searches can share it.
pub struct Corpus {
    pub(crate) provider: Box<dyn FeatureProvider>,
    pub(crate) grid: Grid,
    pub(crate) relations: RelationTable,
    pub(crate) config: SearchConfig,
}

impl Corpus {
    /// Build the grid and the base relation table for a provider.
    pub fn new<P: FeatureProvider + 'static>(provider: P) -> Result<Self, CorpusError> {
        Self::from_boxed(Box::new(provider))
    }

    pub fn from_boxed(provider: Box<dyn FeatureProvider>) -> Result<Self, CorpusError> {
        let grid = Grid::new(provider.as_ref())?;
        let relations = RelationTable::base(provider.as_ref());
        log::info!(
            "Corpus ready: {} slots, {} nodes, {} relations",
            grid.max_slot(),
            grid.max_node(),
            relations.len()
        );
        Ok(Self {
            provider,
            grid,
            relations,
            config: SearchConfig::default(),
        })
    }

    /// Load a corpus document (JSON, optionally gzipped).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let provider = CorpusParser::parse_file(path)?;
        Ok(Self::new(provider)?)
    }

    /// Replace the defaults used by searches on this corpus.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &dyn FeatureProvider {
        self.provider.as_ref()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn context(&self) -> RelationContext<'_> {
        RelationContext {
            grid: &self.grid,
            provider: self.provider.as_ref(),
        }
    }

    /// All relations that can be used in templates.
    pub fn legend(&self) -> String {
        self.relations.legend()
    }

    /// Study a template and fetch up to `limit` results (all if `None`).
    pub fn search(&self, template: &str, limit: Option<usize>) -> Result<Vec<Vec<Node>>, SearchError> {
        let mut search = Search::new(self);
        search.study(template, None);
        search.check()?;
        Ok(search.fetch(limit))
    }
}
