//! The Search struct: study a template, then deliver its results

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::compiler::{compile, QueryGraph, SemanticEnv};
use crate::engine::config::{PerfParams, SearchConfig, Strategy};
use crate::engine::constants::{DEFAULT_LIMIT, DEFAULT_PROGRESS};
use crate::engine::core::Corpus;
use crate::engine::error::{Diagnostic, DiagnosticKind, SearchError};
use crate::engine::plan::{self, StitchPlan};
use crate::engine::stitch::ResultIter;
use crate::relations::RelationTable;
use crate::types::{Node, NodeSet};

/// Settings of a single search.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Named node sets usable as atom types.
    pub sets: Option<BTreeMap<String, NodeSet>>,
    /// Added to every reported line number.
    pub offset: usize,
    pub perf: PerfParams,
    /// Used when `study` is not given a strategy.
    pub strategy: Strategy,
}

impl SearchOptions {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            sets: None,
            offset: 0,
            perf: config.perf.clone(),
            strategy: config.strategy,
        }
    }
}

/// A template studied against a corpus.
///
/// `study` compiles the template, computes the yarns and a stitch plan;
/// afterwards the results can be fetched any number of times.
pub struct Search<'c> {
    pub(crate) corpus: &'c Corpus,
    pub(crate) options: SearchOptions,
    pub(crate) template: String,
    pub(crate) relations: RelationTable,
    pub(crate) graph: QueryGraph,
    pub(crate) yarns: Vec<NodeSet>,
    pub(crate) spreads: Vec<f64>,
    pub(crate) spreads_converse: Vec<f64>,
    pub(crate) thinned: BTreeSet<usize>,
    pub(crate) strategy: Strategy,
    pub(crate) plan: Option<StitchPlan>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) rng: StdRng,
    pub(crate) studied: bool,
}

impl<'c> Search<'c> {
    pub fn new(corpus: &'c Corpus) -> Self {
        Self::with_options(corpus, SearchOptions::from_config(corpus.config()))
    }

    pub fn with_options(corpus: &'c Corpus, options: SearchOptions) -> Self {
        let rng = StdRng::seed_from_u64(options.perf.seed);
        let strategy = options.strategy;
        Self {
            corpus,
            options,
            template: String::new(),
            relations: corpus.relations().clone(),
            graph: QueryGraph::default(),
            yarns: Vec::new(),
            spreads: Vec::new(),
            spreads_converse: Vec::new(),
            thinned: BTreeSet::new(),
            strategy,
            plan: None,
            diagnostics: Vec::new(),
            rng,
            studied: false,
        }
    }

    fn reset(&mut self, template: &str) {
        self.template = template.to_string();
        self.relations = self.corpus.relations().clone();
        self.graph = QueryGraph::default();
        self.yarns.clear();
        self.spreads.clear();
        self.spreads_converse.clear();
        self.thinned.clear();
        self.plan = None;
        self.diagnostics.clear();
        self.rng = StdRng::seed_from_u64(self.options.perf.seed);
        self.studied = true;
    }

    fn fail(&mut self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        for d in &diagnostics {
            log::info!("{}", d);
        }
        self.diagnostics = diagnostics;
        self.diagnostics.clone()
    }

    /// Prepare a template for result delivery. Returns every problem found;
    /// an empty list means the search can be executed.
    ///
    /// `strategy` names one of the stitching strategies; `None` takes the
    /// strategy of the search options.
    pub fn study(&mut self, template: &str, strategy: Option<&str>) -> Vec<Diagnostic> {
        self.reset(template);

        self.strategy = match strategy {
            None => self.options.strategy,
            Some(name) => match name.parse::<Strategy>() {
                Ok(strategy) => strategy,
                Err(message) => return self.fail(vec![Diagnostic::new(DiagnosticKind::Strategy, None, message)]),
            },
        };

        log::info!("Checking search template ...");
        let corpus = self.corpus;
        let env = SemanticEnv {
            grid: corpus.grid(),
            provider: corpus.provider(),
            sets: self.options.sets.as_ref(),
        };
        let graph = match compile(template, self.options.offset, &env, &mut self.relations) {
            Ok(graph) => graph,
            Err(problems) => return self.fail(problems),
        };
        let problems = plan::connectivity(&graph, self.options.offset);
        if !problems.is_empty() {
            return self.fail(problems);
        }
        self.graph = graph;

        log::info!("Setting up search space for {} objects ...", self.graph.len());
        if let Err(problems) = self.spin_atoms() {
            return self.fail(problems);
        }
        log::info!("Constraining search space with {} relations ...", self.graph.edges.len());
        self.spin_edges();
        log::info!("{} edges thinned", self.thinned.len());

        log::info!("Setting up retrieval plan with strategy {} ...", self.strategy);
        self.estimate_spreads();
        let plan = plan::stitch_plan(self.strategy, &self.graph, &self.yarns, &self.spreads, &self.spreads_converse);
        let problems = plan::consistency(&plan, &self.graph);
        if !problems.is_empty() {
            return self.fail(problems);
        }
        self.plan = Some(plan);

        let yarn_content: usize = self.yarns.iter().map(NodeSet::len).sum();
        log::info!("Ready to deliver results from {} nodes", yarn_content);
        Vec::new()
    }

    /// Whether a studied template can deliver results.
    pub fn check(&self) -> Result<(), SearchError> {
        if !self.studied {
            return Err(SearchError::NotStudied);
        }
        if !self.diagnostics.is_empty() {
            return Err(SearchError::NotExecutable(self.diagnostics.clone()));
        }
        if self.plan.is_none() {
            return Err(SearchError::NotStudied);
        }
        Ok(())
    }

    pub fn is_executable(&self) -> bool {
        self.check().is_ok()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Strategy used by the last study.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn graph(&self) -> &QueryGraph {
        &self.graph
    }

    /// Yarns per atom after spinning, in template order.
    pub fn yarns(&self) -> &[NodeSet] {
        &self.yarns
    }

    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    pub fn plan(&self) -> Option<&StitchPlan> {
        self.plan.as_ref()
    }

    /// Lazily enumerate result tuples in template order. Empty when the
    /// template could not be studied.
    pub fn results(&self) -> ResultIter<'_> {
        ResultIter::new(self)
    }

    /// Up to `limit` results, all of them for `None`.
    pub fn fetch(&self, limit: Option<usize>) -> Vec<Vec<Node>> {
        let results = self.results();
        match limit {
            Some(limit) => results.take(limit).collect(),
            None => results.collect(),
        }
    }

    /// Distinct projections of the results on their first `n` members.
    pub fn shallow(&self, n: usize) -> BTreeSet<Vec<Node>> {
        let n = n.max(1);
        self.results()
            .map(|mut tuple| {
                tuple.truncate(n);
                tuple
            })
            .collect()
    }

    /// Count results, logging every `progress` results, stopping at `limit`
    /// (0 counts to the end).
    pub fn count(&self, progress: Option<usize>, limit: Option<usize>) -> usize {
        if let Err(e) = self.check() {
            log::error!("This search has problems. No results to count.\n{}", e);
            return 0;
        }
        let progress = progress.unwrap_or(DEFAULT_PROGRESS).max(1);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit > 0 {
            log::info!("Counting results per {} up to {} ...", progress, limit);
        } else {
            log::info!("Counting results per {} up to the end of the results ...", progress);
        }

        let mut counted = 0;
        for _ in self.results() {
            counted += 1;
            if counted % progress == 0 {
                log::info!("{}", counted);
            }
            if limit > 0 && counted >= limit {
                break;
            }
        }
        log::info!("Done: {} results", counted);
        counted
    }
}
