//! Default parameters shared by the engine and the binaries

pub const DEFAULT_YARN_RATIO: f64 = 1.25;
pub const DEFAULT_TRY_LIMIT_FROM: usize = 10;
pub const DEFAULT_TRY_LIMIT_TO: usize = 10;
pub const DEFAULT_SPIN_LIMIT: usize = 1_000_000;
pub const DEFAULT_SEED: u64 = 1_776;

/// Progress is logged every this many results while counting.
pub const DEFAULT_PROGRESS: usize = 100;
/// Results counted or fetched when no limit is given.
pub const DEFAULT_LIMIT: usize = 1000;

