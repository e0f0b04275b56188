//! # seqgen-core
//!
//! Run configuration resolver for seqgen. Layers a base configuration with
//! named default-selection presets (model, optimizer, schedule, dataset) and
//! CLI `key=value` overrides, expands comma-separated sweep lists into the
//! cartesian product of resolved configurations, and derives a unique run
//! directory per resolved run.

pub mod config;
pub mod error;
pub mod overrides;
pub mod presets;
pub mod resolve;
pub mod rundir;
pub mod sweep;

// Re-export commonly used types at the crate root.
pub use config::{load_base, config_exists, RunConfig, RunMode};
pub use error::{ConfigError, OverrideError, Result, SeqgenError};
pub use overrides::{escape_value, Override, OverrideSet};
pub use presets::Category;
pub use resolve::{Resolver, RunPlan};
pub use rundir::ResolvedRun;
