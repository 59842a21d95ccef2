// modmine Core Library
//
// Mines module descriptions out of the text of university module handbooks.
// Boundary detection proposes where records start, field extraction resolves
// each record's fields with ordered fallback patterns.

pub mod cache;
pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod processor;
pub mod rules;
pub mod serialization;
pub mod sources;
pub mod storage;
pub mod types;

// Re-export main types and functions for easy use
pub use config::MinerConfig;
pub use engine::MiningEngine;
pub use error::{MinerError, MinerResult};
pub use processor::{ModuleMiner, PipelineStages, ProcessOptions};
pub use sources::{SourceRegistry, TextSource};
pub use types::*;
