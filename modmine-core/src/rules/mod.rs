// Rule table module - compiled per-field pattern lists
// - matcher.rs: one compiled pattern with its capture semantics
// - block.rs: pluggable end-of-block heuristics for multi-line fields
// - table.rs: RuleTable built once from MinerConfig

pub mod block;
pub mod matcher;
pub mod table;

pub use block::{BlankLine, BlockTerminator, NextLabelLine};
pub use matcher::{compile_pattern, Matcher};
pub use table::{FieldRule, RuleTable};
