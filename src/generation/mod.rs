pub mod clean;
pub mod generator;
pub mod heuristic;
pub mod scoring;
pub mod types;

pub use generator::{evaluate, AttemptReport, MessageGenerator, Outcome, Source, State};
pub use heuristic::heuristic_fallback;
pub use types::{CandidateMessage, ChangeSet, FileChange, StatusCode, ValidationResult};
