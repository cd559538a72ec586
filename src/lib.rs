pub mod commit;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod generation;
pub mod git;
pub mod model;
pub mod ollama;
pub mod openai;
pub mod profiling;
pub mod prompt;
pub mod readme;
pub mod redact;

// Re-exports
pub use profiling::Profile;
