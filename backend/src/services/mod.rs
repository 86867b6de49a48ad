//! Generation services
//!
//! Prompt composition, response parsing, provider orchestration, the
//! rule-based fallback and nutrition targets. Everything except the
//! orchestrator is pure.

pub mod fallback;
pub mod normalize;
pub mod nutrition;
pub mod orchestrator;
pub mod parser;
pub mod prompt;

pub use orchestrator::{GenerationOutcome, Orchestrator, OrchestratorState, ProviderAttempt};
pub use parser::{ParseError, Strategy};
