/*!
 * Catalog Module
 * Lock registries and the batch generation orchestrator
 */

pub mod orchestrator;
pub mod registry;

// Re-export public API
pub use orchestrator::{
    BuildArtifact, CommandBuilder, GenerationReport, LibraryBuilder, LockOutcome, Orchestrator,
    Outcome, OutputLayout, HIERARCHY_LOCK, SPINLOCK_INCLUDE_PATH,
};
pub use registry::{display_name, LockRegistry, LockSource};
