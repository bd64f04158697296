/*!
 * lockgen Library
 * Lock-interposition code generation: API shape extraction, wrapper
 * synthesis, and topology-specific hierarchical-lock configuration
 */

pub mod catalog;
pub mod core;
pub mod extract;
pub mod hierarchy;
pub mod synth;

// Re-exports
pub use catalog::{
    display_name, BuildArtifact, CommandBuilder, GenerationReport, LibraryBuilder, LockOutcome,
    LockRegistry, LockSource, Orchestrator, Outcome, OutputLayout, HIERARCHY_LOCK,
    SPINLOCK_INCLUDE_PATH,
};
pub use crate::core::{init_tracing, Architecture, GenError, GenResult, PlatformTopology};
pub use extract::{extract, CallingConvention, LockDescriptor};
pub use hierarchy::{
    generate_hierarchy_lock, GeneratedHierarchy, HierarchyConfig, HierarchyProfile, TopologyLevel,
};
pub use synth::{generate_wrapper, GeneratedWrapper, TemplateFamily, TemplateSet};
