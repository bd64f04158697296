/*!
 * Generation Orchestrator
 * Batch wrapper generation with per-lock failure isolation
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use tracing::{info, warn};

use super::registry::{display_name, LockRegistry, LockSource};
use crate::core::{GenError, GenResult, PlatformTopology};
use crate::extract;
use crate::hierarchy::generate_hierarchy_lock;
use crate::synth::{generate_wrapper, GeneratedWrapper, TemplateFamily, TemplateSet};

/// Default identifier of the platform-specific hierarchical lock
pub const HIERARCHY_LOCK: &str = "numa_hmcslock";

/// Default include prefix for flat spinlock headers
pub const SPINLOCK_INCLUDE_PATH: &str = "vsync/spinlock";

/// Handle to the artifact produced by the external build step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
    pub library_path: PathBuf,
}

/// External build seam
///
/// Compiles a directory of generated sources into the combined interposition
/// library; compilation itself is outside this crate.
pub trait LibraryBuilder {
    fn build(&self, source_dir: &Path) -> GenResult<BuildArtifact>;
}

/// Runs a caller-configured external command with the source directory
/// appended as its final argument
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    program: String,
    args: Vec<String>,
    /// Where the external step leaves the combined library
    artifact: PathBuf,
}

impl CommandBuilder {
    pub fn new(program: impl Into<String>, args: Vec<String>, artifact: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            artifact: artifact.into(),
        }
    }
}

impl LibraryBuilder for CommandBuilder {
    fn build(&self, source_dir: &Path) -> GenResult<BuildArtifact> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(source_dir)
            .status()
            .map_err(|e| GenError::BuildFailed(format!("{}: {}", self.program, e)))?;
        if !status.success() {
            return Err(GenError::BuildFailed(format!(
                "{} exited with {}",
                self.program, status
            )));
        }
        Ok(BuildArtifact {
            library_path: self.artifact.clone(),
        })
    }
}

/// Per-lock generation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Generated { family: TemplateFamily, path: PathBuf },
    Failed { reason: String },
}

/// One entry of the batch report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockOutcome {
    pub name: String,
    pub outcome: Outcome,
}

impl LockOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, Outcome::Generated { .. })
    }
}

/// Structured result of one batch generation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub outcomes: Vec<LockOutcome>,
    pub artifact: Option<BuildArtifact>,
    hierarchy_failed: bool,
}

impl GenerationReport {
    /// True when an unrecoverable (non-per-lock) condition occurred, such as
    /// the hierarchy step failing before any flat lock was attempted
    pub fn hard_failure(&self) -> bool {
        self.hierarchy_failed
    }

    pub fn generated(&self) -> impl Iterator<Item = &LockOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &LockOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

/// Output locations for one generation run
#[derive(Debug, Clone)]
pub struct OutputLayout {
    /// Generated wrapper sources
    pub src_dir: PathBuf,
    /// Generated configuration headers
    pub include_dir: PathBuf,
}

/// Batch generation driver
///
/// Generates the platform-specific hierarchical lock, then wrappers for
/// every requested lock the registries know. Each per-lock failure is caught
/// here, logged with the lock's name, and recorded; sibling locks always
/// proceed.
pub struct Orchestrator {
    registry: LockRegistry,
    templates: TemplateSet,
    layout: OutputLayout,
    hierarchy_lock: String,
    spinlock_include_path: String,
    builder: Option<Box<dyn LibraryBuilder>>,
}

impl Orchestrator {
    pub fn new(registry: LockRegistry, templates: TemplateSet, layout: OutputLayout) -> Self {
        Self {
            registry,
            templates,
            layout,
            hierarchy_lock: HIERARCHY_LOCK.to_string(),
            spinlock_include_path: SPINLOCK_INCLUDE_PATH.to_string(),
            builder: None,
        }
    }

    /// Attach the external build step invoked after generation
    pub fn with_builder(mut self, builder: Box<dyn LibraryBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn with_hierarchy_lock(mut self, name: impl Into<String>) -> Self {
        self.hierarchy_lock = name.into();
        self
    }

    pub fn with_spinlock_include_path(mut self, path: impl Into<String>) -> Self {
        self.spinlock_include_path = path.into();
        self
    }

    /// Generate wrappers for `requested` locks (`None` = everything known)
    ///
    /// Unknown requested names are dropped from the working set without a
    /// diagnostic; the batch generates what is known and available.
    pub fn generate(
        &self,
        topology: &PlatformTopology,
        requested: Option<&[String]>,
    ) -> GenResult<GenerationReport> {
        let mut registry = self.registry.clone();
        let mut outcomes = Vec::new();
        let mut hierarchy_failed = false;

        let wanted = |name: &str| requested.map_or(true, |req| req.iter().any(|r| r == name));

        // Hierarchical lock configuration for this platform; on success it
        // becomes an ordinary auxiliary lock for the wrapper passes below.
        if wanted(&self.hierarchy_lock) {
            match generate_hierarchy_lock(
                &self.templates,
                topology,
                &self.hierarchy_lock,
                &self.layout.include_dir,
                &self.spinlock_include_path,
            ) {
                Ok(generated) => {
                    let include_path = self.layout.include_dir.display().to_string();
                    registry.register_auxiliary(
                        generated.lock_name,
                        LockSource::new(&self.layout.include_dir, include_path),
                    );
                }
                Err(err) => {
                    hierarchy_failed = true;
                    warn!(lock = %self.hierarchy_lock, error = %err, "hierarchy generation failed");
                    outcomes.push(LockOutcome {
                        name: self.hierarchy_lock.clone(),
                        outcome: Outcome::Failed {
                            reason: err.to_string(),
                        },
                    });
                }
            }
        }

        // Flat locks
        for name in registry.flat_names() {
            if !wanted(&name) {
                continue;
            }
            // Sorted names come from the registry keys, so resolution cannot miss
            if let Some(source) = registry.resolve_flat(&name) {
                outcomes.push(self.generate_one(&name, source));
            }
        }

        // Auxiliary locks, including the hierarchy lock registered above
        for name in registry.auxiliary_names() {
            if !wanted(&name) {
                continue;
            }
            if let Some(source) = registry.resolve_auxiliary(&name) {
                outcomes.push(self.generate_one(&name, source));
            }
        }

        // External build step
        let artifact = match &self.builder {
            Some(builder) => Some(builder.build(&self.layout.src_dir)?),
            None => None,
        };

        info!(
            generated = outcomes.iter().filter(|o| o.succeeded()).count(),
            failed = outcomes.iter().filter(|o| !o.succeeded()).count(),
            "generation batch complete"
        );

        Ok(GenerationReport {
            outcomes,
            artifact,
            hierarchy_failed,
        })
    }

    fn generate_one(&self, name: &str, source: &LockSource) -> LockOutcome {
        match self.try_generate(name, source) {
            Ok(generated) => LockOutcome {
                name: name.to_string(),
                outcome: Outcome::Generated {
                    family: generated.family,
                    path: generated.path,
                },
            },
            Err(err) => {
                warn!(
                    lock = %name,
                    label = display_name(name),
                    error = %err,
                    "wrapper generation failed"
                );
                LockOutcome {
                    name: name.to_string(),
                    outcome: Outcome::Failed {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    fn try_generate(&self, name: &str, source: &LockSource) -> GenResult<GeneratedWrapper> {
        let header_path = source.header_path(name);
        if !header_path.is_file() {
            return Err(GenError::MissingHeaderFile {
                lock: name.to_string(),
                path: header_path,
            });
        }
        let text = fs::read_to_string(&header_path).map_err(|e| GenError::io(&header_path, e))?;
        let descriptor = extract::extract(name, &text)?;
        generate_wrapper(
            &self.templates,
            &descriptor,
            &source.include_path,
            &self.layout.src_dir,
        )
    }
}
