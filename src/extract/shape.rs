/*!
 * API Shape Extraction
 * Maps a lock's declaration surface onto a structured descriptor
 */

use serde::Serialize;

use super::scanner::scan_declarations;
use crate::core::{GenError, GenResult};

/// How a lock's acquire/release operations are called
///
/// Modeled as an enum so a context type can only exist on a context-aware
/// lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "convention", rename_all = "snake_case")]
pub enum CallingConvention {
    /// `acquire` takes the lock object alone
    ContextFree,
    /// `acquire` takes a per-thread context node as second argument
    ContextAware { context_type: String },
}

/// Identity and API shape of one lock implementation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockDescriptor {
    /// Registry key and generated-file stem; stable across generation runs
    pub name: String,
    pub convention: CallingConvention,
    pub supports_try_acquire: bool,
    pub requires_context_init: bool,
    pub supports_destroy: bool,
}

impl LockDescriptor {
    pub fn context_required(&self) -> bool {
        matches!(self.convention, CallingConvention::ContextAware { .. })
    }

    pub fn context_type(&self) -> Option<&str> {
        match &self.convention {
            CallingConvention::ContextFree => None,
            CallingConvention::ContextAware { context_type } => Some(context_type),
        }
    }
}

/// Extract the API shape of one lock from its declaration text
///
/// Fails with `MissingAcquireSignature` when no `*_acquire` declaration is
/// found; missing optional operations (`*_tryacquire`, `*_node_init`,
/// `*_destroy`) are capability gaps handled by the synthesizer, not errors.
pub fn extract(name: &str, header_text: &str) -> GenResult<LockDescriptor> {
    let decls = scan_declarations(header_text);

    let acquire = decls
        .iter()
        .find(|d| d.name.ends_with("_acquire"))
        .ok_or_else(|| GenError::MissingAcquireSignature(name.to_string()))?;

    let convention = if acquire.params.len() <= 1 {
        CallingConvention::ContextFree
    } else {
        CallingConvention::ContextAware {
            context_type: context_type_of(&acquire.params[1]),
        }
    };

    let has = |suffix: &str| decls.iter().any(|d| d.name.ends_with(suffix));

    Ok(LockDescriptor {
        name: name.to_string(),
        convention,
        supports_try_acquire: has("_tryacquire"),
        requires_context_init: has("_node_init"),
        supports_destroy: has("_destroy"),
    })
}

/// Type-name qualifiers stripped before reading the context type
const TYPE_QUALIFIERS: &[&str] = &["const", "volatile"];

/// Tag keywords joined with their following identifier
const TAG_KEYWORDS: &[&str] = &["struct", "union", "enum"];

/// Read the type name from a parameter's token sequence
///
/// Leading cv-qualifiers are stripped and tagged types keep their keyword
/// (`struct foo *n` reads as `struct foo`); otherwise the first token is
/// taken verbatim. Pointer and name tokens after the type are ignored, so
/// the result is imprecise for exotic declarators but stays compilable for
/// the narrow API surfaces under analysis.
fn context_type_of(param: &[String]) -> String {
    let mut tokens = param
        .iter()
        .skip_while(|t| TYPE_QUALIFIERS.contains(&t.as_str()));

    match tokens.next() {
        Some(first) if TAG_KEYWORDS.contains(&first.as_str()) => match tokens.next() {
            Some(tag) => format!("{first} {tag}"),
            None => first.clone(),
        },
        Some(first) => first.clone(),
        // All tokens were qualifiers; fall back to the raw first token
        None => param.first().cloned().unwrap_or_default(),
    }
}
