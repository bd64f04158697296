/*!
 * Wrapper Synthesis
 * Renders interposition wrapper sources from lock descriptors
 */

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use serde::Serialize;
use tracing::info;

use super::template::{Template, TemplateSet, TemplateVars};
use crate::core::{GenError, GenResult};
use crate::extract::{CallingConvention, LockDescriptor};

/// Wrapper template family, selected solely by calling convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFamily {
    ContextFree,
    ContextAware,
}

impl TemplateFamily {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ContextFree => "context-free",
            Self::ContextAware => "context-aware",
        }
    }
}

/// A generated wrapper source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedWrapper {
    pub path: PathBuf,
    pub family: TemplateFamily,
}

/// Context-free wrapper fields; every field is required by the template
#[derive(Debug)]
struct PlainWrapper {
    lock: String,
    include_path: String,
    tryacquire: String,
    destroy: String,
}

impl PlainWrapper {
    fn render(&self, template: &Template) -> GenResult<String> {
        let mut vars = TemplateVars::new();
        vars.set("LOCK", &self.lock)
            .set("SPINLOCK_INCLUDE_PATH", &self.include_path)
            .set("TRYACQUIRE_IMPLEMENTATION", &self.tryacquire)
            .set("DESTROY_IMPLEMENTATION", &self.destroy);
        template.render(&vars)
    }
}

/// Context-aware wrapper fields; every field is required by the template
#[derive(Debug)]
struct ContextWrapper {
    lock: String,
    include_path: String,
    context_type: String,
    tryacquire: String,
    node_init: String,
    destroy: String,
}

impl ContextWrapper {
    fn render(&self, template: &Template) -> GenResult<String> {
        let mut vars = TemplateVars::new();
        vars.set("LOCK", &self.lock)
            .set("SPINLOCK_INCLUDE_PATH", &self.include_path)
            .set("CONTEXT_TYPE", &self.context_type)
            .set("TRYACQUIRE_IMPLEMENTATION", &self.tryacquire)
            .set("NODE_INIT", &self.node_init)
            .set("DESTROY_IMPLEMENTATION", &self.destroy);
        template.render(&vars)
    }
}

/// Try-operation body for a lock without try-acquire: fail at first use
///
/// Generation never fails over a missing optional capability; the gap is
/// encoded as a runtime trap instead.
fn tryacquire_stub(lock: &str) -> String {
    format!(
        "    (void) m;\n    fprintf(stderr, \"tryacquire not implemented for {lock}\\n\");\n    exit(EXIT_FAILURE);"
    )
}

fn destroy_impl(descriptor: &LockDescriptor, indent: usize) -> String {
    let pad = " ".repeat(indent);
    if descriptor.supports_destroy {
        format!("{pad}{}_destroy(&m->lock);", descriptor.name)
    } else {
        // No-op teardown still references the handle to silence warnings
        format!("{pad}(void) m;")
    }
}

/// Generate one wrapper source exposing the four-operation interposition ABI
///
/// Writes `<output_dir>/<name>.c`, replacing any previous file at that path.
/// Returns the generated path and the family that was chosen.
pub fn generate_wrapper(
    templates: &TemplateSet,
    descriptor: &LockDescriptor,
    include_path: &str,
    output_dir: &Path,
) -> GenResult<GeneratedWrapper> {
    let output_dir = output_dir.to_path_buf().clean();
    fs::create_dir_all(&output_dir).map_err(|e| GenError::io(&output_dir, e))?;
    let output_file = output_dir.join(format!("{}.c", descriptor.name));

    let (family, content) = match &descriptor.convention {
        CallingConvention::ContextFree => {
            let tryacquire = if descriptor.supports_try_acquire {
                format!("    return {}_tryacquire(&m->lock);", descriptor.name)
            } else {
                tryacquire_stub(&descriptor.name)
            };
            let content = PlainWrapper {
                lock: descriptor.name.clone(),
                include_path: include_path.to_string(),
                tryacquire,
                destroy: destroy_impl(descriptor, 4),
            }
            .render(&templates.context_free)?;
            (TemplateFamily::ContextFree, content)
        }
        CallingConvention::ContextAware { context_type } => {
            let tryacquire = if descriptor.supports_try_acquire {
                let mut vars = TemplateVars::new();
                vars.set("LOCK", &descriptor.name)
                    .set("CONTEXT_TYPE", context_type);
                templates
                    .context_trylock
                    .render(&vars)?
                    .trim_end()
                    .to_string()
            } else {
                tryacquire_stub(&descriptor.name)
            };
            let node_init = if descriptor.requires_context_init {
                format!("\n    {}_node_init(node);", descriptor.name)
            } else {
                String::new()
            };
            let content = ContextWrapper {
                lock: descriptor.name.clone(),
                include_path: include_path.to_string(),
                context_type: context_type.clone(),
                tryacquire,
                node_init,
                destroy: destroy_impl(descriptor, 8),
            }
            .render(&templates.context_aware)?;
            (TemplateFamily::ContextAware, content)
        }
    };

    fs::write(&output_file, content).map_err(|e| GenError::io(&output_file, e))?;
    info!(
        lock = %descriptor.name,
        family = family.as_str(),
        path = %output_file.display(),
        "generated wrapper"
    );

    Ok(GeneratedWrapper {
        path: output_file,
        family,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_descriptor(try_acquire: bool, destroy: bool) -> LockDescriptor {
        LockDescriptor {
            name: "ttaslock".into(),
            convention: CallingConvention::ContextFree,
            supports_try_acquire: try_acquire,
            requires_context_init: false,
            supports_destroy: destroy,
        }
    }

    #[test]
    fn test_plain_wrapper_content() {
        let dir = tempfile::tempdir().unwrap();
        let generated = generate_wrapper(
            &TemplateSet::builtin(),
            &plain_descriptor(true, true),
            "vsync/spinlock",
            dir.path(),
        )
        .unwrap();

        assert_eq!(generated.family, TemplateFamily::ContextFree);
        let content = fs::read_to_string(&generated.path).unwrap();
        assert!(content.contains("#include <vsync/spinlock/ttaslock.h>"));
        assert!(content.contains("return ttaslock_tryacquire(&m->lock);"));
        assert!(content.contains("ttaslock_destroy(&m->lock);"));
        assert!(!content.contains("${"));
    }

    #[test]
    fn test_missing_tryacquire_emits_fail_fast_stub() {
        let dir = tempfile::tempdir().unwrap();
        let generated = generate_wrapper(
            &TemplateSet::builtin(),
            &plain_descriptor(false, false),
            "vsync/spinlock",
            dir.path(),
        )
        .unwrap();

        let content = fs::read_to_string(&generated.path).unwrap();
        assert!(content.contains("tryacquire not implemented for ttaslock"));
        assert!(content.contains("exit(EXIT_FAILURE);"));
        // No-op destroy still silences the unused handle
        assert!(content.contains("(void) m;"));
    }

    #[test]
    fn test_context_wrapper_content() {
        let descriptor = LockDescriptor {
            name: "mcslock".into(),
            convention: CallingConvention::ContextAware {
                context_type: "mcs_node_t".into(),
            },
            supports_try_acquire: true,
            requires_context_init: true,
            supports_destroy: false,
        };
        let dir = tempfile::tempdir().unwrap();
        let generated = generate_wrapper(
            &TemplateSet::builtin(),
            &descriptor,
            "vsync/spinlock",
            dir.path(),
        )
        .unwrap();

        assert_eq!(generated.family, TemplateFamily::ContextAware);
        let content = fs::read_to_string(&generated.path).unwrap();
        assert!(content.contains("static __thread mcs_node_t tls_nodes"));
        assert!(content.contains("mcslock_node_init(node);"));
        assert!(content.contains("mcslock_tryacquire(&m->lock, node)"));
        assert!(content.contains("mcslock_acquire(&m->lock, node);"));
    }
}
