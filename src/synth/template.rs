/*!
 * Template Engine
 * Strict named-placeholder substitution over the template families
 */

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ahash::RandomState;

use crate::core::{GenError, GenResult};

/// Named values available to one render call
#[derive(Debug, Default)]
pub struct TemplateVars {
    vars: HashMap<String, String, RandomState>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// One template body with `${NAME}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    body: String,
}

impl Template {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Substitute every `${NAME}` placeholder
    ///
    /// Strict: a placeholder with no value (or an unterminated `${`) fails
    /// the render instead of passing through.
    pub fn render(&self, vars: &TemplateVars) -> GenResult<String> {
        let mut out = String::with_capacity(self.body.len());
        let mut rest = self.body.as_str();

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| GenError::UnresolvedPlaceholder {
                template: self.name.clone(),
                placeholder: after.chars().take(24).collect(),
            })?;
            let key = &after[..end];
            let value = vars.get(key).ok_or_else(|| GenError::UnresolvedPlaceholder {
                template: self.name.clone(),
                placeholder: key.to_string(),
            })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// Template file names looked up in a template directory
pub const CONTEXT_FREE_TEMPLATE: &str = "wrapper_plain.c";
pub const CONTEXT_AWARE_TEMPLATE: &str = "wrapper_context.c";
pub const CONTEXT_TRYLOCK_TEMPLATE: &str = "wrapper_context_trylock.c";
pub const HIERARCHY_TEMPLATE: &str = "hierarchy.h";

/// The template families the generator renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSet {
    pub context_free: Template,
    pub context_aware: Template,
    pub context_trylock: Template,
    pub hierarchy: Template,
}

impl TemplateSet {
    /// Templates embedded at compile time from `templates/`
    pub fn builtin() -> Self {
        Self {
            context_free: Template::new(
                CONTEXT_FREE_TEMPLATE,
                include_str!("../../templates/wrapper_plain.c"),
            ),
            context_aware: Template::new(
                CONTEXT_AWARE_TEMPLATE,
                include_str!("../../templates/wrapper_context.c"),
            ),
            context_trylock: Template::new(
                CONTEXT_TRYLOCK_TEMPLATE,
                include_str!("../../templates/wrapper_context_trylock.c"),
            ),
            hierarchy: Template::new(
                HIERARCHY_TEMPLATE,
                include_str!("../../templates/hierarchy.h"),
            ),
        }
    }

    /// Load the four template files from a caller-supplied directory
    pub fn load(dir: &Path) -> GenResult<Self> {
        let read = |file: &str| -> GenResult<Template> {
            let path = dir.join(file);
            let body = fs::read_to_string(&path).map_err(|e| GenError::io(&path, e))?;
            Ok(Template::new(file, body))
        };
        Ok(Self {
            context_free: read(CONTEXT_FREE_TEMPLATE)?,
            context_aware: read(CONTEXT_AWARE_TEMPLATE)?,
            context_trylock: read(CONTEXT_TRYLOCK_TEMPLATE)?,
            hierarchy: read(HIERARCHY_TEMPLATE)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let t = Template::new("t", "lock ${LOCK} uses ${TYPE}, again: ${LOCK}");
        let mut vars = TemplateVars::new();
        vars.set("LOCK", "mcslock").set("TYPE", "mcs_node_t");
        assert_eq!(
            t.render(&vars).unwrap(),
            "lock mcslock uses mcs_node_t, again: mcslock"
        );
    }

    #[test]
    fn test_render_fails_on_unset_placeholder() {
        let t = Template::new("t", "${MISSING}");
        let err = t.render(&TemplateVars::new()).unwrap_err();
        assert_eq!(
            err,
            GenError::UnresolvedPlaceholder {
                template: "t".into(),
                placeholder: "MISSING".into(),
            }
        );
    }

    #[test]
    fn test_render_fails_on_unterminated_placeholder() {
        let t = Template::new("t", "before ${OOPS");
        assert!(t.render(&TemplateVars::new()).is_err());
    }

    #[test]
    fn test_builtin_set_loads() {
        let set = TemplateSet::builtin();
        assert_eq!(set.context_free.name(), CONTEXT_FREE_TEMPLATE);
        assert_eq!(set.hierarchy.name(), HIERARCHY_TEMPLATE);
    }
}
