/*!
 * Synth Module
 * Wrapper source synthesis from descriptors and template families
 */

pub mod template;
pub mod wrapper;

// Re-export public API
pub use template::{Template, TemplateSet, TemplateVars};
pub use wrapper::{generate_wrapper, GeneratedWrapper, TemplateFamily};
