/*!
 * Core Module
 * Shared error types, platform types, and tracing setup
 */

pub mod errors;
pub mod trace;
pub mod types;

// Re-export public API
pub use errors::{GenError, GenResult};
pub use trace::init_tracing;
pub use types::{Architecture, PlatformTopology};
