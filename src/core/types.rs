/*!
 * Platform Types
 * Machine topology description supplied by external platform detection
 */

use serde::{Deserialize, Serialize};

/// Instruction-set families with a known hierarchy parameter set
///
/// The topology input carries a free-form tag so an unknown architecture
/// only fails hierarchy generation, never the whole batch; this enum is the
/// closed key of the per-architecture parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    Aarch64,
}

impl Architecture {
    /// Parse from an architecture tag as reported by platform detection
    pub fn from_tag(s: &str) -> Result<Self, String> {
        match s {
            "x86_64" | "amd64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Aarch64),
            _ => Err(format!("Unknown architecture '{}'. Known: x86_64, aarch64", s)),
        }
    }

    /// Canonical tag string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
        }
    }
}

/// Physical machine topology, as exposed by external platform auto-detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PlatformTopology {
    /// Architecture tag; outside the known set, hierarchy generation fails
    pub architecture: String,
    /// Total logical CPUs (hyperthreads included)
    pub nb_cpus: u32,
    /// Total physical cores
    pub nb_cores: u32,
    /// NUMA node count
    pub nb_numa_nodes: u32,
    /// Last-level cache partition count
    pub nb_cache_partitions: u32,
    /// Package (socket) count
    pub nb_packages: u32,
}

impl PlatformTopology {
    /// Full machine nomenclature with per-level unit counts, finest first
    ///
    /// This is the source for the node-identification defines emitted into
    /// the hierarchy header; the "system" root is implicit.
    pub fn full_nomenclature(&self) -> Vec<(&'static str, u32)> {
        vec![
            ("cpu", self.nb_cpus),
            ("core", self.nb_cores),
            ("cache", self.nb_cache_partitions),
            ("numa", self.nb_numa_nodes),
            ("package", self.nb_packages),
        ]
    }
}
