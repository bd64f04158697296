/*!
 * Hierarchy Topology
 * Topology levels and the per-architecture hierarchy parameter table
 */

use serde::{Deserialize, Serialize};

use crate::core::{Architecture, PlatformTopology};

/// One level of a lock hierarchy, ordered leaf to root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyLevel {
    pub name: String,
    /// Children aggregated into one parent unit at this level
    pub fan_out: u32,
}

impl TopologyLevel {
    pub fn new(name: impl Into<String>, fan_out: u32) -> Self {
        Self {
            name: name.into(),
            fan_out,
        }
    }
}

/// Architecture-specific hierarchy shape: which topology levels the lock
/// nests over and the default hand-off thresholds above the leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyProfile {
    /// Leaf-to-root levels; the root always has fan-out 1
    pub levels: Vec<TopologyLevel>,
    /// One hand-off threshold per level above the leaf
    pub thresholds: Vec<u32>,
}

/// Hierarchy parameters per architecture
///
/// The match is exhaustive over the closed `Architecture` set, so adding an
/// architecture is a data change here, not a new control-flow branch in the
/// generator.
pub fn hierarchy_profile(arch: Architecture, topology: &PlatformTopology) -> HierarchyProfile {
    match arch {
        Architecture::X86_64 => HierarchyProfile {
            levels: vec![
                TopologyLevel::new("core", topology.nb_cores),
                TopologyLevel::new("numa", topology.nb_numa_nodes),
                TopologyLevel::new("system", 1),
            ],
            thresholds: vec![128, 128],
        },
        Architecture::Aarch64 => HierarchyProfile {
            levels: vec![
                TopologyLevel::new("cache", topology.nb_cache_partitions),
                TopologyLevel::new("numa", topology.nb_numa_nodes),
                TopologyLevel::new("system", 1),
            ],
            thresholds: vec![128, 128],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology(arch: &str) -> PlatformTopology {
        PlatformTopology {
            architecture: arch.into(),
            nb_cpus: 16,
            nb_cores: 8,
            nb_numa_nodes: 2,
            nb_cache_partitions: 4,
            nb_packages: 1,
        }
    }

    #[test]
    fn test_x86_64_profile_nests_over_cores() {
        let profile = hierarchy_profile(Architecture::X86_64, &topology("x86_64"));
        let names: Vec<&str> = profile.levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["core", "numa", "system"]);
        assert_eq!(profile.levels[0].fan_out, 8);
        assert_eq!(profile.thresholds, vec![128, 128]);
    }

    #[test]
    fn test_aarch64_profile_nests_over_cache_partitions() {
        let profile = hierarchy_profile(Architecture::Aarch64, &topology("aarch64"));
        let names: Vec<&str> = profile.levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["cache", "numa", "system"]);
        assert_eq!(profile.levels[0].fan_out, 4);
    }
}
