/*!
 * Hierarchy Configuration
 * Derives hierarchical-lock parameters and renders the configuration header
 */

use std::fs;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::info;

use super::topology::{hierarchy_profile, TopologyLevel};
use crate::core::{Architecture, GenError, GenResult, PlatformTopology};
use crate::synth::{TemplateSet, TemplateVars};

/// Generic hierarchical MCS implementation the configuration parameterizes
const UNDERLYING_LOCK: &str = "hmcslock";
const UNDERLYING_NODE_TYPE: &str = "hmcs_node_t";

/// Prefix of the node-identification defines other NUMA-aware locks consume
const DEFINE_PREFIX: &str = "HIER_";

/// Fully derived hierarchical-lock parameters for one machine
///
/// Always computed from a topology, never hand-supplied: the node count in
/// particular under-allocates (out-of-bounds node access) or over-allocates
/// (memory proportional to core count) if guessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyConfig {
    /// Leaf-to-root levels; the last level is the root with fan-out 1
    levels: Vec<TopologyLevel>,
    /// Hand-off thresholds for the levels above the leaf
    thresholds: Vec<u32>,
    total_cpus: u32,
    total_cores: u32,
}

impl HierarchyConfig {
    /// Derive a configuration from an ordered leaf-to-root topology
    pub fn derive(
        levels: Vec<TopologyLevel>,
        thresholds: Vec<u32>,
        total_cpus: u32,
        total_cores: u32,
    ) -> GenResult<Self> {
        match levels.last() {
            None => {
                return Err(GenError::InvalidTopology("no topology levels".into()));
            }
            Some(root) if root.fan_out != 1 => {
                return Err(GenError::InvalidTopology(format!(
                    "root level '{}' must have fan-out 1, got {}",
                    root.name, root.fan_out
                )));
            }
            Some(_) => {}
        }
        if thresholds.len() != levels.len() - 1 {
            return Err(GenError::InvalidTopology(format!(
                "expected {} thresholds for {} levels, got {}",
                levels.len() - 1,
                levels.len(),
                thresholds.len()
            )));
        }
        if let Some(level) = levels.iter().find(|l| l.fan_out == 0) {
            return Err(GenError::InvalidTopology(format!(
                "level '{}' has fan-out 0",
                level.name
            )));
        }

        Ok(Self {
            levels,
            thresholds,
            total_cpus,
            total_cores,
        })
    }

    pub fn levels(&self) -> &[TopologyLevel] {
        &self.levels
    }

    pub fn total_cpus(&self) -> u32 {
        self.total_cpus
    }

    pub fn total_cores(&self) -> u32 {
        self.total_cores
    }

    /// Fan-out of every non-root level, leaf first
    pub fn level_sizes(&self) -> Vec<u32> {
        self.levels[..self.levels.len() - 1]
            .iter()
            .map(|l| l.fan_out)
            .collect()
    }

    /// Total per-level lock-node slots: one per distinct root-to-level path
    ///
    /// Sum of the leaf-first prefix products over the non-root levels; for
    /// core-numa-system sizes (4, 2, 1) this is 4 + 4*2 = 12.
    pub fn node_count(&self) -> u64 {
        let mut total = 0u64;
        let mut product = 1u64;
        for size in self.level_sizes() {
            product *= u64::from(size);
            total += product;
        }
        total
    }

    /// Logical CPUs grouped under one leaf-level node
    ///
    /// Fails instead of flooring: a remainder means the topology and the CPU
    /// count disagree.
    pub fn cpus_per_leaf(&self) -> GenResult<u32> {
        let leaf = &self.levels[0];
        if self.total_cpus % leaf.fan_out != 0 {
            return Err(GenError::NonIntegralTopologyDivision {
                total_cpus: self.total_cpus,
                leaf_level: leaf.name.clone(),
                fan_out: leaf.fan_out,
            });
        }
        Ok(self.total_cpus / leaf.fan_out)
    }

    /// `#define LEVEL_i <fan-out>` lines, numbered leaf first
    fn level_size_defines(&self) -> String {
        self.levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                format!("#define LEVEL_{} {}  /* {} level */", i + 1, level.fan_out, level.name)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `#define Hi <threshold>` lines for the levels above the leaf
    fn threshold_defines(&self) -> String {
        self.thresholds
            .iter()
            .enumerate()
            .map(|(i, value)| format!("#define H{} {}", i + 1, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Per-level hand-off thresholds; the leaf always passes through at 1
    fn level_threshold_defines(&self) -> String {
        let mut lines = vec!["#define LEVEL_1_THRESHOLD 1".to_string()];
        for i in 2..=self.levels.len() {
            lines.push(format!("#define LEVEL_{}_THRESHOLD H{}", i, i - 1));
        }
        lines.join("\n")
    }

    /// Symbolic node-count sum, largest path product first
    fn node_count_expr(&self) -> String {
        let non_root = self.levels.len() - 1;
        let terms: Vec<String> = (1..=non_root)
            .rev()
            .map(|i| {
                let product = (1..=i)
                    .map(|j| format!("LEVEL_{j}"))
                    .collect::<Vec<_>>()
                    .join(" * ");
                format!("    ({product})")
            })
            .collect();
        terms.join(" + \\\n") + " \\"
    }

    /// `{size, threshold}` initializer entries, one per level
    fn level_spec_entries(&self) -> String {
        (1..=self.levels.len())
            .map(|i| format!("    {{LEVEL_{i}, LEVEL_{i}_THRESHOLD}}, \\"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Node-identification defines for the whole machine, coarsest first
    ///
    /// Emitted beyond the hierarchy's own levels so other NUMA-aware lock
    /// headers can map a CPU id to its topology unit.
    fn machine_defines(&self, topology: &PlatformTopology) -> String {
        topology
            .full_nomenclature()
            .iter()
            .rev()
            .map(|(name, value)| {
                format!("#define {}NB_{}S {}", DEFINE_PREFIX, name.to_uppercase(), value)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render the configuration header for `identifier`
    pub fn render_header(
        &self,
        templates: &TemplateSet,
        topology: &PlatformTopology,
        identifier: &str,
        spinlock_include_path: &str,
    ) -> GenResult<String> {
        let cpus_per_leaf = self.cpus_per_leaf()?;
        let leaf = &self.levels[0];
        let cpus_per_leaf_node = format!(
            "{cpus_per_leaf}  /* cpus per {leaf_name} = nb_cpus / nb_{leaf_name}s = {cpus} / {fan_out} = {cpus_per_leaf} */",
            leaf_name = leaf.name,
            cpus = self.total_cpus,
            fan_out = leaf.fan_out,
        );

        let mut vars = TemplateVars::new();
        vars.set("HIER_LOCK", identifier)
            .set("LOCK", UNDERLYING_LOCK)
            .set("LOCK_NODE_TYPE", UNDERLYING_NODE_TYPE)
            .set("SPINLOCK_INCLUDE_PATH", spinlock_include_path)
            .set("HIERARCHY_DEFINES", self.machine_defines(topology))
            .set("THRESHOLD_DEFINES", self.threshold_defines())
            .set("NB_LEVELS", self.levels.len().to_string())
            .set("LEVEL_SIZES", self.level_size_defines())
            .set("CPUS_PER_LEAF_NODE", cpus_per_leaf_node)
            .set("LEVEL_THRESHOLDS", self.level_threshold_defines())
            .set("NODE_COUNT_EXPR", self.node_count_expr())
            .set("LEVEL_SPEC", self.level_spec_entries());

        templates.hierarchy.render(&vars)
    }
}

/// Name and location of a generated hierarchical lock
///
/// From here on it is an ordinary lock: the orchestrator feeds it back
/// through extraction and wrapper synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedHierarchy {
    pub lock_name: String,
    pub header_path: PathBuf,
}

/// Generate the hierarchical-lock configuration header for one platform
///
/// The output path is derived from `identifier`; an existing file there is
/// replaced, never merged, since the configuration is always fully
/// re-derived from the current topology.
pub fn generate_hierarchy_lock(
    templates: &TemplateSet,
    topology: &PlatformTopology,
    identifier: &str,
    include_dir: &Path,
    spinlock_include_path: &str,
) -> GenResult<GeneratedHierarchy> {
    let arch = Architecture::from_tag(&topology.architecture)
        .map_err(|_| GenError::UnsupportedArchitecture(topology.architecture.clone()))?;

    let profile = hierarchy_profile(arch, topology);
    let config = HierarchyConfig::derive(
        profile.levels,
        profile.thresholds,
        topology.nb_cpus,
        topology.nb_cores,
    )?;
    let content = config.render_header(templates, topology, identifier, spinlock_include_path)?;

    let include_dir = include_dir.to_path_buf().clean();
    fs::create_dir_all(&include_dir).map_err(|e| GenError::io(&include_dir, e))?;
    let header_path = include_dir.join(format!("{identifier}.h"));
    fs::write(&header_path, content).map_err(|e| GenError::io(&header_path, e))?;

    info!(
        lock = %identifier,
        arch = arch.as_str(),
        levels = config.levels().len(),
        nodes = config.node_count(),
        path = %header_path.display(),
        "generated hierarchy configuration"
    );

    Ok(GeneratedHierarchy {
        lock_name: identifier.to_string(),
        header_path,
    })
}
