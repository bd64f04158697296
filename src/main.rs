/*!
 * lockgen - Command-Line Entry Point
 *
 * Generates the lock-interposition source tree for one platform:
 * - platform-specific hierarchical lock configuration
 * - one wrapper source per requested lock
 * - optional hand-off to an external build command
 */

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use lockgen::{
    init_tracing, CommandBuilder, LockRegistry, Orchestrator, OutputLayout, PlatformTopology,
    TemplateSet,
};

const USAGE: &str = "usage: lockgen <topology.json> <header_dir> <output_dir> [lock...]";

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize structured tracing
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 3 {
        return Err(USAGE.into());
    }
    let topology_path = PathBuf::from(&args[0]);
    let header_dir = PathBuf::from(&args[1]);
    let output_dir = PathBuf::from(&args[2]);
    let requested: Option<Vec<String>> = (args.len() > 3).then(|| args[3..].to_vec());

    let topology: PlatformTopology = serde_json::from_str(&fs::read_to_string(&topology_path)?)?;
    info!(
        arch = %topology.architecture,
        cpus = topology.nb_cpus,
        numa_nodes = topology.nb_numa_nodes,
        "topology loaded"
    );

    // Template families: embedded by default, overridable for experiments
    let templates = match std::env::var("LOCKGEN_TEMPLATE_DIR") {
        Ok(dir) => TemplateSet::load(PathBuf::from(dir).as_path())?,
        Err(_) => TemplateSet::builtin(),
    };

    let mut registry = LockRegistry::new();
    let registered = registry.register_flat_dir(&header_dir, &header_dir.display().to_string())?;
    info!(count = registered, dir = %header_dir.display(), "registered flat lock headers");

    let layout = OutputLayout {
        src_dir: output_dir.join("src"),
        include_dir: output_dir.join("include"),
    };

    let mut orchestrator = Orchestrator::new(registry, templates, layout);
    if let Ok(cmd) = std::env::var("LOCKGEN_BUILD_CMD") {
        let mut parts = cmd.split_whitespace().map(String::from);
        if let Some(program) = parts.next() {
            let artifact = std::env::var("LOCKGEN_ARTIFACT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| output_dir.join("libshim.so"));
            info!(program = %program, artifact = %artifact.display(), "external build step configured");
            orchestrator =
                orchestrator.with_builder(Box::new(CommandBuilder::new(program, parts.collect(), artifact)));
        }
    }

    let report = orchestrator.generate(&topology, requested.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.hard_failure() {
        return Err("hierarchy generation failed".into());
    }
    Ok(())
}
