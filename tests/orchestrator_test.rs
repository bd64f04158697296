/*!
 * Orchestrator Tests
 * Batch generation with per-lock failure isolation and the build seam
 */

use std::fs;
use std::path::{Path, PathBuf};

use lockgen::{
    BuildArtifact, GenError, GenResult, LibraryBuilder, LockRegistry, LockSource, Orchestrator,
    Outcome, OutputLayout, PlatformTopology, TemplateFamily, TemplateSet,
};
use pretty_assertions::assert_eq;

const CASLOCK: &str = "\
typedef struct caslock_s { vatomic32_t state; } caslock_t;\n\
static inline void caslock_init(caslock_t *l);\n\
static inline void caslock_acquire(caslock_t *l);\n\
static inline vbool_t caslock_tryacquire(caslock_t *l);\n\
static inline void caslock_release(caslock_t *l);\n";

const MCSLOCK: &str = "\
typedef struct mcslock_s { vatomicptr_t tail; } mcslock_t;\n\
static inline void mcslock_init(mcslock_t *l);\n\
static inline void mcslock_acquire(mcslock_t *l, mcs_node_t *node);\n\
static inline void mcslock_release(mcslock_t *l, mcs_node_t *node);\n";

fn topology() -> PlatformTopology {
    PlatformTopology {
        architecture: "x86_64".into(),
        nb_cpus: 16,
        nb_cores: 4,
        nb_numa_nodes: 2,
        nb_cache_partitions: 8,
        nb_packages: 1,
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    header_dir: PathBuf,
    layout: OutputLayout,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let header_dir = dir.path().join("headers");
    fs::create_dir_all(&header_dir).unwrap();
    fs::write(header_dir.join("caslock.h"), CASLOCK).unwrap();
    fs::write(header_dir.join("mcslock.h"), MCSLOCK).unwrap();
    let layout = OutputLayout {
        src_dir: dir.path().join("gen/src"),
        include_dir: dir.path().join("gen/include"),
    };
    Fixture {
        _dir: dir,
        header_dir,
        layout,
    }
}

fn registry(header_dir: &Path) -> LockRegistry {
    let mut registry = LockRegistry::new();
    registry
        .register_flat_dir(header_dir, "vsync/spinlock")
        .unwrap();
    registry
}

fn outcome_of<'r>(report: &'r lockgen::GenerationReport, name: &str) -> &'r Outcome {
    &report
        .outcomes
        .iter()
        .find(|o| o.name == name)
        .unwrap_or_else(|| panic!("no outcome for {name}"))
        .outcome
}

#[test]
fn test_batch_generates_requested_locks() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    );

    let report = orchestrator.generate(&topology(), None).unwrap();
    assert!(!report.hard_failure());

    match outcome_of(&report, "caslock") {
        Outcome::Generated { family, path } => {
            assert_eq!(*family, TemplateFamily::ContextFree);
            assert!(path.ends_with("caslock.c"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    match outcome_of(&report, "mcslock") {
        Outcome::Generated { family, .. } => assert_eq!(*family, TemplateFamily::ContextAware),
        other => panic!("unexpected outcome: {other:?}"),
    }
    // The hierarchy lock went through the same wrapper pipeline
    match outcome_of(&report, "numa_hmcslock") {
        Outcome::Generated { family, .. } => assert_eq!(*family, TemplateFamily::ContextAware),
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert!(fx.layout.src_dir.join("caslock.c").is_file());
    assert!(fx.layout.src_dir.join("mcslock.c").is_file());
    assert!(fx.layout.src_dir.join("numa_hmcslock.c").is_file());
    assert!(fx.layout.include_dir.join("numa_hmcslock.h").is_file());
}

#[test]
fn test_missing_header_does_not_abort_siblings() {
    let fx = fixture();
    let mut reg = registry(&fx.header_dir);
    // Known name whose header is absent from the directory
    reg.register_flat("brokenlock", LockSource::new(&fx.header_dir, "vsync/spinlock"));

    let orchestrator = Orchestrator::new(reg, TemplateSet::builtin(), fx.layout.clone());
    let requested = vec![
        "brokenlock".to_string(),
        "caslock".to_string(),
        "mcslock".to_string(),
    ];
    let report = orchestrator.generate(&topology(), Some(&requested)).unwrap();

    assert!(matches!(outcome_of(&report, "caslock"), Outcome::Generated { .. }));
    assert!(matches!(outcome_of(&report, "mcslock"), Outcome::Generated { .. }));
    match outcome_of(&report, "brokenlock") {
        Outcome::Failed { reason } => assert!(reason.contains("not found")),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn test_unknown_requested_names_are_silently_dropped() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    );

    let requested = vec!["caslock".to_string(), "imaginarylock".to_string()];
    let report = orchestrator.generate(&topology(), Some(&requested)).unwrap();

    let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["caslock"]);
    assert!(!report.hard_failure());
}

#[test]
fn test_unsupported_architecture_fails_hierarchy_only() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    );

    let mut topo = topology();
    topo.architecture = "mips64".into();
    let report = orchestrator.generate(&topo, None).unwrap();

    // Hard failure is reported, but flat locks were still generated
    assert!(report.hard_failure());
    match outcome_of(&report, "numa_hmcslock") {
        Outcome::Failed { reason } => assert!(reason.contains("mips64")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(matches!(outcome_of(&report, "caslock"), Outcome::Generated { .. }));
    assert!(matches!(outcome_of(&report, "mcslock"), Outcome::Generated { .. }));
}

#[test]
fn test_regeneration_is_byte_identical() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    );

    orchestrator.generate(&topology(), None).unwrap();
    let first = fs::read(fx.layout.src_dir.join("mcslock.c")).unwrap();
    orchestrator.generate(&topology(), None).unwrap();
    let second = fs::read(fx.layout.src_dir.join("mcslock.c")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_missing_tryacquire_stub_in_generated_source() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    );

    let requested = vec!["mcslock".to_string()];
    orchestrator.generate(&topology(), Some(&requested)).unwrap();

    // mcslock has no tryacquire: the wrapper must trap at first use rather
    // than pretend to succeed
    let content = fs::read_to_string(fx.layout.src_dir.join("mcslock.c")).unwrap();
    assert!(content.contains("tryacquire not implemented for mcslock"));
    assert!(content.contains("exit(EXIT_FAILURE);"));
}

struct StubBuilder;

impl LibraryBuilder for StubBuilder {
    fn build(&self, source_dir: &Path) -> GenResult<BuildArtifact> {
        Ok(BuildArtifact {
            library_path: source_dir.join("libshim.so"),
        })
    }
}

struct FailingBuilder;

impl LibraryBuilder for FailingBuilder {
    fn build(&self, _source_dir: &Path) -> GenResult<BuildArtifact> {
        Err(GenError::BuildFailed("linker exploded".into()))
    }
}

#[test]
fn test_build_seam_returns_artifact_handle() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    )
    .with_builder(Box::new(StubBuilder));

    let report = orchestrator.generate(&topology(), None).unwrap();
    let artifact = report.artifact.expect("artifact handle");
    assert!(artifact.library_path.ends_with("libshim.so"));
}

#[test]
fn test_build_failure_propagates() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    )
    .with_builder(Box::new(FailingBuilder));

    let err = orchestrator.generate(&topology(), None).unwrap_err();
    assert_eq!(err, GenError::BuildFailed("linker exploded".into()));
}

#[test]
fn test_report_serializes_for_downstream_tooling() {
    let fx = fixture();
    let orchestrator = Orchestrator::new(
        registry(&fx.header_dir),
        TemplateSet::builtin(),
        fx.layout.clone(),
    );

    let requested = vec!["caslock".to_string()];
    let report = orchestrator.generate(&topology(), Some(&requested)).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"caslock\""));
    assert!(json.contains("\"generated\""));
}
