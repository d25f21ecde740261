use obx_core::provenance::RunProvenance;
use obx_core::serde::{from_json_slice, from_yaml_slice, to_canonical_json_bytes, to_yaml_string};
use obx_core::{Direction, ProblemMeta, SuiteKind};

fn sample_meta() -> ProblemMeta {
    ProblemMeta {
        fid: 3,
        iid: 1,
        dim: 16,
        name: "Ridge".into(),
        suite: SuiteKind::RealSuperset,
        direction: Direction::Minimize,
    }
}

#[test]
fn problem_meta_round_trip_json() {
    let meta = sample_meta();
    let bytes = to_canonical_json_bytes(&meta).expect("serialize");
    let decoded: ProblemMeta = from_json_slice(&bytes).expect("deserialize");
    assert_eq!(decoded, meta);
}

#[test]
fn suite_kind_uses_kebab_case_names() {
    let yaml = to_yaml_string(&SuiteKind::DiscreteSuperset).expect("serialize");
    assert!(yaml.contains("discrete-superset"));
    let decoded: SuiteKind = from_yaml_slice(b"real-base").expect("deserialize");
    assert_eq!(decoded, SuiteKind::RealBase);
}

#[test]
fn provenance_round_trip_json() {
    let provenance = RunProvenance {
        plan_hash: "abc123".into(),
        created_at: "2024-05-01T00:00:00Z".into(),
        tool_versions: [("obx-exp".to_string(), "0.1.0".to_string())]
            .into_iter()
            .collect(),
    };
    let bytes = to_canonical_json_bytes(&provenance).expect("serialize");
    let decoded: RunProvenance = from_json_slice(&bytes).expect("deserialize");
    assert_eq!(decoded, provenance);
}

#[test]
fn canonical_bytes_are_identical_for_equal_values() {
    let a = to_canonical_json_bytes(&sample_meta()).expect("serialize a");
    let b = to_canonical_json_bytes(&sample_meta()).expect("serialize b");
    assert_eq!(a, b);
}
