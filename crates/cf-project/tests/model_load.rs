//! Integration test: parse a full declarative model file, assemble it, and
//! run the resulting network for a short period.

use std::collections::BTreeMap;

use cf_model::{Forcing, RunOptions};
use cf_project::{assemble, load_model, ModelDef, ProjectError};

const THUR_LIKE_MODEL: &str = r#"
version: 1
name: alpine-catchment
solver:
  tolerance: 1.0e-10
  max_iterations: 100
elements:
  - kind: splitter
    id: upper-splitter
    direction: [[0], [1], [2]]
    weight: [[1.0], [1.0], [1.0]]
  - kind: snow
    id: snow
    parameters: { t0: 0.0, k: 0.01, m: 2.0 }
  - kind: transparent
    id: pet-carrier
  - kind: junction
    id: upper-junction
    direction: [[0, null], [null, 1]]
  - kind: unsaturated
    id: unsaturated
    parameters: { Smax: 50.0, k: 2.0, beta: 2.0 }
    initial_storage: 10.0
  - kind: splitter
    id: lower-splitter
    direction: [[0], [0]]
    weight: [[0.3], [0.7]]
  - kind: power-law
    id: slow
    parameters: { k: 1.0e-4, alpha: 1.0 }
  - kind: lag
    id: lag
    parameters: { lag-time: 2.0 }
  - kind: transparent
    id: pass
  - kind: power-law
    id: fast
    parameters: { k: 0.01, alpha: 3.0 }
  - kind: junction
    id: lower-junction
    direction: [[0, 1]]
units:
  - id: hillslope
    layers:
      - [upper-splitter]
      - [snow, pet-carrier]
      - [upper-junction]
      - [unsaturated]
      - [lower-splitter]
      - [slow, lag]
      - [pass, fast]
      - [lower-junction]
nodes:
  - id: mogelsberg
    units: [hillslope]
    weights: [1.0]
    area: 88.1
  - id: jonschwil
    units: [hillslope]
    weights: [1.0]
    area: 401.6
network:
  topography:
    mogelsberg: jonschwil
    jonschwil: null
"#;

fn rainy_forcing(timesteps: usize) -> Forcing {
    Forcing::from_triples((0..timesteps).map(|day| {
        let precipitation = if day % 2 == 0 { 5.0 } else { 0.0 };
        [precipitation, 6.0, 1.5]
    }))
}

#[test]
fn full_model_parses_assembles_and_runs() {
    let def: ModelDef = serde_yaml::from_str(THUR_LIKE_MODEL).unwrap();
    assert_eq!(def.name, "alpine-catchment");
    assert_eq!(def.elements.len(), 11);

    let mut network = assemble(&def).unwrap();
    assert_eq!(network.outlet_ids(), vec!["jonschwil"]);

    let timesteps = 30;
    let forcing: BTreeMap<String, Forcing> = [
        ("mogelsberg".to_string(), rainy_forcing(timesteps)),
        ("jonschwil".to_string(), rainy_forcing(timesteps)),
    ]
    .into_iter()
    .collect();

    let output = network
        .run(&forcing, &RunOptions::default())
        .unwrap();
    let discharge = &output.outlets["jonschwil"];
    assert_eq!(discharge.len(), timesteps);
    assert!(discharge.iter().all(|q| q.is_finite() && *q >= 0.0));
    assert!(discharge.iter().any(|q| *q > 0.0));
}

#[test]
fn cloned_unit_state_is_private_per_node() {
    let def: ModelDef = serde_yaml::from_str(THUR_LIKE_MODEL).unwrap();
    let mut network = assemble(&def).unwrap();

    // Rain only on the headwater; the outlet's own reservoirs stay dry apart
    // from their shared initial storage.
    let timesteps = 10;
    let forcing: BTreeMap<String, Forcing> = [
        ("mogelsberg".to_string(), rainy_forcing(timesteps)),
        (
            "jonschwil".to_string(),
            Forcing::from_triples((0..timesteps).map(|_| [0.0, 6.0, 0.0])),
        ),
    ]
    .into_iter()
    .collect();

    let options = RunOptions {
        dt: 1.0,
        record_states: true,
    };
    let output = network.run(&forcing, &options).unwrap();
    let states = output.states.unwrap();

    let wet = states["mogelsberg/hillslope/unsaturated"].last().copied();
    let dry = states["jonschwil/hillslope/unsaturated"].last().copied();
    assert!(wet.unwrap() > dry.unwrap());
}

#[test]
fn load_model_reads_yaml_and_json() {
    let def: ModelDef = serde_yaml::from_str(THUR_LIKE_MODEL).unwrap();
    let temp_dir = std::env::temp_dir();

    let yaml_path = temp_dir.join("cf_project_model_load.yaml");
    std::fs::write(&yaml_path, THUR_LIKE_MODEL).unwrap();
    let from_yaml = load_model(&yaml_path).unwrap();
    std::fs::remove_file(&yaml_path).unwrap();
    assert_eq!(from_yaml, def);

    let json_path = temp_dir.join("cf_project_model_load.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&def).unwrap()).unwrap();
    let from_json = load_model(&json_path).unwrap();
    std::fs::remove_file(&json_path).unwrap();
    assert_eq!(from_json, def);
}

#[test]
fn unknown_receiver_in_topography_fails() {
    let text = THUR_LIKE_MODEL.replace("mogelsberg: jonschwil", "mogelsberg: nowhere");
    let def: ModelDef = serde_yaml::from_str(&text).unwrap();
    let err = assemble(&def).unwrap_err();
    assert!(matches!(err, ProjectError::Model(_)));
}

#[test]
fn duplicate_unit_id_fails() {
    let mut def: ModelDef = serde_yaml::from_str(THUR_LIKE_MODEL).unwrap();
    let dup = def.units[0].clone();
    def.units.push(dup);
    let err = assemble(&def).unwrap_err();
    assert!(matches!(err, ProjectError::DuplicateId { kind: "unit", .. }));
}
