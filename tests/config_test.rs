/*!
Configuration files: TOML and YAML loading, saving and validation
*/

use complexity_analyzer::{AnalysisEngine, AnalyzerConfig};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn toml_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("complexity-analyzer.toml");

    let mut config = AnalyzerConfig::default();
    config.recurrence.tree_levels = 6;
    config.solver.parallel_cases = true;
    config.save_to_file(&path).unwrap();

    let loaded = AnalyzerConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn yaml_is_picked_by_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("analyzer.yaml");
    fs::write(
        &path,
        "recurrence:\n  tree_levels: 2\n  render_tree_diagram: false\n",
    )
    .unwrap();

    let config = AnalyzerConfig::load(&path).unwrap();
    assert_eq!(config.recurrence.tree_levels, 2);
    assert!(!config.recurrence.render_tree_diagram);
    assert_eq!(config.cost_model, AnalyzerConfig::default().cost_model);
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "[cost_model]\nbranch_probability = 2.0\n").unwrap();

    let err = AnalyzerConfig::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("branch_probability"));
}

#[test]
fn loaded_config_drives_the_engine() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("analyzer.toml");
    fs::write(&path, "[recurrence]\ntree_levels = 2\nrender_tree_diagram = false\n").unwrap();

    let config = AnalyzerConfig::load(&path).unwrap();
    let info = AnalysisEngine::new(&config)
        .unwrap()
        .solve_recurrence("T(n) = 2T(n/2) + n");
    let tree = info
        .methods_tried
        .iter()
        .find_map(|m| m.tree.as_ref())
        .unwrap();
    assert_eq!(tree.levels.len(), 2);
    assert!(tree.diagram.is_none());
}
