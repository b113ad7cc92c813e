//! Integration tests for saving and loading model bundles.

mod common;

use common::{init_logging, synthetic_dataset, test_config, CROPS, EXAMPLE};
use croprec_classifiers::io::{load_bundle, read_dataset, save_bundle, BUNDLE_FORMAT_VERSION};
use croprec_classifiers::{CropPredictor, FeatureVector, FittedModel, PredictorError, FEATURE_NAMES};

fn trained() -> CropPredictor {
    init_logging();
    let mut predictor = CropPredictor::new(test_config());
    predictor.train(&synthetic_dataset(30, 11)).unwrap();
    predictor
}

#[test]
fn save_then_load_reproduces_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crop_predictor_model.bin");

    let predictor = trained();
    predictor.save_model(&path).unwrap();

    let mut restored = CropPredictor::default();
    assert!(!restored.is_trained());
    restored.load_model(&path).unwrap();
    assert!(restored.is_trained());

    let mut probes: Vec<[f64; 7]> = CROPS.iter().map(|(_, c)| *c).collect();
    probes.push(EXAMPLE);
    for probe in probes {
        let fv = FeatureVector::from_array(probe);
        assert_eq!(predictor.predict(&fv).unwrap(), restored.predict(&fv).unwrap());
    }
}

#[test]
fn loaded_model_is_structurally_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let predictor = trained();
    predictor.save_model(&path).unwrap();

    let loaded = FittedModel::load(&path).unwrap();
    assert_eq!(&loaded, predictor.model().unwrap().as_ref());
}

#[test]
fn bundle_carries_version_and_feature_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    trained().save_model(&path).unwrap();

    let bundle = load_bundle(&path).unwrap();
    assert_eq!(bundle.format_version, BUNDLE_FORMAT_VERSION);
    assert_eq!(bundle.feature_names, FEATURE_NAMES.map(String::from).to_vec());
    assert_eq!(bundle.crate_version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn save_leaves_no_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let predictor = trained();
    predictor.save_model(&path).unwrap();
    predictor.save_model(&path).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["model.bin".to_string()]);
}

#[test]
fn missing_bundle_is_a_model_file_error() {
    let mut predictor = CropPredictor::default();
    let err = predictor
        .load_model("/nonexistent/crop_predictor_model.bin")
        .unwrap_err();
    assert!(matches!(err, PredictorError::ModelFile { .. }));
    assert!(!predictor.is_trained());
}

#[test]
fn garbage_bundle_is_a_model_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    std::fs::write(&path, b"definitely not a model bundle").unwrap();
    assert!(matches!(
        FittedModel::load(&path),
        Err(PredictorError::ModelFile { .. })
    ));
}

#[test]
fn truncated_bundle_is_a_model_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    trained().save_model(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(
        FittedModel::load(&path),
        Err(PredictorError::ModelFile { .. })
    ));
}

/// Write `model` after passing its serde form through `edit`.
fn save_edited(model: &FittedModel, path: &std::path::Path, edit: impl FnOnce(&mut serde_json::Value)) {
    let mut value = serde_json::to_value(model).unwrap();
    edit(&mut value);
    let edited: FittedModel = serde_json::from_value(value).unwrap();
    save_bundle(&edited, path).unwrap();
}

#[test]
fn dangling_tree_node_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let predictor = trained();
    save_edited(&predictor.model().unwrap(), &path, |v| {
        let root = &mut v["classifier"]["trees"][0]["nodes"][0]["Split"];
        assert!(root.is_object(), "root of a fitted tree is a split");
        root["left"] = serde_json::json!(999_999);
    });

    let mut restored = CropPredictor::default();
    let err = restored.load_model(&path).unwrap_err();
    assert!(matches!(err, PredictorError::ModelFile { .. }), "{}", err);
    assert!(err.to_string().contains("tree 0"), "{}", err);
    assert!(!restored.is_trained());
}

#[test]
fn out_of_range_split_feature_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    save_edited(&trained().model().unwrap(), &path, |v| {
        v["classifier"]["trees"][0]["nodes"][0]["Split"]["feature"] = serde_json::json!(42);
    });
    assert!(matches!(
        FittedModel::load(&path),
        Err(PredictorError::ModelFile { .. })
    ));
}

#[test]
fn short_leaf_distribution_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    save_edited(&trained().model().unwrap(), &path, |v| {
        let nodes = v["classifier"]["trees"][0]["nodes"].as_array_mut().unwrap();
        let leaf = nodes
            .iter_mut()
            .find_map(|n| n.get_mut("Leaf"))
            .unwrap();
        leaf["distribution"] = serde_json::json!([1.0]);
    });
    assert!(matches!(
        FittedModel::load(&path),
        Err(PredictorError::ModelFile { .. })
    ));
}

#[test]
fn csv_train_save_load_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("Crop_recommendation.csv");
    let model_path = dir.path().join("model.bin");
    common::write_csv(&synthetic_dataset(25, 5), &csv_path);

    let dataset = read_dataset(&csv_path).unwrap();
    assert_eq!(dataset.len(), 25 * CROPS.len());

    let mut predictor = CropPredictor::new(test_config());
    let accuracy = predictor.train(&dataset).unwrap();
    assert!(accuracy > 0.8);
    predictor.save_model(&model_path).unwrap();

    let mut restored = CropPredictor::default();
    restored.load_model(&model_path).unwrap();
    let fv = FeatureVector::from_array(EXAMPLE);
    assert_eq!(predictor.predict(&fv).unwrap(), restored.predict(&fv).unwrap());
}
