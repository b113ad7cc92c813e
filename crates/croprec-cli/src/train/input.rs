use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use croprec_classifiers::config::{ForestConfig, MaxFeatures};

use crate::util::validate_tsv_or_csv_file;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrainConfig {
    pub train_data: String,
    pub output_file: String,
    pub report_file: Option<String>,
    pub forest: ForestConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            train_data: String::from("Crop_recommendation.csv"),
            output_file: String::from("crop_predictor_model.bin"),
            report_file: None,
            forest: ForestConfig::default(),
        }
    }
}

impl TrainConfig {
    /// Parse a (possibly partial) JSON config. Missing or malformed fields
    /// keep their default and are reported with a warning.
    pub fn from_json_str(config_json: &str) -> Result<Self> {
        let partial: serde_json::Value =
            serde_json::from_str(config_json).context("Config is not valid JSON")?;
        let mut config = TrainConfig::default();

        macro_rules! load_or_default {
            ($field:ident) => {
                if let Some(val) = partial.get(stringify!($field)) {
                    if let Ok(parsed) = serde_json::from_value(val.clone()) {
                        config.$field = parsed;
                    } else {
                        log::warn!(
                            "Config Invalid value for '{}', using default: {:?}",
                            stringify!($field), config.$field
                        );
                    }
                } else {
                    log::warn!(
                        "Config Missing field '{}', using default: {:?}",
                        stringify!($field), config.$field
                    );
                }
            };
        }

        load_or_default!(train_data);
        load_or_default!(output_file);
        load_or_default!(report_file);
        load_or_default!(forest);

        Ok(config)
    }

    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let config_json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                TrainConfig::from_json_str(&config_json)?
            }
            None => TrainConfig::default(),
        };

        // Apply CLI overrides
        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        validate_tsv_or_csv_file(&config.train_data)?;

        if let Some(output_file) = matches.get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }
        if let Some(report_file) = matches.get_one::<String>("report_file") {
            config.report_file = Some(report_file.clone());
        }
        if let Some(n_trees) = matches.get_one::<usize>("n_trees") {
            config.forest.n_trees = *n_trees;
        }
        if let Some(seed) = matches.get_one::<u64>("seed") {
            config.forest.forest_seed = *seed;
            config.forest.split_seed = *seed;
        }
        if let Some(max_features) = matches.get_one::<String>("max_features") {
            config.forest.max_features = max_features
                .parse::<MaxFeatures>()
                .map_err(anyhow::Error::msg)?;
        }

        config.forest.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = TrainConfig::from_json_str(r#"{"train_data": "data/crops.csv"}"#).unwrap();
        assert_eq!(cfg.train_data, "data/crops.csv");
        assert_eq!(cfg.output_file, "crop_predictor_model.bin");
        assert_eq!(cfg.forest, ForestConfig::default());
    }

    #[test]
    fn malformed_field_falls_back_to_default() {
        let cfg = TrainConfig::from_json_str(r#"{"output_file": 12, "forest": {"n_trees": 7}}"#)
            .unwrap();
        assert_eq!(cfg.output_file, "crop_predictor_model.bin");
        assert_eq!(cfg.forest.n_trees, 7);
        assert_eq!(cfg.forest.split_seed, 42);
    }

    #[test]
    fn effective_config_lists_only_loaded_fields() {
        let value = serde_json::to_value(TrainConfig::default()).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["train_data", "output_file", "report_file", "forest"]);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(TrainConfig::from_json_str("{not json").is_err());
    }
}
