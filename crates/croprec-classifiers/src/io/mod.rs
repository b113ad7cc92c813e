//! Dataset readers and model bundle persistence.
pub mod bundle;
pub mod crop_csv;

pub use bundle::{load_bundle, save_bundle, ModelBundle, BUNDLE_FORMAT_VERSION};
pub use crop_csv::{read_dataset, read_dataset_with_config, read_feature_vectors, CropReaderConfig};
