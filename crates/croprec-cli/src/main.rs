use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use croprec_classifiers::FEATURE_NAMES;
use croprec_cli::predict::inference;
use croprec_cli::predict::input::PredictConfig;
use croprec_cli::serve::{self, ServiceConfig};
use croprec_cli::train::input::TrainConfig;
use croprec_cli::train::trainer;

fn feature_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_parser(clap::value_parser!(f64))
        .allow_negative_numbers(true)
        .value_hint(ValueHint::Other)
}

fn build_cli() -> Command {
    Command::new("croprec")
        .version(clap::crate_version!())
        .about("\u{1F33E} croprec - Crop recommendation from soil and climate readings")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a crop recommendation model from a labelled CSV/TSV table")
                .arg(
                    Arg::new("config")
                        .help("Path to training configuration file. Defaults are used when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("train_data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to training data. Overrides the training data file \
                             specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "File path that the model bundle will be written to. \
                             Overrides the output file specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("report_file")
                        .short('r')
                        .long("report_file")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Write the JSON training report to this path.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("n_trees")
                        .long("n_trees")
                        .value_parser(clap::value_parser!(usize))
                        .help("Number of trees in the forest.")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(clap::value_parser!(u64))
                        .help("Seed for both the train/test split and the forest.")
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("max_features")
                        .long("max_features")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Features considered per split: 'sqrt', 'all' or a count.")
                        .value_hint(ValueHint::Other),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Recommend crops for one reading or a table of readings")
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .help("Path to the trained model bundle")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("inference_data")
                        .short('d')
                        .long("inference_data")
                        .help("CSV/TSV table of readings to score instead of the single-reading flags")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output_file")
                        .help("Path to the output file for predictions (*.tsv or *.csv). Defaults to stdout.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(feature_arg(FEATURE_NAMES[0], "Nitrogen content of the soil"))
                .arg(feature_arg(FEATURE_NAMES[1], "Phosphorus content of the soil"))
                .arg(feature_arg(FEATURE_NAMES[2], "Potassium content of the soil"))
                .arg(feature_arg(FEATURE_NAMES[3], "Temperature in degrees Celsius"))
                .arg(feature_arg(FEATURE_NAMES[4], "Relative humidity in %"))
                .arg(feature_arg(FEATURE_NAMES[5], "Soil pH"))
                .arg(feature_arg(FEATURE_NAMES[6], "Rainfall in mm")),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP prediction service")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .help("Bind address. Overrides HOST.")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::Hostname),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .help("Bind port. Overrides PORT.")
                        .value_parser(clap::value_parser!(u16))
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("model_path")
                        .short('m')
                        .long("model")
                        .help("Model bundle to load, or to write after training. Overrides CROPREC_MODEL_PATH.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data_path")
                        .short('d')
                        .long("data")
                        .help("Training data used when no model bundle exists. Overrides CROPREC_DATA_PATH.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CROPREC_LOG", "error,croprec=info"))
        .init();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("predict", sub_m)) => handle_predict(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    match config_path {
        Some(path) => log::info!("[croprec::train] Training from config: {:?}", path),
        None => log::info!("[croprec::train] No config provided; using defaults."),
    }

    let params = match TrainConfig::from_arguments(config_path, matches) {
        Ok(params) => params,
        Err(e) => {
            log::error!("Invalid training configuration: {:#}", e);
            std::process::exit(1)
        }
    };
    if config_path.is_none() {
        let default_json = serde_json::to_string_pretty(&params).unwrap_or_default();
        log::info!("[croprec::train] Effective config:\n{}", default_json);
    }

    match trainer::run_training(&params) {
        Ok(report) => {
            println!("Accuracy: {:.4}", report.accuracy);
            Ok(())
        }
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_predict(matches: &ArgMatches) -> Result<()> {
    let params = match PredictConfig::from_arguments(matches) {
        Ok(params) => params,
        Err(e) => {
            log::error!("Invalid prediction input: {:#}", e);
            std::process::exit(1)
        }
    };

    match inference::run_inference(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Inference failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let mut config = ServiceConfig::default();
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.port = *port;
    }
    if let Some(model_path) = matches.get_one::<PathBuf>("model_path") {
        config.model_path = model_path.clone();
    }
    if let Some(data_path) = matches.get_one::<PathBuf>("data_path") {
        config.data_path = data_path.clone();
    }

    match serve::run_service(config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Service failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
