use clap::{Arg, Command};
use log::LevelFilter;
use phishguard::{Config, EmailParts, EmailRiskEngine, HeuristicTextClassifier};
use std::path::Path;
use std::process;

fn main() {
    let matches = Command::new("phishguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Phishing risk scoring for emails carrying SVG payloads")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (YAML)"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Output machine-readable JSON instead of the text report")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("email")
                .value_name("EML_FILE")
                .help("Raw RFC 5322 message to analyze")
                .required_unless_present("generate-config"),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        if let Err(e) = Config::generate_default(Path::new(generate_path)) {
            eprintln!("Error generating configuration: {e}");
            process::exit(1);
        }
        println!("Default configuration written to {generate_path}");
        return;
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading configuration: {e}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let email_path = matches.get_one::<String>("email").unwrap();
    let raw = match std::fs::read(email_path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error reading {email_path}: {e}");
            process::exit(1);
        }
    };

    // Unparseable message structure is the one fatal error in the pipeline.
    let parts = match EmailParts::from_bytes(&raw) {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error analyzing {email_path}: {e}");
            process::exit(1);
        }
    };

    let classifier = Box::new(HeuristicTextClassifier::new());
    let engine = EmailRiskEngine::new(config, Some(classifier));
    let report = engine.analyze(&parts);

    if matches.get_flag("json") {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                process::exit(1);
            }
        }
    } else {
        println!("{}", report.render());
    }
}
