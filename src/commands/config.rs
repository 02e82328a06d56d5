use std::path::PathBuf;

use crate::models::MarketConfig;

pub fn run(config_path: Option<PathBuf>) {
    let config = match MarketConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&config) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("❌ Failed to serialize configuration: {}", e);
            std::process::exit(1);
        }
    }
}
