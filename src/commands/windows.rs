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

    println!("📅 Historical windows (lookback {})\n", config.lookback);
    println!("   {:<6} {:>8}", "Label", "Days");
    for window in &config.windows {
        println!("   {:<6} {:>8}", window.label, window.offset);
    }
}
