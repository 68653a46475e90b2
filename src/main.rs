use std::{env, fs};

use anyhow::{Context, Result};
use log::info;
use orchestrator::configs::SearchConfig;

const DEFAULT_CONFIG: &str = "demos/sweep.json";

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let raw = fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
    let config: SearchConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing config {path}"))?;
    info!("loaded config from {path}");

    let report = orchestrator::run(&config)?;
    println!("{report}");

    if let Some(report_path) = &config.report_path {
        report
            .write_json(report_path)
            .with_context(|| format!("writing report to {}", report_path.display()))?;
        info!("wrote sweep surface to {}", report_path.display());
    }

    Ok(())
}
