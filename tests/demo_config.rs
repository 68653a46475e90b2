use std::fs;

use orchestrator::configs::{DatasetConfig, SearchConfig};

#[test]
fn demo_config_is_valid() {
    let raw = fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/demos/sweep.json")).unwrap();
    let config: SearchConfig = serde_json::from_str(&raw).unwrap();

    config.validate().unwrap();
    assert_eq!(config.learning_rates.len() * config.momenta.len(), 20);
    assert!(matches!(config.train, DatasetConfig::Synthetic { len: 1000, .. }));
}
