//! `lro config` – show where the config lives and what is in effect.

use anyhow::Result;
use lro_core::config::{self, LroConfig};

pub fn run_config(cfg: &LroConfig) -> Result<()> {
    println!("Config file: {}", config::config_path()?.display());
    println!("{:#?}", cfg);
    let effective = cfg.orchestrator_config();
    println!(
        "Poll delay: default {:?}, bounds [{:?}, {:?}]; resubmissions: {}",
        effective.default_delay,
        effective.backoff.min,
        effective.backoff.max,
        effective.max_resubmissions
    );
    Ok(())
}
