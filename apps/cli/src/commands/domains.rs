//! Domains command implementation.

use aerocast_core::PipelineConfig;
use anyhow::Result;
use colored::Colorize;

pub fn execute(config: &PipelineConfig, json_output: bool) -> Result<()> {
    let domains = config
        .domains
        .keys()
        .map(|name| config.domain_spec(name))
        .collect::<Result<Vec<_>, _>>()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&domains)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Domains ({})", domains.len()).bold().cyan());
    println!();
    for domain in &domains {
        println!("  {} {}", domain.name.bold(), format!("(target fill: {})", domain.target_fill).dimmed());
        println!("    Targets: {}", domain.targets.join(", "));
        println!("    Train: {}", domain.train.features.path.display().to_string().dimmed());
        println!("    Test: {}", domain.test.features.path.display().to_string().dimmed());
    }
    println!();
    Ok(())
}
