use crate::config::{BridgeOptions, Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Add a diagnostics server section using the default server command
    #[arg(long)]
    pub with_bridge: bool,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing windlint...".bright_blue().bold());

    let config = Config {
        bridge: args.with_bridge.then(BridgeOptions::default),
        ..Config::default()
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ windlint initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Adjust rule levels in {}", DEFAULT_CONFIG_NAME);
    println!("  2. Run: windlint lint src");
    println!("  3. Apply safe fixes: windlint lint src --fix");

    Ok(())
}
