//! NCM command - manage the allowed NCM prefix list.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use nfe_core::AllowedPrefixes;

use super::{load_config, save_config};

/// Arguments for the ncm command.
#[derive(Args)]
pub struct NcmArgs {
    #[command(subcommand)]
    command: NcmCommand,
}

#[derive(Subcommand)]
enum NcmCommand {
    /// Show the allowed prefixes
    Show,

    /// Replace the list with prefixes read from a file (comma- or newline-separated)
    Import {
        /// Text file with NCM prefixes
        file: PathBuf,
    },

    /// Replace the list with a comma-separated value
    Set {
        /// Prefixes, e.g. "28, 29, 39"
        list: String,
    },

    /// Restore the built-in list
    Reset,

    /// Check whether NCM codes pass the filter
    Check {
        /// NCM codes to check
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

pub async fn run(args: NcmArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        NcmCommand::Show => show(config_path),
        NcmCommand::Import { file } => {
            let text = fs::read_to_string(&file)?;
            replace(config_path, AllowedPrefixes::parse(&text))
        }
        NcmCommand::Set { list } => replace(config_path, AllowedPrefixes::parse(&list)),
        NcmCommand::Reset => replace(config_path, AllowedPrefixes::default()),
        NcmCommand::Check { codes } => check(config_path, &codes),
    }
}

fn show(config_path: Option<&str>) -> anyhow::Result<()> {
    let (config, _) = load_config(config_path)?;
    let prefixes = &config.filter.allowed_prefixes;

    println!(
        "{} {} allowed prefixes{}",
        style("ℹ").blue(),
        prefixes.len(),
        if *prefixes == AllowedPrefixes::default() { " (built-in list)" } else { "" }
    );
    println!("{}", prefixes);

    Ok(())
}

fn replace(config_path: Option<&str>, prefixes: AllowedPrefixes) -> anyhow::Result<()> {
    let (mut config, path) = load_config(config_path)?;

    if prefixes.is_empty() {
        println!(
            "{} The list is empty: filtered exports will contain no items.",
            style("!").yellow()
        );
    }

    let count = prefixes.len();
    config.filter.allowed_prefixes = prefixes;
    save_config(&config, &path)?;

    println!(
        "{} Saved {} allowed prefixes to {}",
        style("✓").green(),
        count,
        path.display()
    );

    Ok(())
}

fn check(config_path: Option<&str>, codes: &[String]) -> anyhow::Result<()> {
    let (config, _) = load_config(config_path)?;
    let prefixes = &config.filter.allowed_prefixes;

    for code in codes {
        let code = code.trim();
        match prefixes.matching_prefix(code) {
            Some(prefix) => println!(
                "{} {} allowed (prefix {})",
                style("✓").green(),
                code,
                prefix
            ),
            None => println!("{} {} not allowed", style("✗").red(), code),
        }
    }

    Ok(())
}
