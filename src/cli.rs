//! CLI argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Custom champion skin maker: AI splash art or a local framed portrait.
#[derive(Parser, Debug)]
#[command(name = "skinmaker", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Turn a photo into a champion skin and print the JSON result.
    Generate(GenerateArgs),
    /// Report whether the API path is usable.
    Health,
}

/// Arguments for `generate`.
#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Photo to transform.
    pub photo: PathBuf,

    /// Champion name.
    #[arg(short, long)]
    pub champion: String,

    /// Use the local pipeline instead of the generation API.
    #[arg(short, long)]
    pub local: bool,

    /// Model name or short alias (defaults to the config value, `nano-banana`).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Directory to store the result in (defaults to the config value, `uploads`).
    #[arg(short, long)]
    pub upload_dir: Option<PathBuf>,
}
