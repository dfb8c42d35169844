//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{OutreachCommand, RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Agent pipelines for pharmaceutical marketing campaigns
#[derive(Debug, Parser, Clone)]
#[command(name = "campaign")]
#[command(version = "0.1.0")]
#[command(about = "Runs LLM agent pipelines for pharmaceutical marketing campaigns", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to campaign configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the marketing agency pipeline for a brief
    Run(RunCommand),

    /// Review a company's marketing pages and draft outreach
    Outreach(OutreachCommand),

    /// Validate a campaign configuration
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
