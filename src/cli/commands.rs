//! CLI command definitions

use clap::Args;
use serde_json::Value;

/// Run the marketing agency pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Campaign brief text
    #[arg(short, long, conflicts_with = "brief_file")]
    pub brief: Option<String>,

    /// Read the campaign brief from a file
    #[arg(long)]
    pub brief_file: Option<String>,

    /// Default overrides (key=value), e.g. --default brand="Acme Bio"
    #[arg(long = "default", value_parser = parse_default)]
    pub defaults: Vec<(String, Value)>,

    /// Where to write the deployment report (overrides the config)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Skip writing the deployment report
    #[arg(long)]
    pub no_deploy: bool,

    /// Print the final context as JSON
    #[arg(long)]
    pub json: bool,
}

/// Review a company's website and draft outreach
#[derive(Debug, Args, Clone)]
pub struct OutreachCommand {
    /// The company's website
    #[arg(short = 'u', long)]
    pub company_url: String,

    /// Print the final context as JSON
    #[arg(long)]
    pub json: bool,
}

/// Validate a campaign configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 || parts[0].trim().is_empty() {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].trim().to_string(), parts[1].to_string()))
}

/// Parse a default override; JSON scalars keep their type, anything else is a string
pub fn parse_default(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = parse_key_value(s)?;
    let value = match serde_json::from_str::<Value>(&raw) {
        Ok(value @ (Value::Number(_) | Value::Bool(_))) => value,
        _ => Value::String(raw),
    };
    Ok((key, value))
}
