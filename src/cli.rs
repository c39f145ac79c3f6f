use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dirsize-alert")]
#[command(about = "Check directory sizes against thresholds and email an alert", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(short, long, help = "Path to configuration file [default: ./dirsize-alert.toml]")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Compose the report and print it instead of sending")]
    pub dry_run: bool,
    #[arg(short = 'F', long, default_value = "human")]
    pub format: OutputFormat,
    #[arg(short, long, help = "Write the JSON summary to a file")]
    pub out: Option<PathBuf>,
    #[arg(long, help = "Also append log output to this file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Human
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}
