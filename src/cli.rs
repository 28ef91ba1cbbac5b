use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Decode survey exports into tidy, chart-ready data", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the configured question metadata
    Questions(QuestionsArgs),
    /// Decode one question into tidy (respondent, group, value) records
    Tidy(TidyArgs),
    /// Run the full pipeline and emit chart-spec JSON
    Chart(ChartArgs),
}

#[derive(Debug, Args)]
pub struct QuestionsArgs {
    /// JSON metadata overrides merged over the built-in question tables
    #[arg(short, long)]
    pub meta: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TidyArgs {
    /// Input survey export ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Question id to decode (e.g. PL2)
    #[arg(short, long)]
    pub question: String,
    /// Output CSV file (formatted table to stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// JSON metadata overrides merged over the built-in question tables
    #[arg(short, long)]
    pub meta: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Respondent key column name
    #[arg(long = "respondent-column", default_value = crate::frame::DEFAULT_RESPONDENT_COLUMN)]
    pub respondent_column: String,
    /// Reference year for birth-year questions
    #[arg(long = "reference-year", default_value_t = crate::tidy::DEFAULT_REFERENCE_YEAR)]
    pub reference_year: i64,
}

#[derive(Debug, Args)]
pub struct ChartArgs {
    /// Input survey export ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Question id to chart; omit to process every configured question
    #[arg(short, long)]
    pub question: Option<String>,
    /// Directory to write one chart-spec JSON per question
    #[arg(short = 'o', long = "output-dir")]
    pub output_dir: Option<PathBuf>,
    /// JSON metadata overrides merged over the built-in question tables
    #[arg(short, long)]
    pub meta: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Respondent key column name
    #[arg(long = "respondent-column", default_value = crate::frame::DEFAULT_RESPONDENT_COLUMN)]
    pub respondent_column: String,
    /// Reference year for birth-year questions
    #[arg(long = "reference-year", default_value_t = crate::tidy::DEFAULT_REFERENCE_YEAR)]
    pub reference_year: i64,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
