use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "Filter ticket sheets and summarize IDEAL / NÃO IDEAL verdicts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show counts, percentages and the dominant-type insight for the filtered tickets
    Summary(SummaryArgs),
    /// Write the filtered tickets as CSV (or render them as a table)
    Filter(FilterArgs),
    /// Fuzzy-search the distinct values of the type or analysis column
    Search(SearchArgs),
    /// List the analysis options and the type options they cascade to
    Options(OptionsArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Ticket sheet to load: CSV/TSV, or an .xlsx/.xls/.ods workbook (`-` reads CSV from stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Optional YAML configuration (column names, labels, fuzzy settings)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Worksheet to read from a workbook input (defaults to the first one)
    #[arg(long = "sheet")]
    pub sheet: Option<String>,
}

#[derive(Debug, Args, Default)]
pub struct SelectionArgs {
    /// Case-insensitive substring of the ticket id
    #[arg(short = 't', long = "ticket")]
    pub ticket: Option<String>,
    /// Allowed type values (comma separated). Passing the flag without values selects nothing
    #[arg(long = "type", num_args = 0.., value_delimiter = ',')]
    pub types: Option<Vec<String>>,
    /// Keep only the type options best matching this free-text search
    #[arg(long = "type-search")]
    pub type_search: Option<String>,
    /// Allowed analysis values (comma separated). Passing the flag without values selects nothing
    #[arg(short = 'a', long = "analysis", num_args = 0.., value_delimiter = ',')]
    pub analyses: Option<Vec<String>>,
    /// Extra equality constraint such as `Canal=app`
    #[arg(long = "where")]
    pub column_equals: Option<String>,
    /// Earliest ticket date to keep (inclusive)
    #[arg(long = "from", value_parser = parse_date)]
    pub from: Option<chrono::NaiveDate>,
    /// Latest ticket date to keep (inclusive)
    #[arg(long = "to", value_parser = parse_date)]
    pub to: Option<chrono::NaiveDate>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Emit the metrics as JSON instead of tables
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults to ',')
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Render the filtered rows as a table on stdout
    #[arg(long = "table", conflicts_with = "output")]
    pub table: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum SearchField {
    #[default]
    Type,
    Analysis,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Free-text query
    #[arg(short = 'q', long = "query")]
    pub query: String,
    /// Column role to search
    #[arg(long = "field", value_enum, default_value_t = SearchField::Type)]
    pub field: SearchField,
    /// Maximum number of matches (defaults to the configured limit)
    #[arg(short = 'n', long = "limit")]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Analysis values the type options should cascade from
    #[arg(short = 'a', long = "analysis", value_delimiter = ',')]
    pub analyses: Vec<String>,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "pipe" => Ok(b'|'),
        other if other.len() == 1 => Ok(other.as_bytes()[0]),
        other => Err(format!("Unsupported delimiter '{other}'")),
    }
}

fn parse_date(value: &str) -> Result<chrono::NaiveDate, String> {
    crate::dataset::parse_naive_date(value).ok_or_else(|| format!("Invalid date '{value}'"))
}
