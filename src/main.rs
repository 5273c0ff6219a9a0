use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use csv2xlsx::discovery::parse_extensions;
use csv2xlsx::extract::{RangeFormat, write_range};
use csv2xlsx::ingestion::{
    CompositeObserver, ConvertObserver, ConvertOptions, FileObserver, IngestionRequest,
    StdErrObserver, convert,
};

#[derive(Parser)]
#[command(name = "csv2xlsx", version)]
#[command(about = "Copy CSV, TSV and text files into an Excel workbook, one sheet per file")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert input files into sheets of an .xlsx workbook
    Convert(ConvertArgs),
    /// Print a cell range of an existing workbook
    Get(GetArgs),
}

#[derive(Args)]
struct ConvertArgs {
    /// Input file or directory to convert
    #[arg(long, default_value = ".")]
    input: PathBuf,
    /// Output workbook; updated in place if it exists
    #[arg(long, default_value = "output.xlsx")]
    xlsx: PathBuf,
    /// Comma-separated extensions searched in input directories (csv, tsv, txt)
    #[arg(long, default_value = "csv,tsv")]
    ext: String,
    /// Maximum directory depth searched below the input directory
    #[arg(long, default_value_t = 0)]
    depth: usize,
    /// Decimal places for numeric cells (at most 30); negative keeps full precision
    #[arg(long, default_value_t = 2, allow_negative_numbers = true)]
    decimal_places: i64,
    /// Encoding of the input files (e.g. UTF-8, Shift_JIS)
    #[arg(long, default_value = "UTF-8")]
    encoding: String,
    /// Keep numbers with leading zeros (e.g. 007) as text
    #[arg(long)]
    keep_leading_zeros: bool,
    /// Append JSON log events to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Do not log progress to stderr
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Args)]
struct GetArgs {
    /// Workbook to read
    #[arg(long, default_value = "output.xlsx")]
    xlsx: PathBuf,
    /// Sheet to read
    #[arg(long, default_value = "Sheet1")]
    sheet: String,
    /// Cell or range, e.g. B2 or A1:C10
    #[arg(long, default_value = "A1")]
    range: String,
    /// Output layout: csv, tsv or list
    #[arg(long, default_value = "csv")]
    format: RangeFormat,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Get(args) => run_get(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_convert(args: ConvertArgs) -> csv2xlsx::ConvertResult<()> {
    let request = IngestionRequest {
        root_path: args.input,
        extensions: parse_extensions(&args.ext),
        max_depth: args.depth,
        decimal_places: decimal_places(args.decimal_places),
        encoding_name: args.encoding,
        output_path: args.xlsx,
        preserve_leading_zeros: args.keep_leading_zeros,
    };

    let mut observers: Vec<Arc<dyn ConvertObserver>> = Vec::new();
    if !args.quiet {
        observers.push(Arc::new(StdErrObserver));
    }
    if let Some(path) = args.log_file {
        observers.push(Arc::new(FileObserver::new(path)));
    }
    let options = ConvertOptions {
        observer: Some(Arc::new(CompositeObserver::new(observers))),
        ..Default::default()
    };

    convert(&request, &options).map(|_| ())
}

/// Negative means full precision; values past `u32` saturate and fail request validation.
fn decimal_places(value: i64) -> Option<u32> {
    (value >= 0).then(|| u32::try_from(value).unwrap_or(u32::MAX))
}

fn run_get(args: GetArgs) -> csv2xlsx::ConvertResult<()> {
    let stdout = std::io::stdout();
    write_range(&args.xlsx, &args.sheet, &args.range, args.format, &mut stdout.lock())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, decimal_places};
    use csv2xlsx::ConvertError;
    use csv2xlsx::extract::RangeFormat;
    use csv2xlsx::ingestion::IngestionRequest;

    #[test]
    fn get_defaults() {
        let cli = Cli::try_parse_from(["csv2xlsx", "get"]).unwrap();
        let Commands::Get(args) = cli.command else {
            panic!("expected the get subcommand");
        };
        assert_eq!(args.xlsx.to_str(), Some("output.xlsx"));
        assert_eq!(args.sheet, "Sheet1");
        assert_eq!(args.range, "A1");
        assert_eq!(args.format, RangeFormat::Csv);
    }

    #[test]
    fn oversized_decimal_places_reach_validation() {
        let cli = Cli::try_parse_from(["csv2xlsx", "convert", "--decimal-places", "70000"]).unwrap();
        let Commands::Convert(args) = cli.command else {
            panic!("expected the convert subcommand");
        };
        assert_eq!(decimal_places(args.decimal_places), Some(70_000));
        assert_eq!(decimal_places(-1), None);
        assert_eq!(decimal_places(i64::MAX), Some(u32::MAX));

        let mut request = IngestionRequest::new(".", "output.xlsx");
        request.decimal_places = decimal_places(args.decimal_places);
        assert!(matches!(request.validate(), Err(ConvertError::InvalidOption(_))));
        request.decimal_places = decimal_places(30);
        assert!(request.validate().is_ok());
    }
}
