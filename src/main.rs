//! csv-spans CLI - CSV shape inspector

use clap::Parser;
use csv_spans::{CsvError, Reader, ReaderBuilder, Trim};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Zero-copy CSV scanner.
///
/// Prints the row and column counts and the header of each file, and
/// optionally checks that every row has the same number of columns.
#[derive(Parser, Debug)]
#[command(name = "csv-spans")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file(s); names ending in .gz are decompressed
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Field delimiter (single character)
    #[arg(short = 'd', long, default_value = ",")]
    delimiter: char,

    /// Quote character (single character)
    #[arg(short = 'q', long, default_value = "\"")]
    quote: char,

    /// Trim spaces around cells when printing the header
    #[arg(short = 't', long)]
    trim: bool,

    /// Check that every row has the column count of the first row
    #[arg(long)]
    validate: bool,

    /// Print the header row
    #[arg(long)]
    header: bool,

    /// Skip this many rows before reading
    #[arg(long, default_value = "0")]
    skip: usize,

    /// Skip rows holding no data
    #[arg(long)]
    ignore_empty_rows: bool,

    /// Warn about fields longer than this many bytes
    #[arg(long)]
    max_field_size: Option<u32>,

    /// Output format: text (default) or json
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// What was learned about one file.
#[derive(Debug)]
struct Report {
    rows: usize,
    cols: usize,
    valid: Option<Result<(), String>>,
    header: Option<Vec<String>>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let builder = match configure(&args) {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let reports: Vec<_> = args
        .files
        .par_iter()
        .map(|file| (file, scan_file(file, &builder, &args)))
        .collect();

    let mut exit_code = ExitCode::SUCCESS;
    for (file, report) in reports {
        match report {
            Ok(report) => {
                if matches!(report.valid, Some(Err(_))) {
                    exit_code = ExitCode::FAILURE;
                }
                match args.format {
                    OutputFormat::Text => print_text_output(file, &report),
                    OutputFormat::Json => print_json_output(file, &report),
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", file.display(), e);
                exit_code = ExitCode::FAILURE;
            }
        }
    }

    exit_code
}

fn single_byte(name: &str, c: char) -> Result<u8, CsvError> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| CsvError::InvalidConfig(format!("{name} must be a single ASCII byte")))
}

fn configure(args: &Args) -> Result<ReaderBuilder, CsvError> {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(single_byte("delimiter", args.delimiter)?)
        .quote(single_byte("quote", args.quote)?)
        .ignore_empty_rows(args.ignore_empty_rows)
        .notification_handler(|n| {
            tracing::warn!("{n}");
            Ok(())
        });
    if args.trim {
        builder.trim(Trim::Spaces);
    }
    if let Some(limit) = args.max_field_size {
        builder.max_field_size(limit);
    }
    Ok(builder)
}

fn scan_file(path: &Path, builder: &ReaderBuilder, args: &Args) -> Result<Report, CsvError> {
    let mut reader = builder.from_path(path)?;
    reader.skip_rows(args.skip)?;

    let rows = reader.rows()?;
    let cols = reader.cols()?;

    let valid = if args.validate {
        Some(match reader.validate() {
            Ok(_) => Ok(()),
            Err(CsvError::Shape(e)) => Err(e.to_string()),
            Err(e) => return Err(e),
        })
    } else {
        None
    };

    let header = if args.header {
        Some(
            reader
                .header()?
                .iter()
                .map(|cell| cell.unquoted_string())
                .collect::<Result<Vec<_>, _>>()?,
        )
    } else {
        None
    };

    Ok(Report {
        rows,
        cols,
        valid,
        header,
    })
}

fn print_text_output(path: &Path, report: &Report) {
    println!("File: {}", path.display());
    println!("  Rows: {}", report.rows);
    println!("  Columns: {}", report.cols);

    match &report.valid {
        Some(Ok(())) => println!("  Shape: valid"),
        Some(Err(msg)) => println!("  Shape: invalid ({msg})"),
        None => {}
    }

    if let Some(header) = &report.header {
        println!("  Header:");
        for (i, name) in header.iter().enumerate() {
            println!("    {}: {}", i + 1, name);
        }
    }

    println!();
}

/// Escape a string for a JSON string literal.
fn json_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn print_json_output(path: &Path, report: &Report) {
    print!(
        r#"{{"file":"{}","rows":{},"cols":{}"#,
        json_escape(&path.display().to_string()),
        report.rows,
        report.cols
    );

    match &report.valid {
        Some(Ok(())) => print!(r#","valid":true"#),
        Some(Err(msg)) => print!(r#","valid":false,"error":"{}""#, json_escape(msg)),
        None => {}
    }

    if let Some(header) = &report.header {
        print!(r#","header":["#);
        for (i, name) in header.iter().enumerate() {
            if i > 0 {
                print!(",");
            }
            print!(r#""{}""#, json_escape(name));
        }
        print!("]");
    }

    println!("}}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_escape() {
        assert_eq!(json_escape(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(json_escape("x\ny"), "x\\ny");
        assert_eq!(json_escape("\u{1}"), "\\u0001");
    }

    #[test]
    fn test_single_byte() {
        assert_eq!(single_byte("delimiter", ';').unwrap(), b';');
        assert!(single_byte("delimiter", 'é').is_err());
    }
}
