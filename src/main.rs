use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::LevelFilter;
use tacalc::{Calculator, Event, Options};

/// Translate a tiny typed expression language into three-address code.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
  /// Source files, run in order against one shared set of variables.
  #[arg(default_value = "input.txt")]
  inputs: Vec<PathBuf>,

  /// Report syntax errors and resume after the next ';'.
  #[arg(short, long)]
  recover: bool,

  /// Log each statement, emitted fragment and temporary to stderr.
  #[arg(short, long)]
  verbose: bool,
}

fn main() {
  let args = Args::parse();

  let mut logger = env_logger::Builder::from_default_env();
  if args.verbose {
    logger.filter_level(LevelFilter::Debug);
  }
  logger.init();

  let mut calc = Calculator::with_options(Options {
    recover_syntax_errors: args.recover,
  });

  for path in &args.inputs {
    let source = match fs::read_to_string(path) {
      Ok(source) => source,
      Err(err) if err.kind() == IoErrorKind::NotFound => {
        eprintln!("Error: File '{}' not found", path.display());
        process::exit(1);
      }
      Err(err) => {
        eprintln!("Error: {}: {err}", path.display());
        process::exit(1);
      }
    };

    let report = calc.parse(&source);
    for event in &report.events {
      match event {
        Event::Generated(code) => println!("Result: {code}"),
        Event::Diagnostic(err) => {
          eprintln!("{err}");
          if let Some(snippet) = err.snippet() {
            eprintln!("{snippet}");
          }
        }
      }
    }

    if let Some(err) = report.error {
      eprintln!("Parsing error: {err}");
      if let Some(snippet) = err.snippet() {
        eprintln!("{snippet}");
      }
      process::exit(1);
    }
  }
}
