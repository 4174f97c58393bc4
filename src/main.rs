use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use log::debug;

use omp_lower::parser::{CaptureTable, HandledPragmaTable};
use omp_lower::passes::{self, LocatorOptions, LockRequest, PragmaLocator, RewriteOptions};
use omp_lower::{Config, Result};

/// Lower OpenMP pragmas in C sources to HClib runtime calls, one pass at a time.
#[derive(Parser, Debug)]
#[command(name = "omp-lower", version, about)]
struct Args {
    /// JSON file overriding runtime names and the expected header
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file (stdout when omitted or "-")
    #[arg(short, long, global = true, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Log pass details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pass: Pass,
}

#[derive(Subcommand, Debug)]
enum Pass {
    /// List pragma statements as `<start> <end> <pragma>`
    Locate {
        input: Option<PathBuf>,
        /// Only report pragmas of this file (as named by line markers)
        #[arg(long)]
        main_file: Option<String>,
        /// Also report pragmas of the internal namespace
        #[arg(long)]
        internal: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print `BODY <start> <end>` for the body_start/body_end pair
    Body { input: Option<PathBuf> },
    /// Stamp `# <line>` before every line of the main file
    TagLines {
        #[arg(long)]
        main_file: String,
        input: Option<PathBuf>,
    },
    /// Stamp the physical line number before every pragma line
    LabelPragmas { input: Option<PathBuf> },
    /// Insert capture structs described by a descriptor file
    InsertStructs {
        #[arg(long, value_name = "FILE")]
        descriptors: PathBuf,
        #[arg(long)]
        main_file: Option<String>,
        input: Option<PathBuf>,
    },
    /// Declare one lock per critical-section line in [start, end)
    InsertLocks {
        #[arg(long)]
        start: u32,
        #[arg(long)]
        end: u32,
        input: Option<PathBuf>,
    },
    /// Lower handled pragmas and drop line markers
    Rewrite {
        #[arg(long, value_name = "FILE")]
        handled: PathBuf,
        /// Add a per-line label to marker calls
        #[arg(long)]
        labels: bool,
        input: Option<PathBuf>,
    },
    /// Replace every pragma with a marker call
    MarkPragmas {
        #[arg(long)]
        labels: bool,
        input: Option<PathBuf>,
    },
    /// Wrap task pragmas in an #ifdef selecting the untied variant
    Untied { input: Option<PathBuf> },
    /// Print the effective configuration as JSON
    PrintConfig,
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p != Path::new("-") => Ok(Box::new(BufReader::new(File::open(p)?))),
        _ => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) if p != Path::new("-") => Ok(Box::new(BufWriter::new(File::create(p)?))),
        _ => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

fn main() {
    let args = Args::parse();
    if let Pass::InsertLocks { start, end, .. } = &args.pass {
        if start > end {
            Args::command()
                .error(
                    ErrorKind::ValueValidation,
                    format!("--start {start} is past --end {end}"),
                )
                .exit();
        }
    }

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    debug!("pass: {:?}", args.pass);

    let mut out = open_output(args.output.as_deref())?;

    match args.pass {
        Pass::Locate {
            input,
            main_file,
            internal,
            json,
        } => {
            let mut options = LocatorOptions::new(&config.namespace).main_file(main_file);
            if internal {
                options = options.with_namespace(&config.internal_namespace);
            }
            let locator = PragmaLocator::new(open_input(input.as_deref())?, options);
            let count = passes::write_spans(locator, &mut out, json)?;
            debug!("located {count} pragma(s)");
        }
        Pass::Body { input } => {
            let options = LocatorOptions::new(&config.internal_namespace);
            let locator = PragmaLocator::new(open_input(input.as_deref())?, options);
            if let Some(body) = passes::find_body(locator, &config.internal_namespace)? {
                writeln!(out, "{body}")?;
            }
        }
        Pass::TagLines { main_file, input } => {
            passes::tag_lines(open_input(input.as_deref())?, &mut out, &main_file)?;
        }
        Pass::LabelPragmas { input } => {
            passes::label_pragmas(open_input(input.as_deref())?, &mut out)?;
        }
        Pass::InsertStructs {
            descriptors,
            main_file,
            input,
        } => {
            let table = CaptureTable::load(&descriptors)?;
            debug!("{} capture descriptor(s)", table.len());
            passes::insert_structs(
                open_input(input.as_deref())?,
                &mut out,
                &table,
                main_file.as_deref(),
            )?;
        }
        Pass::InsertLocks { start, end, input } => {
            passes::insert_locks(
                open_input(input.as_deref())?,
                &mut out,
                LockRequest::new(start, end),
                &config,
            )?;
        }
        Pass::Rewrite {
            handled,
            labels,
            input,
        } => {
            let table = HandledPragmaTable::load(&handled)?;
            let options = RewriteOptions {
                config: &config,
                labels,
            };
            passes::rewrite(open_input(input.as_deref())?, &mut out, &table, &options)?;
        }
        Pass::MarkPragmas { labels, input } => {
            passes::mark_pragmas(open_input(input.as_deref())?, &mut out, &config, labels)?;
        }
        Pass::Untied { input } => {
            passes::make_untied_configurable(open_input(input.as_deref())?, &mut out, &config)?;
        }
        Pass::PrintConfig => {
            writeln!(out, "{}", config.to_json()?)?;
        }
    }

    out.flush()?;
    Ok(())
}
