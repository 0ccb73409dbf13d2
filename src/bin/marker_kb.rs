//! Load a marker knowledge-base directory and print what it contains.
//!
//! By default prints one summary line per marker set. `--json` prints the
//! loaded records as a JSON array; `--report` prints the outcome of every file
//! in the directory, including skipped and rejected ones, without failing on
//! per-file errors. Log output goes to stderr and follows `RUST_LOG`.

use anyhow::{Context, Result, bail};
use markerkb::{FileStatus, MarkerLoader, SEED_SETS_RELATIVE_PATH, find_kb_root};
use std::env;
use std::path::PathBuf;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let args = CliArgs::parse()?;
    let loader = match &args.schema {
        Some(path) => MarkerLoader::with_schema_path(path),
        None => MarkerLoader::new()?,
    };
    let dir = match args.dir {
        Some(dir) => dir,
        None => find_kb_root()?.join(SEED_SETS_RELATIVE_PATH),
    };

    match args.mode {
        OutputMode::Summary => {
            let catalog = loader.load_directory(&dir)?;
            for marker in catalog.iter() {
                println!(
                    "{} v{} ({} keywords, {} hints, languages: {})",
                    marker.name(),
                    marker.version(),
                    marker.keywords().len(),
                    marker.semantic_hints().len(),
                    marker
                        .prompt_inserts()
                        .keys()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(",")
                );
            }
        }
        OutputMode::Json => {
            let catalog = loader.load_directory(&dir)?;
            let rendered = serde_json::to_string_pretty(catalog.markers())
                .context("failed to serialize marker sets")?;
            println!("{rendered}");
        }
        OutputMode::Report => {
            let report = loader.scan_directory(&dir)?;
            for file in &report.files {
                let name = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match &file.status {
                    FileStatus::Loaded { name: marker } => println!("loaded  {name}: {marker}"),
                    FileStatus::Skipped { reason } => {
                        println!("skipped {name}: {}", reason.as_str())
                    }
                    FileStatus::Failed { error } => println!("failed  {name}: {error}"),
                }
            }
            println!(
                "{} loaded, {} failed in {}",
                report.markers.len(),
                report.failure_count(),
                report.root.display()
            );
        }
    }

    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Summary,
    Json,
    Report,
}

struct CliArgs {
    mode: OutputMode,
    schema: Option<PathBuf>,
    dir: Option<PathBuf>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args_os().skip(1);
        let mut mode = OutputMode::Summary;
        let mut schema = None;
        let mut dir = None;

        while let Some(arg) = args.next() {
            let arg_str = arg.to_str().context("Invalid UTF-8 in argument")?;
            match arg_str {
                "--json" => mode = OutputMode::Json,
                "--report" => mode = OutputMode::Report,
                "--schema" => {
                    let value = args.next().context("--schema requires a path")?;
                    schema = Some(PathBuf::from(value));
                }
                "--help" | "-h" => usage(0),
                flag if flag.starts_with('-') => bail!("unknown flag: {flag}"),
                _ => {
                    if dir.is_some() {
                        bail!("only one directory may be given");
                    }
                    dir = Some(PathBuf::from(arg));
                }
            }
        }

        Ok(Self { mode, schema, dir })
    }
}

fn usage(code: i32) -> ! {
    eprintln!(
        "Usage: marker-kb [--schema <path>] [--json | --report] [dir]\n\nLoads every marker set in <dir> (default: the seed sets under the knowledge-base root).\n\nOptions:\n  --schema <path>  Validate against this schema instead of kb/schema/marker.schema.json.\n  --json           Print the loaded marker sets as JSON.\n  --report         Print the outcome of every file, including skipped and failed ones."
    );
    std::process::exit(code);
}
