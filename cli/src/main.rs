use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use protoc_adapter::{entities_to_json, matches_to_json, EntityArena};
use protoc_adapter_compiler::error::AdapterError;
use protoc_adapter_compiler::{Frontend, Pipeline, ReplyEnvelopeConfig, SchemaLanguage};

const IDL_EXTENSIONS: &[&str] = &["proto"];
const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx"];

#[derive(Parser)]
#[command(name = "protoc-adapter")]
#[command(about = "Match .proto messages against C/C++ header structs", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match every `.proto` message under a directory against every header struct
    Match {
        /// Directory scanned recursively for `.proto` and header files
        #[arg(short, long)]
        working_path: PathBuf,

        /// Output JSON report (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file overriding the reply-envelope convention
        #[arg(long)]
        envelope_config: Option<PathBuf>,

        /// Disable the reply-envelope convention
        #[arg(long, conflicts_with = "envelope_config")]
        no_envelope: bool,
    },

    /// Parse a single `.proto` or header file and print its entities as JSON
    Entities {
        /// Input `.proto`, `.h`, `.hpp`, `.hh` or `.hxx` file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), AdapterError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Match { working_path, output, envelope_config, no_envelope } => {
            let idl_files    = discover(working_path, IDL_EXTENSIONS)?;
            let header_files = discover(working_path, HEADER_EXTENSIONS)?;
            if idl_files.is_empty() {
                return Err(AdapterError::MissingInput(format!(
                    "no .proto files found under {}",
                    working_path.display()
                )));
            }
            if header_files.is_empty() {
                return Err(AdapterError::MissingInput(format!(
                    "no C/C++ header files found under {}",
                    working_path.display()
                )));
            }
            info!(idl = idl_files.len(), headers = header_files.len(), "discovered input files");

            let mut pipeline = Pipeline::new();
            if !no_envelope {
                let config = match envelope_config {
                    Some(path) => ReplyEnvelopeConfig::from_json(&fs::read_to_string(path)?)?,
                    None => ReplyEnvelopeConfig::default(),
                };
                pipeline = pipeline.with_reply_envelope(config);
            }

            for path in &idl_files {
                load(&mut pipeline, SchemaLanguage::Idl, path)?;
            }
            for path in &header_files {
                load(&mut pipeline, SchemaLanguage::Header, path)?;
            }

            let model = pipeline.run()?;
            info!(matches = model.matches.len(), "matched entities");

            let json = matches_to_json(&model)?;
            if let Some(out_path) = output {
                fs::write(out_path, &json)?;
                println!("Match report written to {}", out_path.display());
            } else {
                println!("{}", json);
            }
            Ok(())
        }

        Commands::Entities { input } => {
            let language = SchemaLanguage::from_path(input).ok_or_else(|| {
                AdapterError::Config(format!("unrecognized schema file extension: {}", input.display()))
            })?;
            let text = fs::read_to_string(input)?;

            let mut arena = EntityArena::new();
            language.frontend().load(&text, &input.display().to_string(), &mut arena)?;
            println!("{}", entities_to_json(&arena)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Every file under `root` with one of `extensions`, sorted.
fn discover(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, AdapterError> {
    if !root.is_dir() {
        return Err(AdapterError::MissingInput(format!("{} is not a directory", root.display())));
    }
    let root = root.to_str().ok_or_else(|| {
        AdapterError::Config(format!("working path is not valid UTF-8: {}", root.display()))
    })?;
    let escaped = glob::Pattern::escape(root);

    let mut files = Vec::new();
    for ext in extensions {
        let pattern = format!("{}/**/*.{}", escaped, ext);
        let paths = glob::glob(&pattern).map_err(|e| AdapterError::Config(e.to_string()))?;
        for entry in paths {
            files.push(entry.map_err(|e| AdapterError::Io(e.into_error()))?);
        }
    }
    files.sort();
    Ok(files)
}

fn load(pipeline: &mut Pipeline, language: SchemaLanguage, path: &Path) -> Result<(), AdapterError> {
    let text = fs::read_to_string(path)?;
    let ids = pipeline.add_source(language, &text, &path.display().to_string())?;
    debug!(file = %path.display(), entities = ids.len(), "parsed");
    Ok(())
}
