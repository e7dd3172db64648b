pub mod document;
pub mod emit_c;
pub mod emit_python;
pub mod enums;
pub mod error;
pub mod naming;
pub mod record;
pub mod schema;
pub mod types;
pub mod wire;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};

pub use document::{Document, MessageKind};
pub use error::{ConfigError, SchemaError};
pub use record::{CanonicalRecord, canonicalize, canonicalize_document, check_unique_ids};

/// Generates C and Python telecommand/telemetry sources from a JSON definition.
#[derive(Debug, Parser)]
#[command(name = "tmtc-codegen", version)]
pub struct Args {
    /// Message definition document [default: msgs/tmtc.json]
    pub input: Option<PathBuf>,
    /// Directory receiving the `c/` and `py/` trees [default: generated]
    pub output_dir: Option<PathBuf>,
    /// Target to generate
    #[arg(short, long, value_enum, default_value_t = LanguageSelection::All)]
    pub lang: LanguageSelection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LanguageSelection {
    C,
    Python,
    All,
}

impl LanguageSelection {
    pub fn targets(self) -> &'static [TargetLanguage] {
        match self {
            LanguageSelection::C => &[TargetLanguage::C],
            LanguageSelection::Python => &[TargetLanguage::Python],
            LanguageSelection::All => &[TargetLanguage::C, TargetLanguage::Python],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetLanguage {
    C,
    Python,
}

impl TargetLanguage {
    pub fn display_name(self) -> &'static str {
        match self {
            TargetLanguage::C => "C99",
            TargetLanguage::Python => "Python",
        }
    }

    /// Renders every record for this target.
    pub fn generate(self, records: &[CanonicalRecord], input_path: &Path) -> Vec<OutputFile> {
        match self {
            TargetLanguage::C => emit_c::generate(records, input_path),
            TargetLanguage::Python => emit_python::generate(records, input_path),
        }
    }
}

/// A generated file, relative to the output root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
}

pub fn run() -> Result<()> {
    run_with(Args::parse())
}

pub fn run_with(args: Args) -> Result<()> {
    let input_path = args
        .input
        .unwrap_or_else(|| resolve_default_path("msgs/tmtc.json", "../msgs/tmtc.json"));
    let output_dir = args.output_dir.unwrap_or_else(|| PathBuf::from("generated"));

    let document = load_document(&input_path)?;
    if document.message_count() == 0 {
        bail!("no message definitions found in {}", input_path.display());
    }
    if document.telemetries.is_empty() {
        warn!(input = %input_path.display(), "document defines no telemetry");
    }
    if document.telecommands.is_empty() {
        warn!(input = %input_path.display(), "document defines no telecommands");
    }

    let records = canonicalize_document(&document)
        .with_context(|| format!("invalid message definition in {}", input_path.display()))?;
    check_unique_ids(&records)?;

    let mut written = 0;
    for &language in args.lang.targets() {
        let files = language.generate(&records, &input_path);
        write_outputs(&output_dir, &files)?;
        info!(
            target_language = language.display_name(),
            files = files.len(),
            output = %output_dir.display(),
            "emitted sources"
        );
        written += files.len();
    }

    println!(
        "Generated {} file(s) under {} for {} message definition(s).",
        written,
        output_dir.display(),
        records.len()
    );

    Ok(())
}

pub fn load_document(input_path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(input_path)
        .with_context(|| format!("failed to read input JSON: {}", input_path.display()))?;
    Document::from_json_str(&raw).context("failed to parse message definition JSON")
}

/// Writes `files` under `output_dir`, creating directories as needed.
pub fn write_outputs(output_dir: &Path, files: &[OutputFile]) -> Result<()> {
    for file in files {
        let path = output_dir.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory {}", parent.display())
            })?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write output to {}", path.display()))?;
    }
    Ok(())
}

fn resolve_default_path(primary: &str, fallback: &str) -> PathBuf {
    let primary_path = PathBuf::from(primary);
    if primary_path.exists() {
        primary_path
    } else {
        PathBuf::from(fallback)
    }
}
