//! Compact Binary CLI
//!
//! This binary provides command-line interfaces for:
//! - dump: render a Compact Binary document as JSON
//! - from-json: encode a JSON document as Compact Binary
//! - hash: print the content hash of a document
//! - validate: run structural validation
//! - pkg ls / unpack / create: inspect, extract and build packages

use bytes::Bytes;
use cb_codec::from_json;
use cb_format::{CbField, CbObject, Limits, ValidateMode};
use cb_io::{write_package, CbAttachment, CbPackage, PackageReader, ReadOptions};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cb")]
#[command(about = "Compact Binary document and package tool")]
#[command(version)]
struct Cli {
    /// Log debug events to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// JSON file with parsing limits; missing keys keep their defaults
    #[arg(long, global = true)]
    limits: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a Compact Binary document as JSON
    ///
    /// Examples:
    ///   cb dump doc.cb
    ///   cb dump doc.cb --compact
    Dump {
        /// Input file (.cb)
        input: PathBuf,
        /// Single-line output
        #[arg(long)]
        compact: bool,
    },
    /// Encode a JSON document as Compact Binary
    FromJson {
        /// Input file (.json)
        input: PathBuf,
        /// Output file (.cb)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the content hash of a Compact Binary document
    Hash {
        /// Input file (.cb)
        input: PathBuf,
    },
    /// Validate a Compact Binary document
    ///
    /// Examples:
    ///   cb validate doc.cb
    ///   cb validate doc.cb --mode names --mode format
    Validate {
        /// Input file (.cb)
        input: PathBuf,
        /// Extra checks on top of the structural ones
        #[arg(long, value_enum)]
        mode: Vec<ValidateCheck>,
    },
    /// Inspect, extract or build packages
    #[command(subcommand)]
    Pkg(PkgCommands),
}

#[derive(Subcommand)]
enum PkgCommands {
    /// List the package directory
    Ls {
        /// Input package
        input: PathBuf,
        /// Output format (table, json)
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },
    /// Extract the root and every attachment into a directory
    Unpack {
        /// Input package
        input: PathBuf,
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
        /// Skip attachment hash verification
        #[arg(long)]
        no_verify: bool,
    },
    /// Build a package from a root document and binary attachments
    ///
    /// Examples:
    ///   cb pkg create root.json blob1.bin blob2.bin -o bundle.cbpkg
    Create {
        /// Root object (.cb, or .json to encode it first)
        root: PathBuf,
        /// Files added as binary attachments, in order
        attachments: Vec<PathBuf>,
        /// Output package
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ValidateCheck {
    Names,
    Format,
    Padding,
    All,
}

impl ValidateCheck {
    fn mode(self) -> ValidateMode {
        match self {
            ValidateCheck::Names => ValidateMode::NAMES,
            ValidateCheck::Format => ValidateMode::FORMAT,
            ValidateCheck::Padding => ValidateMode::PADDING,
            ValidateCheck::All => ValidateMode::ALL,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let limits = load_limits(cli.limits.as_deref())?;

    match cli.command {
        Commands::Dump { input, compact } => handle_dump(&input, compact, &limits)?,
        Commands::FromJson { input, output } => handle_from_json(&input, &output)?,
        Commands::Hash { input } => handle_hash(&input)?,
        Commands::Validate { input, mode } => handle_validate(&input, &mode, &limits)?,
        Commands::Pkg(PkgCommands::Ls { input, format }) => {
            handle_pkg_ls(&input, format, limits)?
        }
        Commands::Pkg(PkgCommands::Unpack {
            input,
            output,
            no_verify,
        }) => handle_pkg_unpack(&input, &output, !no_verify, limits)?,
        Commands::Pkg(PkgCommands::Create {
            root,
            attachments,
            output,
        }) => handle_pkg_create(&root, &attachments, &output)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_limits(path: Option<&Path>) -> Result<Limits, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(Limits::default());
    };
    let file = File::open(path)
        .map_err(|err| format!("cannot open limits file {}: {}", path.display(), err))?;
    let limits: Limits = serde_json::from_reader(BufReader::new(file))?;
    tracing::debug!(?limits, "loaded limits");
    Ok(limits)
}

fn read_document(path: &Path) -> Result<CbField, Box<dyn Error>> {
    let bytes = Bytes::from(fs::read(path)?);
    let field = CbField::from_bytes(bytes).map_err(|err| {
        format!(
            "{} is not a Compact Binary document: {}",
            path.display(),
            err
        )
    })?;
    Ok(field)
}

fn handle_dump(input: &Path, compact: bool, limits: &Limits) -> Result<(), Box<dyn Error>> {
    let field = read_document(input)?;
    let value = field.to_json_with_limits(limits)?;
    let mut stdout = std::io::stdout().lock();
    write_json(&mut stdout, &value, compact)?;
    Ok(())
}

fn handle_from_json(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let value: Value = serde_json::from_reader(BufReader::new(File::open(input)?))?;
    let field = from_json(&value)?;
    fs::write(output, field.as_bytes())?;

    let mut stderr = std::io::stderr().lock();
    writeln!(
        &mut stderr,
        "Encoded {} to {} ({} bytes, hash {})",
        input.display(),
        output.display(),
        field.as_bytes().len(),
        field.hash()
    )?;
    Ok(())
}

fn handle_hash(input: &Path) -> Result<(), Box<dyn Error>> {
    let field = read_document(input)?;
    println!("{}", field.hash());
    Ok(())
}

fn handle_validate(
    input: &Path,
    checks: &[ValidateCheck],
    limits: &Limits,
) -> Result<(), Box<dyn Error>> {
    let mode = checks
        .iter()
        .fold(ValidateMode::DEFAULT, |mode, check| mode | check.mode());
    let bytes = Bytes::from(fs::read(input)?);
    cb_format::validate(bytes, mode, limits)?;
    println!("{}: ok", input.display());
    Ok(())
}

#[derive(Debug, Clone, serde::Serialize)]
struct EntrySummary {
    index: usize,
    kind: &'static str,
    size: u64,
    flags: u32,
    hash: String,
}

#[derive(Debug, Clone, serde::Serialize)]
struct PackageSummary {
    attachment_count: u32,
    entries: Vec<EntrySummary>,
}

fn entry_kind(entry: &cb_io::AttachmentEntry) -> &'static str {
    if entry.is_error() {
        "error"
    } else if entry.is_compressed() {
        "compressed"
    } else if entry.is_object() {
        "object"
    } else {
        "binary"
    }
}

fn handle_pkg_ls(input: &Path, format: LsFormat, limits: Limits) -> Result<(), Box<dyn Error>> {
    let file = BufReader::new(File::open(input)?);
    let opts = ReadOptions {
        limits,
        ..ReadOptions::default()
    };
    let reader = PackageReader::new(file, opts)?;
    let summary = PackageSummary {
        attachment_count: reader.header().attachment_count,
        entries: reader
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| EntrySummary {
                index,
                kind: entry_kind(entry),
                size: entry.payload_size,
                flags: entry.flags,
                hash: entry.hash.to_string(),
            })
            .collect(),
    };
    reader.close();

    let mut stdout = std::io::stdout().lock();
    match format {
        LsFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, &summary)?;
            writeln!(&mut stdout)?;
        }
        LsFormat::Table => {
            writeln!(
                &mut stdout,
                "Package {} ({} attachments)",
                input.display(),
                summary.attachment_count
            )?;
            writeln!(
                &mut stdout,
                "{:>6}  {:<10}  {:>12}  hash",
                "index", "kind", "size"
            )?;
            for entry in &summary.entries {
                writeln!(
                    &mut stdout,
                    "{:>6}  {:<10}  {:>12}  {}",
                    entry.index, entry.kind, entry.size, entry.hash
                )?;
            }
        }
    }
    Ok(())
}

fn handle_pkg_unpack(
    input: &Path,
    output: &Path,
    verify_hashes: bool,
    limits: Limits,
) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(output)?;
    let file = BufReader::new(File::open(input)?);
    let opts = ReadOptions {
        limits: limits.clone(),
        verify_hashes,
    };
    let mut reader = PackageReader::new(file, opts)?;

    let root = reader.root().clone();
    fs::write(output.join("root.cb"), root.to_bytes())?;
    let mut json = BufWriter::new(File::create(output.join("root.json"))?);
    write_json(&mut json, &root.as_field().to_json_with_limits(&limits)?, false)?;
    json.flush()?;

    let mut written = 0usize;
    for attachment in reader.attachments() {
        let (entry, data) = attachment?;
        let extension = if entry.is_object() && !entry.is_compressed() {
            "cb"
        } else {
            "bin"
        };
        let path = output.join(format!("{}.{}", entry.hash, extension));
        fs::write(&path, &data)?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "wrote attachment");
        written += 1;
    }

    let mut stderr = std::io::stderr().lock();
    writeln!(
        &mut stderr,
        "Unpacked {} to {} (root + {} attachments)",
        input.display(),
        output.display(),
        written
    )?;
    Ok(())
}

fn handle_pkg_create(
    root: &Path,
    attachments: &[PathBuf],
    output: &Path,
) -> Result<(), Box<dyn Error>> {
    let is_json = root
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let root_field = if is_json {
        let value: Value = serde_json::from_reader(BufReader::new(File::open(root)?))?;
        from_json(&value)?
    } else {
        read_document(root)?
    };
    let root_object = CbObject::from_field(root_field)
        .map_err(|_| format!("{} does not hold an object", root.display()))?;

    let mut package = CbPackage::new(root_object);
    for path in attachments {
        let hash = package.add_attachment(CbAttachment::binary(fs::read(path)?));
        tracing::debug!(path = %path.display(), %hash, "added attachment");
    }

    let written = write_package(&package, BufWriter::new(File::create(output)?))?;

    let mut stderr = std::io::stderr().lock();
    writeln!(
        &mut stderr,
        "Packed {} attachments to {} ({} bytes)",
        package.attachments.len(),
        output.display(),
        written
    )?;
    Ok(())
}

fn write_json<W: Write>(out: &mut W, value: &Value, compact: bool) -> Result<(), Box<dyn Error>> {
    if compact {
        serde_json::to_writer(&mut *out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}
