use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use schemavis::{DatabaseType, DdlImporter, Dialect, SvgRenderer, import_and_layout, load_config};

#[derive(Parser, Debug)]
#[command(name = "schemavis", version, about = "Import a SQL schema and lay it out as an ER diagram")]
struct Args {
    /// SQL file, or '-' for stdin
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source dialect: auto, generic, postgresql, mysql, sqlite
    #[arg(short, long, default_value = "auto")]
    source: String,

    /// Target database type (default: follows the source dialect)
    #[arg(short, long)]
    target: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: Format,

    /// Layout config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Json,
    Svg,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let Some(source) = Dialect::from_str(&args.source) else {
        bail!("unknown source dialect: {}", args.source);
    };
    let sql = read_input(&args.input)?;
    let target = match args.target.as_deref() {
        Some(name) => match DatabaseType::from_str(name) {
            Some(target) => target,
            None => bail!("unknown target database: {name}"),
        },
        None => source.resolve(&sql).database_type(),
    };

    let name = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| *s != "-")
        .unwrap_or("Diagram");
    let engine = config.engine();
    let diagram = import_and_layout(&DdlImporter::with_name(name), &engine, &sql, source, target)
        .with_context(|| format!("failed to import {}", args.input.display()))?;

    tracing::info!(
        tables = diagram.tables.len(),
        relationships = diagram.relationships.len(),
        "diagram ready"
    );

    let rendered = match args.format {
        Format::Json => serde_json::to_string_pretty(&diagram)?,
        Format::Svg => SvgRenderer::new(config.metrics.clone()).render(&diagram),
    };

    match args.output {
        Some(path) => fs::write(&path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
