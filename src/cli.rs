use crate::config::{LayoutConfig, load_config};
use crate::ir::{Direction, Graph};
use crate::layout::LayoutEngine;
use crate::layout_dump::write_layout_dump;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "metro-layout", version, about = "Metro-map layout for roadmap graphs")]
pub struct Args {
    /// Graph JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Layout config file (.json or .json5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Axis ranks advance along
    #[arg(short = 'd', long = "direction", value_enum)]
    pub direction: Option<DirectionArg>,

    /// Seed for position refinement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Refinement iterations (0 disables refinement)
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Fail on dangling edges and unsupported algorithms
    #[arg(long)]
    pub strict: bool,

    /// Emit the layout dump (with metadata and sampled curves)
    #[arg(long)]
    pub dump: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Log pipeline stages to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum DirectionArg {
    Horizontal,
    Vertical,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Horizontal => Direction::Horizontal,
            DirectionArg::Vertical => Direction::Vertical,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = resolve_config(&args)?;
    let input = read_input(args.input.as_deref())?;
    let graph = Graph::from_json(&input).context("input is not a valid graph document")?;

    let mut engine = LayoutEngine::new(config)?;
    let layout = engine.apply_layout(&graph)?;

    let mut writer = open_output(args.output.as_deref())?;
    if args.dump {
        write_layout_dump(&mut writer, &layout, engine.config(), args.pretty)?;
    } else if args.pretty {
        serde_json::to_writer_pretty(&mut writer, &layout)?;
    } else {
        serde_json::to_writer(&mut writer, &layout)?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Config file values first, then command-line overrides.
fn resolve_config(args: &Args) -> Result<LayoutConfig> {
    let mut config = load_config(args.config.as_deref())
        .with_context(|| match &args.config {
            Some(path) => format!("failed to load config {}", path.display()),
            None => "failed to build default config".to_string(),
        })?;
    if let Some(direction) = args.direction {
        config.preferred_direction = direction.into();
    }
    if let Some(seed) = args.seed {
        config.random_seed = Some(seed);
    }
    if let Some(iterations) = args.iterations {
        config.optimization_iterations = iterations;
    }
    if args.strict {
        config.strict = true;
    }
    Ok(config)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}
