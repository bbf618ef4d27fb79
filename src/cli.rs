use crate::config::load_config;
use crate::ir::{NodeId, NodeRecord, TreeData, TreePayload};
use crate::layout_dump::write_layout_dump;
use crate::render::write_output_svg;
use crate::session::Session;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rbviz", version, about = "Red/black tree visualizer: tree JSON in, SVG out")]
pub struct Args {
    /// Input file (tree JSON) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout, timing, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 600.0)]
    pub height: f32,

    /// Click these nodes before rendering (repeatable)
    #[arg(long = "select")]
    pub select: Vec<NodeId>,

    /// Highlight a search hit
    #[arg(long = "search")]
    pub search: Option<NodeId>,

    /// Run a validation sweep with the given result
    #[arg(long = "validate", value_enum)]
    pub validate: Option<Validation>,

    /// Advance the clock this many milliseconds before rendering
    #[arg(long = "at-ms", default_value_t = 0)]
    pub at_ms: u64,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;
    config.layout.canvas_width = args.width;
    config.layout.canvas_height = args.height;

    let input = read_input(args.input.as_deref())?;
    let data = parse_tree_data(&input)?;

    let mut session = Session::new(config);
    let outcome = session.draw(&data);
    tracing::info!(?outcome, "tree drawn");

    for id in &args.select {
        if session.click_node(*id).is_none() {
            tracing::warn!(id, "cannot select a node that is not rendered");
        }
    }
    if let Some(id) = args.search {
        if !session.on_search_result(id, true) {
            tracing::warn!(id, "search target is not rendered");
        }
    }
    if let Some(validation) = args.validate {
        session.on_validate_result(validation == Validation::Valid);
    }
    session.advance(Duration::from_millis(args.at_ms));

    if let Some(path) = args.dump_layout.as_deref() {
        let renderer = session.renderer();
        write_layout_dump(path, renderer.layout(), renderer.viewport(), session.highlight())?;
    }

    let svg = session.svg();
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_png(&svg, &output, &session)?;
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, session: &Session) -> Result<()> {
    crate::render::write_output_png(svg, output, &session.config().render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _session: &Session) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

/// Accepts the full `{ "tree": .. }` body, a bare tree payload, or a bare
/// node array. Strict JSON first, then JSON5 for hand-written files.
pub fn parse_tree_data(input: &str) -> Result<TreeData> {
    let value: Value = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(strict) => json5::from_str(input)
            .with_context(|| format!("input is neither JSON ({strict}) nor JSON5"))?,
    };
    let wrapped = value.get("tree").is_some();
    let data = match value {
        Value::Array(_) => {
            let nodes: Vec<NodeRecord> = serde_json::from_value(value)?;
            TreeData {
                tree: TreePayload {
                    empty: nodes.is_empty(),
                    nodes,
                    ..Default::default()
                },
            }
        }
        Value::Object(_) if wrapped => serde_json::from_value(value)?,
        Value::Object(_) => TreeData {
            tree: serde_json::from_value(value)?,
        },
        other => anyhow::bail!("expected a JSON object or array, found {other}"),
    };
    Ok(data)
}
