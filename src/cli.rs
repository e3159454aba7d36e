use crate::cache::LabelCache;
use crate::config::load_config;
use crate::render::{SvgCanvas, write_output_svg};
use crate::scene::{Scene, load_scene, parse_scene, resolve_symbolizer};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use geo::Rect;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "cartolabel",
    version,
    about = "Map label placement with collision avoidance"
)]
pub struct Args {
    /// Scene JSON file, or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, engine and render settings)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Display width, overriding the scene and config
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Display height, overriding the scene and config
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    #[cfg(feature = "png")]
    Png,
}

pub fn run() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    let scene = read_scene(args.input.as_deref())?;
    if let Some(width) = args.width.or(scene.width) {
        config.render.width = width;
    }
    if let Some(height) = args.height.or(scene.height) {
        config.render.height = height;
    }

    let width = config.render.width;
    let height = config.render.height;

    let mut cache = LabelCache::new(config.engine.clone());
    cache.start();
    for layer in &scene.layers {
        cache.start_layer(&layer.id);
        let symbolizer = resolve_symbolizer(&layer.symbolizer, &config.theme);
        for feature_spec in &layer.features {
            let feature = feature_spec.to_feature();
            cache.put(
                &layer.id,
                &symbolizer,
                &feature,
                feature_spec.geometry.to_geometry(),
                None,
            );
        }
        cache.end_layer(&layer.id);
    }

    let mut canvas = SvgCanvas::new(width, height, config.theme.clone());
    let placed = cache.end(&mut canvas, Rect::new((0.0, 0.0), (width, height)))?;
    log::info!("placed {} of {} labels", placed.len(), cache.len());

    let svg = canvas.finish();
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        #[cfg(feature = "png")]
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            crate::render::write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

fn read_scene(path: Option<&Path>) -> Result<Scene> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return parse_scene(&buf);
        }
        return load_scene(path);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    parse_scene(&buf)
}

#[cfg(feature = "png")]
fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
