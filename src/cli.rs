//! Command-line surface: arguments, errors, and input-file parsing.

#[cfg(test)]
#[path = "cli_test.rs"]
mod cli_test;

use std::io;
use std::path::{Path, PathBuf};

use canvas::config::ConfigError;
use canvas::doc::{AnnotationRegion, DetectionResponse};
use canvas::lifecycle::ImageSource;
use canvas::mapper::Point;
use canvas::viewport::ContainerBounds;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid canvas configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("http client setup failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image load failed: {0}")]
    Load(String),
    #[error("unknown region id `{0}`")]
    UnknownRegion(String),
    #[error("failed to write preview: {0}")]
    Export(#[from] image::ImageError),
}

#[derive(Parser, Debug)]
#[command(name = "translator", about = "Headless host for the annotation canvas engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load an image and regions, then report the resulting canvas.
    Inspect(CanvasArgs),
    /// Run one pointer gesture (draw, select, move or resize) and report the outcome.
    Gesture(GestureArgs),
}

#[derive(Args, Debug)]
pub struct CanvasArgs {
    /// Image path or http(s) URL.
    #[arg(value_parser = parse_source)]
    pub image: ImageSource,

    /// JSON region list, or a detection response with `ocr_result.text_boxes`.
    #[arg(long)]
    pub regions: Option<PathBuf>,

    /// Available container size as `WIDTHxHEIGHT`.
    #[arg(long, value_parser = parse_container)]
    pub container: Option<ContainerBounds>,

    /// Zoom factor; clamped to the configured bounds.
    #[arg(long)]
    pub zoom: Option<f64>,

    /// Region id to select before anything else happens.
    #[arg(long)]
    pub select: Option<String>,

    /// Write the composited canvas as a PNG.
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Timeout for URL image loads.
    #[arg(long, env = "TRANSLATOR_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,
}

#[derive(Args, Debug)]
pub struct GestureArgs {
    #[command(flatten)]
    pub canvas: CanvasArgs,

    /// Display-space pointer-down position as `X,Y`.
    #[arg(long, value_parser = parse_point)]
    pub from: Point,

    /// Display-space pointer-up position as `X,Y`.
    #[arg(long, value_parser = parse_point)]
    pub to: Point,
}

fn parse_source(s: &str) -> Result<ImageSource, String> {
    if s.trim().is_empty() {
        return Err("image reference is empty".to_owned());
    }
    Ok(ImageSource::parse(s.trim()))
}

/// Parse `X,Y` into a display-space point.
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got `{s}`"))?;
    let x: f64 = x.trim().parse().map_err(|e| format!("invalid x `{x}`: {e}"))?;
    let y: f64 = y.trim().parse().map_err(|e| format!("invalid y `{y}`: {e}"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("coordinates must be finite, got `{s}`"));
    }
    Ok(Point::new(x, y))
}

/// Parse `WIDTHxHEIGHT` into container bounds.
pub fn parse_container(s: &str) -> Result<ContainerBounds, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("invalid width `{w}`: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("invalid height `{h}`: {e}"))?;
    if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 {
        return Err(format!("container size must be non-negative, got `{s}`"));
    }
    Ok(ContainerBounds::new(w, h))
}

/// Accept either a plain region list or a detection response.
///
/// # Errors
///
/// Returns the region-list parse error when neither shape matches.
pub fn parse_regions(body: &str) -> Result<Vec<AnnotationRegion>, CliError> {
    match serde_json::from_str::<Vec<AnnotationRegion>>(body) {
        Ok(regions) => Ok(regions),
        Err(list_err) => match DetectionResponse::from_json(body) {
            Ok(response) => Ok(response.into_regions()),
            Err(_) => Err(CliError::InvalidJson(list_err)),
        },
    }
}

/// Read and parse a region file.
///
/// # Errors
///
/// Returns [`CliError::Read`] on I/O failure or a parse error from [`parse_regions`].
pub async fn load_regions(path: &Path) -> Result<Vec<AnnotationRegion>, CliError> {
    let body = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    parse_regions(&body)
}
