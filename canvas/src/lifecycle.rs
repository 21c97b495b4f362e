//! Image loading and canvas teardown.
//!
//! Every load request bumps a generation counter. A finished load is only
//! committed if its generation is still the latest one; anything older is
//! dropped without touching the canvas. In-flight work is not aborted, its
//! result is simply ignored when it arrives.
//!
//! Loads are split in two so callers can overlap them:
//!
//! ```text
//! begin(source) -> PendingLoad    (sync, bumps generation)
//! PendingLoad::resolve().await    (async fetch + decode, owns no canvas state)
//! settle(outcome) -> LoadDecision (sync, generation check)
//! ```

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::viewport::ImageSize;

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Url(String),
}

impl ImageSource {
    /// `http://` and `https://` references are URLs; anything else is a path.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Self::Url(reference.to_owned())
        } else {
            Self::File(PathBuf::from(reference))
        }
    }
}

impl FromStr for ImageSource {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    Empty,
    #[error("decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("canvas has been torn down")]
    Released,
}

/// An immutable decoded raster. Replaced wholesale on every load.
pub struct Image {
    source: ImageSource,
    generation: u64,
    size: ImageSize,
    pixels: RgbaImage,
}

impl Image {
    /// Wrap decoded pixels. Zero-sized rasters are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Empty`] if either side of `pixels` is zero.
    pub fn new(source: ImageSource, generation: u64, pixels: RgbaImage) -> Result<Self, LoadError> {
        let size = ImageSize::new(pixels.width(), pixels.height()).ok_or(LoadError::Empty)?;
        Ok(Self { source, generation, size, pixels })
    }

    #[must_use]
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("source", &self.source)
            .field("generation", &self.generation)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Fetches and decodes an image source.
pub trait ImageLoader: Send + Sync + 'static {
    fn load(&self, source: &ImageSource) -> impl Future<Output = Result<RgbaImage, LoadError>> + Send;
}

/// Loads from the local filesystem or over HTTP.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    http: reqwest::Client,
}

impl SourceLoader {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn fetch(&self, source: &ImageSource) -> Result<Vec<u8>, LoadError> {
        match source {
            ImageSource::File(path) => tokio::fs::read(path)
                .await
                .map_err(|source| LoadError::Io { path: path.clone(), source }),
            ImageSource::Url(url) => {
                let response = self.http.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LoadError::HttpStatus { url: url.clone(), status: status.as_u16() });
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

impl ImageLoader for SourceLoader {
    async fn load(&self, source: &ImageSource) -> Result<RgbaImage, LoadError> {
        let bytes = self.fetch(source).await?;
        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await??;
        Ok(decoded.to_rgba8())
    }
}

/// A load that has been started but not yet settled.
pub struct PendingLoad<L> {
    generation: u64,
    source: ImageSource,
    loader: Arc<L>,
}

impl<L: ImageLoader> PendingLoad<L> {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Fetch and decode. Touches no canvas state.
    pub async fn resolve(self) -> LoadOutcome {
        let result = match self.loader.load(&self.source).await {
            Ok(pixels) => Image::new(self.source, self.generation, pixels),
            Err(err) => Err(err),
        };
        LoadOutcome { generation: self.generation, result }
    }
}

/// The finished result of a [`PendingLoad`], waiting for its generation check.
#[derive(Debug)]
pub struct LoadOutcome {
    pub generation: u64,
    pub result: Result<Image, LoadError>,
}

/// What to do with a settled load.
#[derive(Debug)]
pub enum LoadDecision {
    /// Latest generation, decoded fine: install it.
    Commit(Arc<Image>),
    /// Latest generation, but fetch or decode failed. The canvas keeps what it shows.
    Failed { generation: u64, error: LoadError },
    /// Superseded by a newer request, or the canvas was torn down.
    Stale { generation: u64 },
}

/// Owns the generation counter and the currently committed image.
pub struct CanvasLifecycle<L> {
    loader: Arc<L>,
    generation: u64,
    current: Option<Arc<Image>>,
    released: bool,
}

impl<L: ImageLoader> CanvasLifecycle<L> {
    #[must_use]
    pub fn new(loader: L) -> Self {
        Self { loader: Arc::new(loader), generation: 0, current: None, released: false }
    }

    /// Start a load. Any load begun earlier becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Released`] after [`teardown`](Self::teardown).
    pub fn begin(&mut self, source: ImageSource) -> Result<PendingLoad<L>, LoadError> {
        if self.released {
            return Err(LoadError::Released);
        }
        self.generation += 1;
        debug!(generation = self.generation, %source, "image load started");
        Ok(PendingLoad { generation: self.generation, source, loader: Arc::clone(&self.loader) })
    }

    /// Apply the generation check to a finished load.
    pub fn settle(&mut self, outcome: LoadOutcome) -> LoadDecision {
        let LoadOutcome { generation, result } = outcome;
        if self.released || generation != self.generation {
            debug!(generation, latest = self.generation, "discarding stale image load");
            return LoadDecision::Stale { generation };
        }
        match result {
            Ok(image) => {
                let image = Arc::new(image);
                info!(
                    generation,
                    source = %image.source(),
                    width = image.size().width,
                    height = image.size().height,
                    "image committed"
                );
                self.current = Some(Arc::clone(&image));
                LoadDecision::Commit(image)
            }
            Err(error) => {
                warn!(generation, error = %error, "image load failed");
                LoadDecision::Failed { generation, error }
            }
        }
    }

    /// Drop the current image and invalidate every pending load.
    pub fn teardown(&mut self) {
        self.released = true;
        self.generation += 1;
        self.current = None;
        debug!(generation = self.generation, "canvas lifecycle torn down");
    }

    /// Latest generation handed out.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn current(&self) -> Option<&Arc<Image>> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }
}
