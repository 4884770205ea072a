use super::{FeedData, FeedFetcher, FetchError, FetchResult};
use crate::config::BackdropConfig;
use async_trait::async_trait;
use image::RgbImage;
use std::sync::Arc;

/// Longest edge kept after decoding. Terminals never need more than this.
const MAX_EDGE: u32 = 480;

/// A decoded photograph, already scaled down for cell rendering.
#[derive(Debug, Clone)]
pub struct Picture {
    pub pixels: RgbImage,
    pub source_width: u32,
    pub source_height: u32,
}

impl Picture {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Nearest-neighbour sample at fractional coordinates in `[0, 1)`.
    pub fn sample(&self, fx: f64, fy: f64) -> [u8; 3] {
        let x = ((fx * self.width() as f64) as u32).min(self.width().saturating_sub(1));
        let y = ((fy * self.height() as f64) as u32).min(self.height().saturating_sub(1));
        self.pixels.get_pixel(x, y).0
    }
}

pub struct BackdropFetcher {
    url: String,
    client: reqwest::Client,
}

impl BackdropFetcher {
    pub fn new(config: &BackdropConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("startpage/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: image_url(config),
            client,
        }
    }
}

/// `<endpoint>/<category>/<width>x<height>`, no query string.
pub fn image_url(config: &BackdropConfig) -> String {
    format!(
        "{}/{}/{}x{}",
        config.endpoint.trim_end_matches('/'),
        config.category,
        config.width,
        config.height
    )
}

/// Decodes an image payload and scales it so the longest edge is at most
/// [`MAX_EDGE`], keeping the aspect ratio.
pub fn decode_picture(bytes: &[u8]) -> FetchResult<Picture> {
    let img = image::load_from_memory(bytes)?;

    let source_width = img.width();
    let source_height = img.height();
    if source_width == 0 || source_height == 0 {
        return Err(FetchError::Malformed("image has no pixels".to_string()));
    }

    let scaled = if source_width.max(source_height) > MAX_EDGE {
        img.resize(MAX_EDGE, MAX_EDGE, image::imageops::FilterType::Triangle)
    } else {
        img
    };

    Ok(Picture {
        pixels: scaled.to_rgb8(),
        source_width,
        source_height,
    })
}

#[async_trait]
impl FeedFetcher for BackdropFetcher {
    async fn fetch(&self) -> FetchResult<FeedData> {
        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        let picture = tokio::task::spawn_blocking(move || decode_picture(&bytes))
            .await
            .map_err(|e| FetchError::Aborted(e.to_string()))??;

        Ok(FeedData::Backdrop(Arc::new(picture)))
    }
}
