//! Resizes and re-encodes stored photos for display.

use std::io::Cursor;

use camino::Utf8PathBuf;
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat};

use crate::error::{BirdLensError, MediaError};

/// What an optimized image can be encoded as.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeFormat {
    #[default]
    Webp,
    Jpeg,
    Png,
}

impl OptimizeFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OptimizeFormat::Webp => "image/webp",
            OptimizeFormat::Jpeg => "image/jpeg",
            OptimizeFormat::Png => "image/png",
        }
    }
}

impl std::str::FromStr for OptimizeFormat {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            other => Err(MediaError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// The query string of `GET /photos/optimize`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct OptimizeRequest {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default = "OptimizeRequest::default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub format: OptimizeFormat,
}

impl OptimizeRequest {
    pub const DEFAULT_QUALITY: u8 = 80;

    fn default_quality() -> u8 {
        Self::DEFAULT_QUALITY
    }

    /// The size to shrink an image of `width` x `height` to. The aspect ratio
    /// is kept, and images are never made bigger.
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        let max_w = self.width.filter(|w| *w > 0).unwrap_or(width).min(width);
        let max_h = self.height.filter(|h| *h > 0).unwrap_or(height).min(height);

        if max_w == width && max_h == height {
            return (width, height);
        }

        // scale by whichever side is tighter
        let ratio = f64::min(
            max_w as f64 / width as f64,
            max_h as f64 / height as f64,
        );
        let w = ((width as f64 * ratio).round() as u32).max(1);
        let h = ((height as f64 * ratio).round() as u32).max(1);
        (w, h)
    }
}

/// Loads the image at `path`, resizes it, and encodes it as requested.
///
/// The decoding and encoding happen on a blocking thread.
#[tracing::instrument(skip(req), fields(url = %req.url))]
pub async fn optimize(path: Utf8PathBuf, req: OptimizeRequest) -> Result<Vec<u8>, BirdLensError> {
    if !path.exists() {
        return Err(MediaError::MediaDoesntExist {
            path: path.to_string(),
        }
        .into());
    }

    let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, MediaError> {
        let img = image::open(&path).map_err(|e| MediaError::ImageError(path.to_string(), e))?;
        let img = resize(img, &req);
        encode(&img, req.format, req.quality).map_err(|e| MediaError::ImageError(path.to_string(), e))
    })
    .await??;

    tracing::debug!("optimized image is {} bytes", bytes.len());
    Ok(bytes)
}

fn resize(img: DynamicImage, req: &OptimizeRequest) -> DynamicImage {
    let (w, h) = req.target_size(img.width(), img.height());
    if (w, h) == (img.width(), img.height()) {
        return img;
    }

    img.resize(w, h, FilterType::Lanczos3)
}

/// Encodes `img`. `quality` only matters for jpeg.
pub fn encode(
    img: &DynamicImage,
    format: OptimizeFormat,
    quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Cursor::new(Vec::new());

    match format {
        OptimizeFormat::Jpeg => {
            let quality = quality.clamp(1, 100);
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
            encoder.encode_image(&img.to_rgb8())?;
        }
        OptimizeFormat::Png => img.write_to(&mut buf, ImageFormat::Png)?,
        // the webp encoder only takes 8-bit rgb(a)
        OptimizeFormat::Webp => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_to(&mut buf, ImageFormat::WebP)?,
    }

    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use image::{DynamicImage, GenericImageView as _, ImageFormat, RgbImage};
    use temp_dir::TempDir;

    use super::{encode, optimize, OptimizeFormat, OptimizeRequest};

    fn req(width: Option<u32>, height: Option<u32>, format: OptimizeFormat) -> OptimizeRequest {
        OptimizeRequest {
            url: "/media/test.png".into(),
            width,
            height,
            quality: OptimizeRequest::DEFAULT_QUALITY,
            format,
        }
    }

    #[test]
    fn sizes_keep_aspect() {
        let r = req(Some(300), None, OptimizeFormat::Webp);
        assert_eq!(r.target_size(600, 400), (300, 200));

        let r = req(Some(300), Some(100), OptimizeFormat::Webp);
        assert_eq!(r.target_size(600, 400), (150, 100));

        // never grows
        let r = req(Some(1000), Some(1000), OptimizeFormat::Webp);
        assert_eq!(r.target_size(600, 400), (600, 400));

        let r = req(None, None, OptimizeFormat::Webp);
        assert_eq!(r.target_size(600, 400), (600, 400));
    }

    #[test]
    fn formats_parse() {
        assert_eq!("JPG".parse::<OptimizeFormat>().unwrap(), OptimizeFormat::Jpeg);
        assert_eq!("webp".parse::<OptimizeFormat>().unwrap(), OptimizeFormat::Webp);
        assert!("avif".parse::<OptimizeFormat>().is_err());
    }

    #[test]
    fn encodings_are_readable() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 4, image::Rgb([10, 120, 30])));

        for (format, expected) in [
            (OptimizeFormat::Jpeg, ImageFormat::Jpeg),
            (OptimizeFormat::Png, ImageFormat::Png),
            (OptimizeFormat::Webp, ImageFormat::WebP),
        ] {
            let bytes = encode(&img, format, 70).unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn optimizing_a_stored_image() {
        let dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("bird.png")).unwrap();
        RgbImage::from_pixel(64, 32, image::Rgb([200, 180, 20]))
            .save(&path)
            .unwrap();

        let bytes = optimize(path, req(Some(16), None, OptimizeFormat::Png))
            .await
            .unwrap();

        let out = image::load_from_memory(&bytes).unwrap();
        assert_eq!(out.dimensions(), (16, 8));
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let res = optimize(
            "/definitely/not/here.png".into(),
            req(None, None, OptimizeFormat::Jpeg),
        )
        .await;
        assert!(res.is_err());
    }
}
