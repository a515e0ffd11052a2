//! Decides which image a client should try loading next when one fails.
//!
//! The order is: optimized webp, then jpeg, then the original, and finally a
//! placeholder. Only [`FallbackChain::MAX_ATTEMPTS`] real loads are tried.

use std::fmt;

use super::optimize::{OptimizeFormat, OptimizeRequest};

/// One thing a client can try to display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Optimized(String),
    Alternate(String),
    Original(String),
    Placeholder(String),
}

impl ImageSource {
    pub fn url(&self) -> &str {
        match self {
            ImageSource::Optimized(u)
            | ImageSource::Alternate(u)
            | ImageSource::Original(u)
            | ImageSource::Placeholder(u) => u,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ImageSource::Placeholder(_))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

/// The load attempts for one photo on screen.
///
/// This is a value. Each failure hands back the next state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackChain {
    original: String,
    width: u32,
    height: u32,
    attempts: u8,
}

impl FallbackChain {
    pub const MAX_ATTEMPTS: u8 = 3;
    pub const DEFAULT_SIZE: u32 = 300;

    pub fn new(original_url: impl Into<String>, width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            original: original_url.into(),
            width: width.unwrap_or(Self::DEFAULT_SIZE),
            height: height.unwrap_or(Self::DEFAULT_SIZE),
            attempts: 0,
        }
    }

    /// How many loads have failed so far.
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// What to load right now.
    pub fn current(&self) -> ImageSource {
        match self.attempts {
            0 => ImageSource::Optimized(self.optimized_url(OptimizeFormat::Webp)),
            1 => ImageSource::Alternate(self.optimized_url(OptimizeFormat::Jpeg)),
            2 => ImageSource::Original(self.original.clone()),
            _ => ImageSource::Placeholder(self.placeholder_url()),
        }
    }

    /// The current source failed to load. Returns the chain pointing at the
    /// next one.
    pub fn failed(&self) -> Self {
        if self.attempts >= Self::MAX_ATTEMPTS {
            return self.clone();
        }

        tracing::debug!(
            "image load {} of {} failed for `{}`",
            self.attempts + 1,
            Self::MAX_ATTEMPTS,
            self.original
        );
        Self {
            attempts: self.attempts + 1,
            ..self.clone()
        }
    }

    /// Every source this chain will go through, in order.
    pub fn sources(&self) -> Vec<ImageSource> {
        let mut chain = Self {
            attempts: 0,
            ..self.clone()
        };
        let mut out = vec![chain.current()];
        while !chain.current().is_placeholder() {
            chain = chain.failed();
            out.push(chain.current());
        }
        out
    }

    fn optimized_url(&self, format: OptimizeFormat) -> String {
        let format = match format {
            OptimizeFormat::Webp => "webp",
            OptimizeFormat::Jpeg => "jpeg",
            OptimizeFormat::Png => "png",
        };
        format!(
            "/photos/optimize?url={}&width={}&height={}&quality={}&format={format}",
            encode_query_value(&self.original),
            self.width,
            self.height,
            OptimizeRequest::DEFAULT_QUALITY,
        )
    }

    fn placeholder_url(&self) -> String {
        format!(
            "https://via.placeholder.com/{}x{}?text=Image+not+found",
            self.width, self.height
        )
    }
}

/// Percent-encodes the characters that would break a query value.
fn encode_query_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
