//! Keeps uploaded originals on local disk.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use uuid::Uuid;

use crate::{config::Config, error::MediaError};

/// The url prefix stored photos are served under.
pub const MEDIA_URL_PREFIX: &str = "/media/";

/// An upload that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredMedia {
    /// The sanitized name it was uploaded with.
    pub filename: String,
    /// Where it can be fetched, like `/media/<uuid>.jpg`.
    pub url: String,
    /// Where it landed on disk.
    pub path: Utf8PathBuf,
}

/// Writes, finds, and removes media under `<data_dir>/media`.
#[derive(Clone, Debug)]
pub struct MediaStore {
    dir: Utf8PathBuf,
    config: Arc<Config>,
}

impl MediaStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            dir: config.media_dir(),
            config,
        }
    }

    /// Checks an upload's name and size, returning its lowercased extension.
    pub fn validate(&self, filename: &str, len: usize) -> Result<String, MediaError> {
        if filename.trim().is_empty() {
            return Err(MediaError::NoFileName);
        }

        let ext = Utf8Path::new(filename)
            .extension()
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.config.is_extension_allowed(&ext) {
            tracing::debug!("refusing upload `{filename}` with extension `{ext}`");
            return Err(MediaError::ExtensionNotAllowed(ext));
        }

        let limit = self.config.max_upload_bytes;
        if len > limit {
            return Err(MediaError::TooLarge { size: len, limit });
        }

        Ok(ext)
    }

    /// Validates and writes an upload to disk under a fresh name.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<StoredMedia, MediaError> {
        let ext = self.validate(filename, bytes.len())?;
        let stored_name = format!("{}.{ext}", Uuid::new_v4());
        let path = self.dir.join(&stored_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| MediaError::WriteFailed {
                path: self.dir.to_string(),
                err,
            })?;

        tokio::fs::write(&path, bytes)
            .await
            .inspect_err(|e| tracing::error!("Failed to write upload to `{path}`! err: {e}"))
            .map_err(|err| MediaError::WriteFailed {
                path: path.to_string(),
                err,
            })?;

        tracing::info!("stored `{filename}` at `{path}`");
        Ok(StoredMedia {
            filename: sanitize_filename(filename),
            url: format!("{MEDIA_URL_PREFIX}{stored_name}"),
            path,
        })
    }

    /// Maps a `/media/...` url back to its file.
    ///
    /// Anything that isn't a plain file name inside the media folder is
    /// refused.
    pub fn resolve(&self, url: &str) -> Result<Utf8PathBuf, MediaError> {
        let name = url
            .strip_prefix(MEDIA_URL_PREFIX)
            .filter(|n| {
                !n.is_empty() && !n.contains(['/', '\\']) && *n != "." && *n != ".."
            })
            .ok_or_else(|| MediaError::NotLocalMedia(url.to_string()))?;

        Ok(self.dir.join(name))
    }

    /// Deletes the file behind `url`. A file that's already gone is fine.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, url: &str) -> Result<(), MediaError> {
        let path = self.resolve(url)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("media at `{path}` was already gone");
                Ok(())
            }
            Err(err) => Err(MediaError::WriteFailed {
                path: path.to_string(),
                err,
            }),
        }
    }
}

/// Keeps only the last path component, with anything but `[A-Za-z0-9._-]`
/// turned into `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned.trim_start_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use camino::Utf8PathBuf;
    use temp_dir::TempDir;

    use super::{sanitize_filename, MediaStore};
    use crate::{config::Config, error::MediaError};

    fn store(dir: &TempDir) -> MediaStore {
        let data_dir = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        MediaStore::new(Arc::new(Config::with_defaults(data_dir)))
    }

    #[test]
    fn extensions_and_sizes() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(store.validate("bird.JPG", 10).unwrap(), "jpg");
        assert!(matches!(
            store.validate("bird.gif", 10),
            Err(MediaError::ExtensionNotAllowed(e)) if e == "gif"
        ));
        assert!(matches!(
            store.validate("bird", 10),
            Err(MediaError::ExtensionNotAllowed(_))
        ));
        assert!(matches!(store.validate("", 10), Err(MediaError::NoFileName)));
        assert!(matches!(
            store.validate("bird.png", Config::DEFAULT_MAX_UPLOAD_BYTES + 1),
            Err(MediaError::TooLarge { .. })
        ));
    }

    #[test]
    fn only_local_urls_resolve() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(store.resolve("/media/abc.png").unwrap().ends_with("media/abc.png"));
        assert!(store.resolve("/media/../config.toml").is_err());
        assert!(store.resolve("https://example.com/a.png").is_err());
        assert!(store.resolve("/media/").is_err());
    }

    #[test]
    fn filenames_are_cleaned() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my bird (1).jpg"), "my_bird__1_.jpg");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
    }

    #[tokio::test]
    async fn save_then_remove() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let stored = store.save("Robin.png", b"not really a png").await.unwrap();
        assert!(stored.url.starts_with("/media/"));
        assert!(stored.url.ends_with(".png"));
        assert_eq!(stored.filename, "Robin.png");
        assert!(stored.path.exists());

        store.remove(&stored.url).await.unwrap();
        assert!(!stored.path.exists());

        // twice is fine
        store.remove(&stored.url).await.unwrap();
    }
}
