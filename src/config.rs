use camino::{Utf8Path, Utf8PathBuf};

use crate::error::{bug_msg, ConfigError};

/// The config file's name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Config {
    /// Path to the app's data directory. The database and stored media live
    /// in here.
    pub data_dir: Utf8PathBuf,

    /// Address the HTTP API binds to, like `127.0.0.1:5000`.
    pub bind_addr: String,

    /// The largest photo upload we'll accept, in bytes.
    pub max_upload_bytes: usize,

    /// File extensions (lowercase, no dot) that may be uploaded.
    pub allowed_extensions: Vec<String>,

    /// Information for automatically reporting bugs.
    pub bug_report_info: BugReportInfo,
}

impl Config {
    /// 16 MiB.
    pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

    pub fn new(data_dir: Utf8PathBuf, bind_addr: String, bug_report_info: BugReportInfo) -> Self {
        Self {
            data_dir,
            bind_addr,
            max_upload_bytes: Self::DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
            bug_report_info,
        }
    }

    /// A config with defaults for everything but the data directory.
    pub fn with_defaults(data_dir: Utf8PathBuf) -> Self {
        Self::new(
            data_dir,
            String::from("127.0.0.1:5000"),
            BugReportInfo::default(),
        )
    }

    /// Attempts to read a previous `Config` from disk.
    ///
    /// Note that this may fail across versions, requiring new configs.
    #[tracing::instrument]
    pub async fn from_disk(data_dir: &Utf8Path) -> Result<Self, ConfigError> {
        // read the config from disk
        let s = tokio::fs::read_to_string(data_dir.join(CONFIG_FILE_NAME))
            .await
            .map_err(ConfigError::ReadFailed)?;

        // parse with `toml` crate
        let s: Self = toml::from_str(s.as_str()).map_err(ConfigError::ParseFailed)?;

        // ensure paths are equal
        if s.data_dir != data_dir {
            tracing::error!(
                "loaded config from disk, but it had some weird paths. {}",
                bug_msg(&s)
            );
            return Err(ConfigError::PathMismatch(s.data_dir.to_string()));
        }

        Ok(s)
    }

    /// Reads the config from disk, falling back to defaults when there isn't
    /// one yet.
    ///
    /// A config that exists but can't be parsed is still an error.
    pub async fn load_or_default(data_dir: &Utf8Path) -> Result<Self, ConfigError> {
        match Self::from_disk(data_dir).await {
            Ok(conf) => Ok(conf),
            Err(ConfigError::ReadFailed(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config found in `{data_dir}`. using defaults.");
                Ok(Self::with_defaults(data_dir.to_path_buf()))
            }
            Err(e) => Err(e),
        }
    }

    /// Where the SQLite database file lives.
    pub fn database_path(&self) -> Utf8PathBuf {
        self.data_dir.join(crate::database::BIRDLENS_DB_FILE)
    }

    /// Where uploaded originals are stored.
    pub fn media_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("media")
    }

    /// Checks an extension against the allow list. Case doesn't matter.
    pub fn is_extension_allowed(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.allowed_extensions.iter().any(|a| *a == ext)
    }
}

/// Some info to help with bug reporting.
#[derive(Clone, Debug, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct BugReportInfo {
    pub app_name: String,
    pub app_version: String,
    pub commit: String,
    pub repo: String,
}

impl Default for BugReportInfo {
    fn default() -> Self {
        Self {
            app_name: String::from(env!("CARGO_PKG_NAME")),
            app_version: String::from(env!("CARGO_PKG_VERSION")),
            commit: String::from("unknown"),
            repo: String::from("https://github.com/birdlens/birdlens"),
        }
    }
}
