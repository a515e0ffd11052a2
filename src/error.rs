use core::error::Error;
use pisserror::Error;

use crate::config::Config;

/// Stick this at the end of bug warnings/errors.
///
/// It helps operators find out where to report bugs when looking at logs.
pub fn bug_msg(config: &Config) -> String {
    format!(
        "this is a bug, so please report it! you can do so by heading to this git repo: {}",
        config.bug_report_info.repo
    )
}

#[derive(Debug, Error)]
pub enum BirdLensError {
    #[error("The database has encountered an error. See: `{_0}`")]
    DatabaseError(#[from] DatabaseError),

    #[error("A tag operation failed. See: `{_0}`")]
    TagError(#[from] TagError),

    #[error("Failed to build or run a search. See: `{_0}`")]
    SearchError(#[from] SearchError),

    #[error("A media operation failed. See: `{_0}`")]
    MediaError(#[from] MediaError),

    #[error("The configuration is unusable. See: `{_0}`")]
    ConfigError(#[from] ConfigError),

    #[error("No photo with ID `{id}` exists.")]
    PhotoNotFound { id: String },

    #[error("A `tokio` task unexpectedly panicked. See: `{_0}`")]
    TokioJoinError(#[from] tokio::task::JoinError),

    #[error("Couldn't serve the API on `{addr}`. See: `{err}`")]
    ServeFailed { addr: String, err: std::io::Error },
}

impl From<sqlx::Error> for BirdLensError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(DatabaseError::GeneralDatabaseError(value))
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("General database error. See: {_0}")]
    GeneralDatabaseError(#[from] sqlx::Error),

    #[error("Failed to connect to the database. See: {_0}")]
    ConnectionError(String),

    #[error("Running database migrations failed. See: {_0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    #[error("Couldn't continue with database insertion. See: {_0}")]
    InsertionFailed(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// during fs read from disk
    #[error("Failed to read config file. See: `{_0}`")]
    ReadFailed(#[from] tokio::io::Error),

    /// parsing
    #[error("Failed to parse config file. See: `{_0}`")]
    ParseFailed(#[from] toml::de::Error),

    /// the file on disk points somewhere else
    #[error("The config file's data directory `{_0}` didn't match the one it was loaded from.")]
    PathMismatch(String),
}

/// Anything that can go wrong when touching the tag collection.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("A tag name is required.")]
    NameRequired,

    #[error("Tag name `{_0}` can only use letters, digits, spaces, and underscores.")]
    InvalidName(String),

    #[error("Tag `{_0}` already exists.")]
    AlreadyExists(String),

    #[error("Tag `{_0}` not found.")]
    NotFound(String),

    #[error("Tag `{_0}` is a system tag and can't be deleted.")]
    SystemTag(String),

    #[error("A tag value cannot be empty.")]
    EmptyValue,

    #[error("Value `{value}` already exists on tag `{tag}`.")]
    ValueAlreadyExists { tag: String, value: String },

    #[error("Value `{value}` not found on tag `{tag}`.")]
    ValueNotFound { tag: String, value: String },

    #[error("Parent info must name exactly one parent tag, but it named {_0}.")]
    ParentInfoArity(usize),

    #[error("Tag `{_0}` can't depend on itself.")]
    SelfParent(String),

    #[error("Parent tag `{_0}` not found.")]
    ParentNotFound(String),

    #[error("Parent value `{value}` not found in tag `{tag}`.")]
    ParentValueNotFound { tag: String, value: String },

    #[error("`{target}` is still a parent of values in tag `{child}`.")]
    StillReferenced { target: String, child: String },

    #[error("Making `{child}` depend on `{parent}` would create a dependency cycle.")]
    DependencyCycle { child: String, parent: String },
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("`{_0}` is not a valid tag key for searching.")]
    InvalidKey(String),
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("No photo was provided.")]
    NoPhoto,

    #[error("No file name was given for the uploaded photo.")]
    NoFileName,

    #[error("File type `{_0}` is not allowed.")]
    ExtensionNotAllowed(String),

    #[error("The upload is {size} bytes, but the limit is {limit} bytes.")]
    TooLarge { size: usize, limit: usize },

    #[error("Failed to write media to `{path}`. Err: `{err}`.")]
    WriteFailed { path: String, err: std::io::Error },

    #[error("The media file at `{path}` was expected to exist, but didn't.")]
    MediaDoesntExist { path: String },

    #[error("The url `{_0}` doesn't point to locally stored media.")]
    NotLocalMedia(String),

    #[error("Image format `{_0}` isn't supported for optimization.")]
    UnsupportedFormat(String),

    #[error("An error occured when processing the image at `{_0}`. See: `{_1}`.")]
    ImageError(String, image::ImageError),
}
