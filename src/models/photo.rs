use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::types::{Json, Uuid};

use crate::{models::tags::is_system_tag, tags::codec};

/// The format of every date-typed tag value. (`datetime-local` in a browser)
pub const TAG_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Normalized tag key -> the one value picked for it.
pub type PhotoTags = BTreeMap<String, String>;

/// One uploaded bird photo.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct Photo {
    /// Unique ID identifying this photo.
    pub id: Uuid,

    /// The (sanitized) name the file was uploaded with.
    pub filename: String,

    /// Where the original image can be fetched from.
    pub url: String,

    /// The photo's tags, including its `date_clicked` and `date_uploaded`.
    ///
    /// This is stored as `Json` for the database.
    pub tags: Json<PhotoTags>,

    /// When the photo reached the server.
    pub uploaded_at: DateTime<Utc>,
}

impl Photo {
    /// Creates a new photo record, cleaning up its tags on the way in.
    ///
    /// See [`normalize_tags`] for what happens to them.
    pub fn new(filename: String, url: String, tags: PhotoTags, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            url,
            tags: Json(normalize_tags(tags, now)),
            uploaded_at: now,
        }
    }

    /// The value for one tag key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.0.get(key).map(String::as_str)
    }

    /// Merges a partial tag map into this photo's tags.
    ///
    /// Keys are normalized first. An empty value removes the tag. The date
    /// fields only take `YYYY-MM-DDTHH:MM` values, and are never removed.
    pub fn apply_tag_changes(&mut self, changes: PhotoTags) {
        for (key, value) in changes {
            let key = codec::display_to_db_key(key.trim());
            if is_system_tag(&key) {
                if NaiveDateTime::parse_from_str(&value, TAG_DATE_FORMAT).is_ok() {
                    self.tags.0.insert(key, value);
                } else {
                    tracing::debug!("ignoring malformed `{key}` edit (`{value}`)");
                }
            } else if value.is_empty() {
                self.tags.0.remove(&key);
            } else {
                self.tags.0.insert(key, value);
            }
        }
    }
}

/// Cleans up a photo's incoming tags.
///
/// - keys become storage keys (`"Bird Name"` -> `bird_name`)
/// - a `date_clicked` that isn't `YYYY-MM-DDTHH:MM` becomes `now`
/// - a missing `date_uploaded` becomes `now`
pub fn normalize_tags(tags: PhotoTags, now: DateTime<Utc>) -> PhotoTags {
    let now_str = now.format(TAG_DATE_FORMAT).to_string();

    let mut tags: PhotoTags = tags
        .into_iter()
        .map(|(k, v)| (codec::display_to_db_key(k.trim()), v))
        .collect();

    if let Some(clicked) = tags.get_mut("date_clicked") {
        if NaiveDateTime::parse_from_str(clicked, TAG_DATE_FORMAT).is_err() {
            tracing::debug!("`date_clicked` was malformed (`{clicked}`). using the current time.");
            *clicked = now_str.clone();
        }
    }

    tags.entry("date_uploaded".into()).or_insert(now_str);
    tags
}
