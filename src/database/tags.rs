//! The tag store.

use sqlx::{sqlite::SqliteArguments, types::Json, Executor, Sqlite};

use crate::{
    error::{BirdLensError, TagError},
    models::tags::{is_system_tag, ParentInfo, Tag, ValueEntry},
    tags::{
        codec,
        filter::{filter_values, ParentSelections, TagService},
        rules,
    },
};

use super::{Database, InsertIntoTable};

/// How a tag looks in the `tags` table.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
struct TagRecord {
    name: String,
    tag_values: Json<Vec<ValueEntry>>,
}

impl From<TagRecord> for Tag {
    fn from(record: TagRecord) -> Self {
        Tag {
            name: record.name,
            values: record.tag_values.0,
        }
    }
}

impl InsertIntoTable for Tag {
    fn make_insertion_query(&self) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query("INSERT INTO tags (name, tag_values) VALUES ($1, $2)")
            .bind(&self.name)
            .bind(Json(&self.values))
    }
}

/// Grabs every tag, system ones included, sorted by name.
async fn all_tags<'e, E>(executor: E) -> Result<Vec<Tag>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let records = sqlx::query_as::<_, TagRecord>("SELECT * FROM tags ORDER BY name")
        .fetch_all(executor)
        .await?;

    Ok(records.into_iter().map(Tag::from).collect())
}

/// Writes a tag's values back.
async fn store_values<'e, E>(executor: E, tag: &Tag) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE tags SET tag_values = $1 WHERE name = $2")
        .bind(Json(&tag.values))
        .bind(&tag.name)
        .execute(executor)
        .await?;

    Ok(())
}

impl Database {
    /// Every tag a person can pick from. The date fields are left out.
    #[tracing::instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, BirdLensError> {
        let tags = all_tags(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("Failed to list tags! err: {e}"))?;

        Ok(tags.into_iter().filter(|t| !is_system_tag(&t.name)).collect())
    }

    /// Finds one tag by its normalized name.
    #[tracing::instrument(skip(self))]
    pub async fn get_tag(&self, name: &str) -> Result<Tag, BirdLensError> {
        let record = sqlx::query_as::<_, TagRecord>("SELECT * FROM tags WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        record
            .map(Tag::from)
            .ok_or_else(|| TagError::NotFound(name.to_string()).into())
    }

    /// Creates a tag. `name` may be a display label; it's normalized first.
    ///
    /// Any initial values go through the same checks as [`Database::add_tag_value`].
    #[tracing::instrument(skip(self))]
    pub async fn create_tag(
        &self,
        name: &str,
        values: Vec<ValueEntry>,
    ) -> Result<Tag, BirdLensError> {
        if name.trim().is_empty() {
            return Err(TagError::NameRequired.into());
        }

        let mut tx = self.pool.begin().await?;
        let mut existing = all_tags(&mut *tx).await?;

        let mut tag = Tag::new(name, Vec::new());
        if !codec::is_normalized_key(&tag.name) {
            tracing::debug!("tag name `{name}` normalized to unusable key `{}`", tag.name);
            return Err(TagError::InvalidName(name.to_string()).into());
        }
        if existing.iter().any(|t| t.name == tag.name) {
            tracing::debug!("tag `{}` already exists", tag.name);
            return Err(TagError::AlreadyExists(tag.name).into());
        }

        // the new tag has to be visible to its own values' checks
        existing.push(tag.clone());
        for entry in values {
            if tag.has_value(entry.value()) {
                return Err(TagError::ValueAlreadyExists {
                    tag: tag.name.clone(),
                    value: entry.value().to_string(),
                }
                .into());
            }
            rules::check_value(&existing, &tag.name, &entry)?;

            tag.values.push(entry);
            if let Some(t) = existing.iter_mut().find(|t| t.name == tag.name) {
                t.values = tag.values.clone();
            }
        }

        tag.make_insertion_query().execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!("created tag `{}`", tag.name);
        Ok(tag)
    }

    /// Deletes a tag. The date fields can't be deleted, and neither can a tag
    /// other tags' values still depend on.
    #[tracing::instrument(skip(self))]
    pub async fn delete_tag(&self, name: &str) -> Result<(), BirdLensError> {
        if is_system_tag(name) {
            return Err(TagError::SystemTag(name.to_string()).into());
        }

        let mut tx = self.pool.begin().await?;
        let tags = all_tags(&mut *tx).await?;
        if !tags.iter().any(|t| t.name == name) {
            return Err(TagError::NotFound(name.to_string()).into());
        }
        rules::check_tag_removal(&tags, name)?;

        sqlx::query("DELETE FROM tags WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("deleted tag `{name}`");
        Ok(())
    }

    /// Adds a value to a tag, optionally scoped to a parent tag's value.
    ///
    /// Returns the updated tag.
    #[tracing::instrument(skip(self))]
    pub async fn add_tag_value(
        &self,
        tag_name: &str,
        value: &str,
        parent_info: Option<ParentInfo>,
    ) -> Result<Tag, BirdLensError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(TagError::EmptyValue.into());
        }

        let mut tx = self.pool.begin().await?;
        let tags = all_tags(&mut *tx).await?;

        let mut tag = tags
            .iter()
            .find(|t| t.name == tag_name)
            .cloned()
            .ok_or_else(|| TagError::NotFound(tag_name.to_string()))?;

        if tag.has_value(value) {
            return Err(TagError::ValueAlreadyExists {
                tag: tag.name,
                value: value.to_string(),
            }
            .into());
        }

        let entry = ValueEntry::new(value, parent_info);
        rules::check_value(&tags, tag_name, &entry)?;

        tag.values.push(entry);
        store_values(&mut *tx, &tag).await?;
        tx.commit().await?;

        tracing::debug!("added `{value}` to tag `{tag_name}`");
        Ok(tag)
    }

    /// Removes a value (bare or scoped) from a tag.
    ///
    /// Values that other values are scoped to stay put.
    #[tracing::instrument(skip(self))]
    pub async fn delete_tag_value(&self, tag_name: &str, value: &str) -> Result<(), BirdLensError> {
        let value = value.trim();

        let mut tx = self.pool.begin().await?;
        let tags = all_tags(&mut *tx).await?;
        let mut tag = tags
            .iter()
            .find(|t| t.name == tag_name)
            .cloned()
            .ok_or_else(|| TagError::NotFound(tag_name.to_string()))?;

        let before = tag.values.len();
        tag.values.retain(|v| v.value() != value);
        if tag.values.len() == before {
            return Err(TagError::ValueNotFound {
                tag: tag_name.to_string(),
                value: value.to_string(),
            }
            .into());
        }
        rules::check_value_removal(&tags, tag_name, value)?;

        store_values(&mut *tx, &tag).await?;
        tx.commit().await?;

        tracing::debug!("removed `{value}` from tag `{tag_name}`");
        Ok(())
    }
}

impl TagService for Database {
    #[tracing::instrument(skip(self))]
    async fn filtered_values(
        &self,
        tag_name: &str,
        parent_filters: &ParentSelections,
    ) -> Result<Vec<ValueEntry>, BirdLensError> {
        let tag = self.get_tag(tag_name).await?;
        Ok(filter_values(&tag.values, parent_filters))
    }
}
