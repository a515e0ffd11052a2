//! The photo store: uploads, edits, search, and stats.

use std::collections::BTreeMap;

use sqlx::{sqlite::SqliteArguments, Sqlite};
use uuid::Uuid;

use crate::{
    error::{BirdLensError, DatabaseError},
    models::photo::{Photo, PhotoTags},
    search::SearchCriteria,
};

use super::{Database, InsertIntoTable};

/// tag name -> tag value -> how many photos have it
pub type PhotoStats = BTreeMap<String, BTreeMap<String, u64>>;

impl InsertIntoTable for Photo {
    fn make_insertion_query(&self) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
        sqlx::query(
            "INSERT INTO photos (id, filename, url, tags, uploaded_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.id)
        .bind(&self.filename)
        .bind(&self.url)
        .bind(&self.tags)
        .bind(self.uploaded_at)
    }
}

impl Database {
    /// Every photo, newest upload first.
    #[tracing::instrument(skip(self))]
    pub async fn list_photos(&self) -> Result<Vec<Photo>, BirdLensError> {
        let photos = sqlx::query_as::<_, Photo>("SELECT * FROM photos ORDER BY uploaded_at DESC")
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("Failed to list photos! err: {e}"))?;

        Ok(photos)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_photo(&self, id: &Uuid) -> Result<Photo, BirdLensError> {
        sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| BirdLensError::PhotoNotFound { id: id.to_string() })
    }

    /// Saves a new photo record.
    #[tracing::instrument(skip(self, photo), fields(id = %photo.id))]
    pub async fn insert_photo(&self, photo: &Photo) -> Result<(), BirdLensError> {
        let res = photo
            .make_insertion_query()
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("Failed to insert photo! err: {e}"))?;

        if res.rows_affected() != 1 {
            return Err(DatabaseError::InsertionFailed(format!(
                "expected to insert one photo, but {} rows changed",
                res.rows_affected()
            ))
            .into());
        }

        Ok(())
    }

    /// Finds the photos matching `criteria`, newest upload first.
    #[tracing::instrument(skip(self))]
    pub async fn search_photos(&self, criteria: &SearchCriteria) -> Result<Vec<Photo>, BirdLensError> {
        let (select, values) = criteria.to_statement()?;
        tracing::debug!("running search: {select}");

        let photos = sqlx::query_as_with::<_, Photo, _>(&select, values)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("Search query failed! err: {e}"))?;

        Ok(photos)
    }

    /// Merges `changes` into a photo's tags, then returns the stored result.
    #[tracing::instrument(skip(self))]
    pub async fn update_photo_tags(
        &self,
        id: &Uuid,
        changes: PhotoTags,
    ) -> Result<Photo, BirdLensError> {
        let mut tx = self.pool.begin().await?;

        let mut photo = sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BirdLensError::PhotoNotFound { id: id.to_string() })?;
        photo.apply_tag_changes(changes);

        sqlx::query("UPDATE photos SET tags = $1 WHERE id = $2")
            .bind(&photo.tags)
            .bind(id)
            .execute(&mut *tx)
            .await
            .inspect_err(|e| tracing::error!("Failed to update tags for `{id}`! err: {e}"))?;

        // always hand back what's actually stored
        let stored = sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE id = $1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(stored)
    }

    /// Removes a photo's record. Returns what was removed so the caller can
    /// clean up its file.
    #[tracing::instrument(skip(self))]
    pub async fn delete_photo(&self, id: &Uuid) -> Result<Photo, BirdLensError> {
        let photo = self.get_photo(id).await?;

        sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!("deleted photo `{id}`");
        Ok(photo)
    }

    /// Counts photos per value, for each tag that's been defined.
    ///
    /// Tags no photo uses still show up with an empty map.
    #[tracing::instrument(skip(self))]
    pub async fn photo_stats(&self) -> Result<PhotoStats, BirdLensError> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut stats = PhotoStats::new();
        for name in names {
            // tag names are normalized keys, so sqlite takes `$1` as a plain label
            let counts: Vec<(String, i64)> = sqlx::query_as(
                "SELECT tags ->> $1 AS value, COUNT(*) AS count \
                 FROM photos \
                 WHERE tags ->> $1 IS NOT NULL \
                 GROUP BY value",
            )
            .bind(&name)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!("Failed to count values for `{name}`! err: {e}"))?;

            let counts = counts
                .into_iter()
                .map(|(value, count)| (value, count.max(0) as u64))
                .collect();
            stats.insert(name, counts);
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use crate::{
        database::Database,
        error::BirdLensError,
        models::photo::{Photo, PhotoTags},
        search::{DateRange, SearchCriteria},
    };

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn tags(pairs: &[(&str, &str)]) -> PhotoTags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    async fn seeded() -> (Database, Photo, Photo) {
        let db = Database::in_memory().await.unwrap();

        let sparrow = Photo::new(
            "sparrow.jpg".into(),
            "/media/sparrow.jpg".into(),
            tags(&[("species", "Sparrow"), ("date_clicked", "2024-01-05T08:00")]),
            at(1_717_243_200),
        );
        let robin = Photo::new(
            "robin.jpg".into(),
            "/media/robin.jpg".into(),
            tags(&[("Species", "Robin"), ("date_clicked", "2023-12-25T09:30")]),
            at(1_717_243_200 + 60),
        );

        db.insert_photo(&sparrow).await.unwrap();
        db.insert_photo(&robin).await.unwrap();
        (db, sparrow, robin)
    }

    #[tokio::test]
    async fn newest_first() {
        let (db, sparrow, robin) = seeded().await;
        let ids: Vec<_> = db.list_photos().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![robin.id, sparrow.id]);
    }

    #[tokio::test]
    async fn search_by_prefix_and_date() {
        let (db, sparrow, _) = seeded().await;

        let mut criteria = SearchCriteria::default();
        criteria.filters.insert("species".into(), vec!["spar".into()]);
        let found = db.search_photos(&criteria).await.unwrap();
        assert_eq!(found, vec![sparrow.clone()]);

        let mut criteria = SearchCriteria::default();
        criteria
            .date_ranges
            .insert("date_clicked".into(), DateRange::new("2024-01-01T00:00", ""));
        let found = db.search_photos(&criteria).await.unwrap();
        assert_eq!(found, vec![sparrow]);

        let everything = db.search_photos(&SearchCriteria::default()).await.unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[tokio::test]
    async fn edits_merge_and_remove() {
        let (db, sparrow, _) = seeded().await;

        let updated = db
            .update_photo_tags(
                &sparrow.id,
                tags(&[("Bird Family", "Passeridae"), ("species", "")]),
            )
            .await
            .unwrap();

        assert_eq!(updated.tag("bird_family"), Some("Passeridae"));
        assert_eq!(updated.tag("species"), None);
        assert_eq!(updated.tag("date_clicked"), Some("2024-01-05T08:00"));
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let (db, sparrow, _) = seeded().await;

        let gone = db.delete_photo(&sparrow.id).await.unwrap();
        assert_eq!(gone.id, sparrow.id);

        assert!(matches!(
            db.delete_photo(&sparrow.id).await,
            Err(BirdLensError::PhotoNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn stats_count_each_value() {
        let (db, sparrow, robin) = seeded().await;
        db.create_tag("species", vec![]).await.unwrap();
        db.create_tag("location", vec![]).await.unwrap();
        db.create_tag("Bird Family", vec![]).await.unwrap();

        for p in [&sparrow, &robin] {
            db.update_photo_tags(&p.id, tags(&[("Bird Family", "Turdidae")]))
                .await
                .unwrap();
        }

        let stats = db.photo_stats().await.unwrap();
        assert_eq!(stats["species"]["Sparrow"], 1);
        assert_eq!(stats["species"]["Robin"], 1);
        assert_eq!(stats["bird_family"]["Turdidae"], 2);
        assert!(stats["location"].is_empty());
    }

    #[tokio::test]
    async fn editing_a_missing_photo_changes_nothing() {
        let (db, _, _) = seeded().await;

        let res = db
            .update_photo_tags(&uuid::Uuid::new_v4(), tags(&[("species", "Dodo")]))
            .await;
        assert!(matches!(res, Err(BirdLensError::PhotoNotFound { .. })));
        assert_eq!(db.list_photos().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn edits_keep_click_dates_sane() {
        let (db, sparrow, _) = seeded().await;

        let updated = db
            .update_photo_tags(&sparrow.id, tags(&[("date_clicked", "whenever")]))
            .await
            .unwrap();
        assert_eq!(updated.tag("date_clicked"), Some("2024-01-05T08:00"));

        let updated = db
            .update_photo_tags(&sparrow.id, tags(&[("date_clicked", "2022-02-02T02:02")]))
            .await
            .unwrap();
        assert_eq!(updated.tag("date_clicked"), Some("2022-02-02T02:02"));
    }
}
