//! Runs searches built by the search form against stored photos.

mod common;

#[cfg(test)]
mod tests {
    use birdlens::{
        database::Database,
        forms::SearchForm,
        models::photo::{Photo, PhotoTags},
        search::{FilterKind, SearchCriteria},
    };
    use chrono::{DateTime, Utc};

    use crate::common::setup;

    fn photo(name: &str, tags: &[(&str, &str)], uploaded: i64) -> Photo {
        let tags: PhotoTags = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Photo::new(
            format!("{name}.jpg"),
            format!("/media/{name}.jpg"),
            tags,
            DateTime::<Utc>::from_timestamp(uploaded, 0).unwrap(),
        )
    }

    async fn seed(db: &Database) -> Vec<Photo> {
        let photos = vec![
            photo(
                "house-sparrow",
                &[
                    ("species", "House Sparrow"),
                    ("Bird Family", "Passeridae"),
                    ("date_clicked", "2024-02-10T07:15"),
                ],
                1_710_000_000,
            ),
            photo(
                "tree-sparrow",
                &[
                    ("species", "Tree Sparrow"),
                    ("Bird Family", "Passeridae"),
                    ("date_clicked", "2023-11-03T16:40"),
                ],
                1_710_000_100,
            ),
            photo(
                "hornbill",
                &[
                    ("species", "Great Hornbill"),
                    ("Bird Family", "Bucerotidae"),
                    ("date_clicked", "2024-03-01T10:00"),
                ],
                1_710_000_200,
            ),
            photo(
                "odd",
                &[("species", "100%_real\\bird"), ("date_clicked", "not a date")],
                1_710_000_300,
            ),
        ];

        for p in &photos {
            db.insert_photo(p).await.unwrap();
        }
        photos
    }

    fn filenames(photos: &[Photo]) -> Vec<&str> {
        photos.iter().map(|p| p.filename.as_str()).collect()
    }

    #[tokio::test]
    async fn form_to_results() {
        let s = setup().await;
        seed(&s.db).await;

        let form = SearchForm::new().with_filter("Bird Family", "passer");
        let built = form.build();
        assert_eq!(
            built.criteria.filters.get("bird_family"),
            Some(&vec!["passer".to_string()])
        );

        let found = s.db.search_photos(&built.criteria).await.unwrap();
        assert_eq!(filenames(&found), vec!["tree-sparrow.jpg", "house-sparrow.jpg"]);

        // add a date bound: only the 2024 sparrow is left
        let form = form.with_date_start("date_clicked", "2024-01-01T00:00");
        let built = form.build();
        let labels: Vec<String> = built.active_filters.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "Bird Family: passer".to_string(),
                "Date Clicked From: 2024-01-01T00:00".to_string(),
            ]
        );

        let found = s.db.search_photos(&built.criteria).await.unwrap();
        assert_eq!(filenames(&found), vec!["house-sparrow.jpg"]);

        // dropping the family chip keeps the date. `odd` had a broken click
        // date, so it got its upload time (2024-03-09T16:05) instead
        let form = form.without(&FilterKind::Tag("bird_family".into()));
        let found = s.db.search_photos(&form.build().criteria).await.unwrap();
        assert_eq!(
            filenames(&found),
            vec!["odd.jpg", "hornbill.jpg", "house-sparrow.jpg"]
        );
    }

    #[tokio::test]
    async fn empty_search_is_everything_newest_first() {
        let s = setup().await;
        seed(&s.db).await;

        let found = s.db.search_photos(&SearchCriteria::default()).await.unwrap();
        assert_eq!(
            filenames(&found),
            vec!["odd.jpg", "hornbill.jpg", "tree-sparrow.jpg", "house-sparrow.jpg"]
        );
        assert_eq!(found, s.db.list_photos().await.unwrap());
    }

    #[tokio::test]
    async fn wildcards_match_themselves() {
        let s = setup().await;
        seed(&s.db).await;

        let form = SearchForm::new().with_filter("Species", "100%_real\\");
        let found = s.db.search_photos(&form.build().criteria).await.unwrap();
        assert_eq!(filenames(&found), vec!["odd.jpg"]);

        // a bare `%` isn't a wildcard either
        let form = SearchForm::new().with_filter("Species", "%");
        let found = s.db.search_photos(&form.build().criteria).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn inverted_ranges_find_nothing() {
        let s = setup().await;
        seed(&s.db).await;

        let form = SearchForm::new()
            .with_date_start("date_clicked", "2024-12-31T00:00")
            .with_date_end("date_clicked", "2024-01-01T00:00");
        let found = s.db.search_photos(&form.build().criteria).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn bad_keys_are_refused() {
        let s = setup().await;

        let mut criteria = SearchCriteria::default();
        criteria
            .filters
            .insert("species') OR 1=1 --".into(), vec!["x".into()]);
        assert!(s.db.search_photos(&criteria).await.is_err());
    }
}
