//! Converts between the labels people read ("Bird Family") and the keys we
//! store ("bird_family").
//!
//! The two directions are NOT inverses. `display_to_db_key` is lossy (any
//! whitespace run collapses into one `_`, and casing is thrown away), and
//! some keys have a hand-picked display label that the general rule would
//! never produce. Those live in [`DISPLAY_OVERRIDES`] so the asymmetry stays
//! in one place.

/// Keys whose display label doesn't follow the general rule.
///
/// `category` shows up as "Bird Family", but "Bird Family" normalizes to
/// `bird_family`, not back to `category`.
pub const DISPLAY_OVERRIDES: &[(&str, &str)] = &[("category", "Bird Family")];

/// Converts a display label into its storage key.
///
/// Lowercases everything and replaces each run of whitespace with one `_`.
pub fn display_to_db_key(display: &str) -> String {
    let mut key = String::with_capacity(display.len());
    let mut in_whitespace = false;

    for c in display.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                key.push('_');
            }
            in_whitespace = true;
        } else {
            key.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }

    key
}

/// Converts a storage key into the label we show.
pub fn db_key_to_display(key: &str) -> String {
    if let Some(label) = display_override(key) {
        return label.to_string();
    }

    let spaced = key.replace('_', " ");
    let mut display = String::with_capacity(spaced.len());
    let mut at_word_start = true;

    for c in spaced.chars() {
        // word boundaries are the same ones a `\b\w` regex would find
        let is_word_char = c.is_alphanumeric() || c == '_';
        if is_word_char && at_word_start {
            display.extend(c.to_uppercase());
        } else {
            display.push(c);
        }
        at_word_start = !is_word_char;
    }

    display
}

/// The override label for this key, if it has one.
pub fn display_override(key: &str) -> Option<&'static str> {
    DISPLAY_OVERRIDES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}

/// Date-typed keys (like `date_clicked`) hold `YYYY-MM-DDTHH:MM` strings
/// instead of tag values.
pub fn is_date_field(key: &str) -> bool {
    key.contains("date")
}

/// Whether a key is already in storage form: non-empty, and only lowercase
/// ASCII letters, digits, and `_`.
pub fn is_normalized_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_clicked_display() {
        assert_eq!(db_key_to_display("date_clicked"), "Date Clicked");
    }

    #[test]
    fn category_is_overridden() {
        assert_eq!(db_key_to_display("category"), "Bird Family");
        assert_eq!(display_to_db_key("Bird Family"), "bird_family");

        // ...which means it doesn't come back around
        assert_ne!(
            display_to_db_key(&db_key_to_display("category")),
            "category"
        );
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(display_to_db_key("Bird   Name"), "bird_name");
        assert_eq!(display_to_db_key("Bird\tName\n"), "bird_name_");
        assert_eq!(display_to_db_key("species"), "species");
    }

    #[test]
    fn normalized_keys_round_trip() {
        for key in [
            "species",
            "date_clicked",
            "date_uploaded",
            "bird_name",
            "city",
            "motion",
            "location_2",
        ] {
            assert!(is_normalized_key(key), "{key} should be normalized");
            assert_eq!(display_to_db_key(&db_key_to_display(key)), key);
        }
    }

    #[test]
    fn many_labels_one_key() {
        assert_eq!(display_to_db_key("Bird Name"), "bird_name");
        assert_eq!(display_to_db_key("BIRD NAME"), "bird_name");
        assert_eq!(display_to_db_key("bird  name"), "bird_name");
    }

    #[test]
    fn display_is_idempotent_on_normalized_keys() {
        let once = db_key_to_display(&display_to_db_key("Bird Name"));
        let twice = db_key_to_display(&display_to_db_key(&once));
        assert_eq!(once, twice);
        assert_eq!(once, "Bird Name");
    }

    #[test]
    fn date_fields() {
        assert!(is_date_field("date_clicked"));
        assert!(is_date_field("date_uploaded"));
        assert!(!is_date_field("species"));
    }

    #[test]
    fn normalized_key_check() {
        assert!(!is_normalized_key(""));
        assert!(!is_normalized_key("Bird Name"));
        assert!(!is_normalized_key("tags'); --"));
        assert!(is_normalized_key("bird_name"));
    }
}
