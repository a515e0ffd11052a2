//! Turns [`SearchCriteria`] into a statement against the photo table.

use sea_query::extension::sqlite::SqliteExpr;
use sea_query::*;
use sea_query_binder::{SqlxBinder as _, SqlxValues};

use crate::{error::SearchError, tags::codec};

use super::criteria::{DateRange, SearchCriteria};

/// the photo table
#[derive(Iden)]
pub enum Photos {
    Table,
    Id,
    Filename,
    Url,
    Tags,
    UploadedAt,
}

/// A piece of a search that must become a query clause to be used.
pub trait ToQuery {
    /// Converts this into a clause for querying the database.
    fn to_query(self) -> Result<Condition, SearchError>;
}

/// "the photo's `key` tag starts with one of these", ignoring case.
#[derive(Clone, Debug, PartialEq)]
pub struct TagFilter<'a> {
    pub key: &'a str,
    pub values: &'a [String],
}

/// "the photo's `field` date is within this range"
#[derive(Clone, Debug, PartialEq)]
pub struct DateFilter<'a> {
    pub field: &'a str,
    pub range: &'a DateRange,
}

/// Only normalized keys are allowed to reach the JSON lookup.
fn checked_key(key: &str) -> Result<&str, SearchError> {
    if codec::is_normalized_key(key) {
        Ok(key)
    } else {
        tracing::warn!("refusing to search on malformed key `{key}`");
        Err(SearchError::InvalidKey(key.to_string()))
    }
}

/// Makes a `LIKE` pattern that matches anything starting with `prefix`.
///
/// `%`, `_`, and `\` in the prefix are escaped, so they match themselves.
pub fn prefix_pattern(prefix: &str) -> String {
    let mut s = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            s.push('\\');
        }
        s.push(c);
    }

    // IMPORTANT! this does the 'starts with' part in SQLite
    s.push('%');
    s
}

impl ToQuery for TagFilter<'_> {
    #[tracing::instrument]
    fn to_query(self) -> Result<Condition, SearchError> {
        let key = checked_key(self.key)?;

        // `LIKE` is case-insensitive in SQLite :)
        let any = self.values.iter().fold(Cond::any(), |cond, value| {
            tracing::debug!("Looking for `{key}` starting with `{value}`");
            cond.add(
                Expr::col(Photos::Tags)
                    .cast_json_field(key)
                    .like(LikeExpr::new(prefix_pattern(value)).escape('\\')),
            )
        });

        Ok(any)
    }
}

impl ToQuery for DateFilter<'_> {
    #[tracing::instrument]
    fn to_query(self) -> Result<Condition, SearchError> {
        let field = checked_key(self.field)?;
        let mut all = Cond::all();

        // these are `YYYY-MM-DDTHH:MM` strings, so comparing text works
        if !self.range.start.is_empty() {
            all = all.add(
                Expr::col(Photos::Tags)
                    .cast_json_field(field)
                    .gte(self.range.start.clone()),
            );
        }
        if !self.range.end.is_empty() {
            all = all.add(
                Expr::col(Photos::Tags)
                    .cast_json_field(field)
                    .lte(self.range.end.clone()),
            );
        }

        Ok(all)
    }
}

impl SearchCriteria {
    /// Makes the `WHERE` condition for these criteria.
    ///
    /// Returns `None` when nothing is being filtered.
    pub fn to_condition(&self) -> Result<Option<Condition>, SearchError> {
        let mut cond = Cond::all();
        let mut any_clause = false;

        for (key, values) in &self.filters {
            if values.is_empty() {
                continue;
            }
            cond = cond.add(TagFilter { key, values }.to_query()?);
            any_clause = true;
        }

        for (field, range) in &self.date_ranges {
            if range.is_empty() {
                continue;
            }
            cond = cond.add(DateFilter { field, range }.to_query()?);
            any_clause = true;
        }

        Ok(any_clause.then_some(cond))
    }

    /// Builds the full select (newest upload first) along with its bound
    /// values.
    pub fn to_statement(&self) -> Result<(String, SqlxValues), SearchError> {
        let mut select = Query::select();
        select.column(Asterisk).from(Photos::Table);

        if let Some(cond) = self.to_condition()? {
            select.cond_where(cond);
        }

        select.order_by(Photos::UploadedAt, Order::Desc);
        Ok(select.build_sqlx(SqliteQueryBuilder))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::prefix_pattern;
    use crate::{
        error::SearchError,
        search::criteria::{DateRange, SearchCriteria},
    };

    #[test]
    fn prefix_patterns_escape_wildcards() {
        assert_eq!(prefix_pattern("Spar"), "Spar%");
        assert_eq!(prefix_pattern("50%_off"), "50\\%\\_off%");
        assert_eq!(prefix_pattern(""), "%");
    }

    #[test]
    fn no_filters_no_where() {
        let (select, _values) = SearchCriteria::default().to_statement().unwrap();
        assert_eq!(
            r#"SELECT * FROM "photos" ORDER BY "uploaded_at" DESC"#, select,
            "select statements should match"
        );
    }

    #[test]
    fn filters_add_a_where() {
        let criteria = SearchCriteria {
            filters: BTreeMap::from([("species".into(), vec!["Sparrow".into()])]),
            date_ranges: BTreeMap::from([(
                "date_clicked".into(),
                DateRange::new("2024-01-01T00:00", ""),
            )]),
        };

        let (select, _values) = criteria.to_statement().unwrap();
        assert!(select.contains("WHERE"), "{select}");
        assert!(select.contains("LIKE"), "{select}");
        assert!(select.contains(">="), "{select}");
        assert!(!select.contains("<="), "{select}");
        assert!(select.ends_with(r#"ORDER BY "uploaded_at" DESC"#), "{select}");
    }

    #[test]
    fn empty_entries_are_skipped() {
        let criteria = SearchCriteria {
            filters: BTreeMap::from([("species".into(), vec![])]),
            date_ranges: BTreeMap::from([("date_clicked".into(), DateRange::default())]),
        };
        assert!(criteria.to_condition().unwrap().is_none());
    }

    #[test]
    fn malformed_keys_are_refused() {
        let criteria = SearchCriteria {
            filters: BTreeMap::from([("species' OR 1=1".into(), vec!["x".into()])]),
            date_ranges: BTreeMap::new(),
        };

        assert!(matches!(
            criteria.to_statement(),
            Err(SearchError::InvalidKey(_))
        ));
    }
}
