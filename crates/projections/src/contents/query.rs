//! Filter, sort and paging over content entities.
//!
//! Paths address either a top-level field (`id`, `status`, `version`,
//! `created`, `created_by`, `last_modified`, `last_modified_by`) or a data
//! value as `data.<field>.<partition>`.

use std::cmp::Ordering;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProjectionError, Result};

use super::ContentEntity;

/// Upper bound for the number of items returned by one query.
pub const MAX_TAKE: usize = 200;

const TOP_LEVEL_FIELDS: [&str; 7] = [
    "id",
    "status",
    "version",
    "created",
    "created_by",
    "last_modified",
    "last_modified_by",
];

/// Fields holding RFC 3339 timestamps, compared by instant.
const TIMESTAMP_FIELDS: [&str; 2] = ["created", "last_modified"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Contains,
    StartsWith,
    EndsWith,
    Exists,
}

/// A filter expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterNode {
    Compare {
        path: String,
        op: CompareOp,
        value: Value,
    },
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
}

impl FilterNode {
    pub fn compare(path: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        FilterNode::Compare {
            path: path.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Eq, value)
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Ne, value)
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Lt, value)
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(path, CompareOp::Gt, value)
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Self::compare(path, CompareOp::Exists, Value::Null)
    }

    /// Matches entities whose status is any of `statuses`.
    pub fn status_in<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FilterNode::Or(
            statuses
                .into_iter()
                .map(|s| Self::eq("status", s.as_ref()))
                .collect(),
        )
    }

    fn validate(&self) -> Result<()> {
        match self {
            FilterNode::Compare { path, .. } => validate_path(path),
            FilterNode::And(nodes) | FilterNode::Or(nodes) => {
                nodes.iter().try_for_each(FilterNode::validate)
            }
            FilterNode::Not(node) => node.validate(),
        }
    }

    fn matches(&self, document: &Value) -> bool {
        match self {
            FilterNode::Compare { path, op, value } => {
                compare_op(path, resolve(document, path), *op, value)
            }
            FilterNode::And(nodes) => nodes.iter().all(|n| n.matches(document)),
            FilterNode::Or(nodes) => nodes.iter().any(|n| n.matches(document)),
            FilterNode::Not(node) => !node.matches(document),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortNode {
    pub path: String,
    pub order: SortOrder,
}

/// Filter, sort and page settings for a content query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentQuery {
    pub filter: Option<FilterNode>,
    /// Defaults to last modified descending. The id always breaks ties.
    pub sort: Vec<SortNode>,
    pub skip: usize,
    /// Capped at [`MAX_TAKE`].
    pub take: Option<usize>,
}

impl ContentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort_by(mut self, path: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortNode {
            path: path.into(),
            order,
        });
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    pub fn effective_take(&self) -> usize {
        self.take.unwrap_or(MAX_TAKE).min(MAX_TAKE)
    }
}

/// One page of results together with the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultList<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ResultList<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Runs `query` over `candidates`.
pub(crate) fn execute<'a>(
    candidates: impl IntoIterator<Item = &'a ContentEntity>,
    query: &ContentQuery,
) -> Result<ResultList<ContentEntity>> {
    if let Some(filter) = &query.filter {
        filter.validate()?;
    }
    for sort in &query.sort {
        validate_path(&sort.path)?;
    }

    let mut matches = Vec::new();
    for entity in candidates {
        let document = serde_json::to_value(entity)?;
        if query.filter.as_ref().is_none_or(|f| f.matches(&document)) {
            matches.push((document, entity));
        }
    }

    let default_sort = [SortNode {
        path: "last_modified".to_string(),
        order: SortOrder::Descending,
    }];
    let sort = if query.sort.is_empty() {
        &default_sort[..]
    } else {
        &query.sort[..]
    };

    matches.sort_by(|(a, a_entity), (b, b_entity)| {
        sort.iter()
            .map(|node| {
                let ordering = compare_for_sort(
                    &node.path,
                    resolve(a, &node.path),
                    resolve(b, &node.path),
                );
                match node.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            })
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a_entity.id.cmp(&b_entity.id))
    });

    let total = matches.len();
    let items = matches
        .into_iter()
        .skip(query.skip)
        .take(query.effective_take())
        .map(|(_, entity)| entity.clone())
        .collect();

    Ok(ResultList { items, total })
}

/// Returns true when `entity` matches `filter`.
pub(crate) fn matches(entity: &ContentEntity, filter: &FilterNode) -> Result<bool> {
    filter.validate()?;
    Ok(filter.matches(&serde_json::to_value(entity)?))
}

fn validate_path(path: &str) -> Result<()> {
    let mut segments = path.split('.');
    let valid = match segments.next() {
        Some("data") => {
            let rest: Vec<_> = segments.collect();
            !rest.is_empty() && rest.len() <= 2 && rest.iter().all(|s| !s.is_empty())
        }
        Some(field) => TOP_LEVEL_FIELDS.contains(&field) && segments.next().is_none(),
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ProjectionError::InvalidQuery(format!(
            "unknown path '{path}'"
        )))
    }
}

fn resolve<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |value, segment| value.get(segment))
        .filter(|value| !value.is_null())
}

fn compare_values(path: &str, a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(compare_strings(path, a, b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => (a == b).then_some(Ordering::Equal),
    }
}

/// Serialized timestamps drop trailing zero fractions, so text order is not
/// time order. Falls back to text order when either side does not parse.
fn compare_strings(path: &str, a: &str, b: &str) -> Ordering {
    if TIMESTAMP_FIELDS.contains(&path)
        && let (Ok(a), Ok(b)) = (
            DateTime::parse_from_rfc3339(a),
            DateTime::parse_from_rfc3339(b),
        )
    {
        return a.cmp(&b);
    }
    a.cmp(b)
}

fn compare_op(path: &str, actual: Option<&Value>, op: CompareOp, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return op == CompareOp::Ne;
    };

    match op {
        CompareOp::Exists => true,
        CompareOp::Eq => compare_values(path, actual, expected) == Some(Ordering::Equal),
        CompareOp::Ne => compare_values(path, actual, expected) != Some(Ordering::Equal),
        CompareOp::Lt => compare_values(path, actual, expected) == Some(Ordering::Less),
        CompareOp::Le => compare_values(path, actual, expected).is_some_and(Ordering::is_le),
        CompareOp::Gt => compare_values(path, actual, expected) == Some(Ordering::Greater),
        CompareOp::Ge => compare_values(path, actual, expected).is_some_and(Ordering::is_ge),
        CompareOp::Contains => match (actual, expected) {
            (Value::String(a), Value::String(e)) => a.contains(e.as_str()),
            (Value::Array(items), e) => items.contains(e),
            _ => false,
        },
        CompareOp::StartsWith => match (actual, expected) {
            (Value::String(a), Value::String(e)) => a.starts_with(e.as_str()),
            _ => false,
        },
        CompareOp::EndsWith => match (actual, expected) {
            (Value::String(a), Value::String(e)) => a.ends_with(e.as_str()),
            _ => false,
        },
    }
}

fn sort_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    }
}

/// Total order for sorting: missing values first, then by type, then by value.
fn compare_for_sort(path: &str, a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_values(path, a, b)
            .unwrap_or_else(|| sort_rank(Some(a)).cmp(&sort_rank(Some(b)))),
        _ => sort_rank(a).cmp(&sort_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use common::{AppId, ContentId, SchemaId};
    use domain::content::Status;
    use event_store::Version;
    use serde_json::json;

    use super::*;

    fn entity(title: &str, rating: i64, minutes: i64) -> ContentEntity {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let data = json!({
            "title": { "iv": title },
            "rating": { "iv": rating },
        });
        ContentEntity {
            id: ContentId::new(),
            app_id: AppId::new(),
            schema_id: SchemaId::new(),
            status: Status::Draft,
            version: Version::first(),
            data: data.as_object().cloned().unwrap_or_default(),
            created,
            created_by: "subject:me".to_string(),
            last_modified: created + Duration::minutes(minutes),
            last_modified_by: "subject:me".to_string(),
            scheduled_to: None,
            scheduled_at: None,
            scheduled_by: None,
            is_deleted: false,
        }
    }

    fn titles(result: &ResultList<ContentEntity>) -> Vec<String> {
        result
            .items
            .iter()
            .map(|e| e.data["title"]["iv"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn sample() -> Vec<ContentEntity> {
        vec![
            entity("alpha", 3, 10),
            entity("beta", 5, 30),
            entity("gamma", 1, 20),
        ]
    }

    #[test]
    fn test_default_sort_is_last_modified_descending() {
        let items = sample();
        let result = execute(&items, &ContentQuery::new()).unwrap();

        assert_eq!(titles(&result), vec!["beta", "gamma", "alpha"]);
        assert_eq!(result.total, 3);
    }

    #[test]
    fn test_filters_on_data_partitions() {
        let items = sample();
        let query = ContentQuery::new()
            .filter(FilterNode::And(vec![
                FilterNode::gt("data.rating.iv", 2),
                FilterNode::Not(Box::new(FilterNode::compare(
                    "data.title.iv",
                    CompareOp::StartsWith,
                    "b",
                ))),
            ]));

        let result = execute(&items, &query).unwrap();
        assert_eq!(titles(&result), vec!["alpha"]);
    }

    #[test]
    fn test_explicit_sort_and_paging() {
        let items = sample();
        let query = ContentQuery::new()
            .sort_by("data.rating.iv", SortOrder::Ascending)
            .skip(1)
            .take(1);

        let result = execute(&items, &query).unwrap();
        assert_eq!(titles(&result), vec!["alpha"]);
        assert_eq!(result.total, 3);
    }

    #[test]
    fn test_take_is_capped() {
        assert_eq!(ContentQuery::new().take(10_000).effective_take(), MAX_TAKE);
        assert_eq!(ContentQuery::new().effective_take(), MAX_TAKE);
        assert_eq!(ContentQuery::new().take(5).effective_take(), 5);
    }

    #[test]
    fn test_status_filter_matches_serialized_status() {
        let mut items = sample();
        items[1].status = Status::Published;

        let query = ContentQuery::new().filter(FilterNode::status_in(["Published"]));
        let result = execute(&items, &query).unwrap();

        assert_eq!(titles(&result), vec!["beta"]);
    }

    #[test]
    fn test_missing_values_only_match_not_equal() {
        let items = sample();
        let missing = ContentQuery::new().filter(FilterNode::exists("data.summary.iv"));
        assert_eq!(execute(&items, &missing).unwrap().total, 0);

        let not_equal = ContentQuery::new().filter(FilterNode::ne("data.summary.iv", "x"));
        assert_eq!(execute(&items, &not_equal).unwrap().total, 3);
    }

    #[test]
    fn test_unknown_paths_are_rejected() {
        let items = sample();
        for path in ["title", "data", "data.title.iv.deep", "app_id"] {
            let query = ContentQuery::new().filter(FilterNode::eq(path, "x"));
            assert!(
                matches!(execute(&items, &query), Err(ProjectionError::InvalidQuery(_))),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_timestamps_compare_by_instant() {
        let mut whole = entity("whole", 1, 0);
        let mut later = entity("later", 2, 0);
        let mut latest = entity("latest", 3, 0);
        later.last_modified = whole.last_modified + Duration::milliseconds(500);
        latest.last_modified = whole.last_modified + Duration::nanoseconds(500_000_001);
        whole.created = whole.last_modified + Duration::seconds(1);
        let items = vec![whole, later, latest];

        let result = execute(&items, &ContentQuery::new()).unwrap();
        assert_eq!(titles(&result), vec!["latest", "later", "whole"]);

        let after_midnight = ContentQuery::new()
            .filter(FilterNode::gt("last_modified", "2024-01-01T00:00:00Z"));
        assert_eq!(titles(&execute(&items, &after_midnight).unwrap()), vec!["latest", "later"]);

        let at_midnight = ContentQuery::new()
            .filter(FilterNode::eq("last_modified", "2024-01-01T00:00:00.000+00:00"));
        assert_eq!(titles(&execute(&items, &at_midnight).unwrap()), vec!["whole"]);

        let by_created = ContentQuery::new().sort_by("created", SortOrder::Descending);
        assert_eq!(titles(&execute(&items, &by_created).unwrap())[0], "whole");
    }

    #[test]
    fn test_timestamp_like_data_values_keep_text_order() {
        let mut short = entity("short", 1, 0);
        let mut long = entity("long", 2, 0);
        short.data.insert("at".to_string(), json!({ "iv": "2024-01-01T00:00:00Z" }));
        long.data.insert("at".to_string(), json!({ "iv": "2024-01-01T00:00:00.5Z" }));
        let items = vec![short, long];

        let query = ContentQuery::new().sort_by("data.at.iv", SortOrder::Ascending);
        assert_eq!(titles(&execute(&items, &query).unwrap()), vec!["long", "short"]);
    }
}
