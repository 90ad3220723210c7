use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

/// Comparison operators understood by the query endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Contains,
    StartsWith,
    Exists,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::In => "in",
            Operator::Nin => "nin",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::Exists => "exists",
        }
    }
}

/// Structured `where` clause.
///
/// ```
/// use docbase_client::Filter;
///
/// let filter = Filter::and([Filter::eq("name", "Sambo"), Filter::gte("age", 18)]);
/// assert_eq!(
///     serde_json::to_value(&filter).unwrap(),
///     serde_json::json!({"and": [{"name": {"eq": "Sambo"}}, {"age": {"gte": 18}}]})
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Field {
        field: String,
        op: Operator,
        value: Value,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// Passed through verbatim.
    Raw(Value),
}

impl Filter {
    pub fn field(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Filter::Field {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Operator::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Operator::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Operator::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Operator::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Operator::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Operator::Lte, value)
    }

    pub fn in_list<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self::field(field, Operator::In, Value::Array(values))
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::field(field, Operator::Contains, value)
    }

    pub fn exists(field: impl Into<String>, exists: bool) -> Self {
        Self::field(field, Operator::Exists, exists)
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn negate(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Filter::Field { field, op, value } => {
                let mut inner = Map::new();
                inner.insert(op.as_str().to_string(), value.clone());
                let mut outer = Map::new();
                outer.insert(field.clone(), Value::Object(inner));
                Value::Object(outer)
            }
            Filter::And(filters) => json!({ "and": Self::all_values(filters) }),
            Filter::Or(filters) => json!({ "or": Self::all_values(filters) }),
            Filter::Not(filter) => json!({ "not": filter.to_value() }),
            Filter::Raw(value) => value.clone(),
        }
    }
}

impl Filter {
    fn all_values(filters: &[Filter]) -> Vec<Value> {
        filters.iter().map(Filter::to_value).collect()
    }
}

impl Serialize for Filter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Body of `POST /collections/{name}/query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_deleted: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = Some(include);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Options for `GET /collections/{name}/documents`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub include_deleted: Option<bool>,
    pub fields: Vec<String>,
    /// Equality filters, sent as `filter[field]=value`.
    pub filters: Vec<(String, String)>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = Some(include);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((field.into(), value.to_string()));
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(String, Option<String>)> {
        let mut pairs = vec![
            ("offset".to_string(), self.offset.map(|v| v.to_string())),
            ("limit".to_string(), self.limit.map(|v| v.to_string())),
            (
                "include_deleted".to_string(),
                self.include_deleted.map(|v| v.to_string()),
            ),
            (
                "fields".to_string(),
                (!self.fields.is_empty()).then(|| self.fields.join(",")),
            ),
        ];
        pairs.extend(
            self.filters
                .iter()
                .map(|(field, value)| (format!("filter[{}]", field), Some(value.clone()))),
        );
        pairs
    }
}

/// Options for the incremental change feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncOptions {
    pub since: Option<String>,
    pub cursor: Option<String>,
    pub limit: Option<u64>,
    pub include_deleted: Option<bool>,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since.to_rfc3339_opts(SecondsFormat::Millis, true));
        self
    }

    /// Resume from a watermark returned by a previous sync.
    pub fn since_watermark(mut self, watermark: impl Into<String>) -> Self {
        self.since = Some(watermark.into());
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include_deleted(mut self, include: bool) -> Self {
        self.include_deleted = Some(include);
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(String, Option<String>)> {
        vec![
            ("since".to_string(), self.since.clone()),
            ("cursor".to_string(), self.cursor.clone()),
            ("limit".to_string(), self.limit.map(|v| v.to_string())),
            (
                "include_deleted".to_string(),
                self.include_deleted.map(|v| v.to_string()),
            ),
        ]
    }
}
