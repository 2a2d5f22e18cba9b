//! PostgREST query descriptions.
//!
//! A [`TableQuery`] is built by the handlers and executed by a
//! [`Backend`](super::Backend). It is plain data so tests can inspect exactly
//! which call a route would make.

use http::Method;
use serde_json::Value;

/// Accept header asking PostgREST for a single object instead of an array.
pub const SINGLE_OBJECT_ACCEPT: &str = "application/vnd.pgrst.object+json";

/// What a query does to its table.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Select,
    Insert(Value),
    Update(Value),
    Upsert(Value),
    Delete,
}

/// Filter operators used by the routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    ILike,
}

impl FilterOp {
    fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::ILike => "ilike",
        }
    }
}

/// A single `column=op.value` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

/// Ordering applied to a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// One call against a PostgREST table.
///
/// # Example
///
/// ```
/// use roster_relay::backend::TableQuery;
///
/// let query = TableQuery::from("classes").select("*").eq("id", "7").single();
/// assert_eq!(query.table(), "classes");
/// assert!(query.is_single());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    table: String,
    operation: Operation,
    columns: Option<String>,
    filters: Vec<Filter>,
    order: Option<Order>,
    single: bool,
}

impl TableQuery {
    /// Start a query on `table`. Defaults to a select with no column list.
    #[allow(clippy::should_implement_trait)]
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            operation: Operation::Select,
            columns: None,
            filters: Vec::new(),
            order: None,
            single: false,
        }
    }

    /// Set the returned columns.
    ///
    /// On writes this also asks for the written rows back.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn insert(mut self, row: Value) -> Self {
        self.operation = Operation::Insert(row);
        self
    }

    pub fn update(mut self, changes: Value) -> Self {
        self.operation = Operation::Update(changes);
        self
    }

    /// Insert, merging into an existing row on primary key conflict.
    pub fn upsert(mut self, row: Value) -> Self {
        self.operation = Operation::Upsert(row);
        self
    }

    pub fn delete(mut self) -> Self {
        self.operation = Operation::Delete;
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    /// Case-insensitive pattern match.
    pub fn ilike(self, column: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.filter(column, FilterOp::ILike, pattern)
    }

    fn filter(mut self, column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.into(),
            ascending,
        });
        self
    }

    /// Expect exactly one row and return it as an object.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn columns(&self) -> Option<&str> {
        self.columns.as_deref()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_single(&self) -> bool {
        self.single
    }

    /// HTTP method PostgREST expects for this operation.
    pub fn method(&self) -> Method {
        match self.operation {
            Operation::Select => Method::GET,
            Operation::Insert(_) | Operation::Upsert(_) => Method::POST,
            Operation::Update(_) => Method::PATCH,
            Operation::Delete => Method::DELETE,
        }
    }

    /// Request body, if the operation carries one.
    pub fn body(&self) -> Option<&Value> {
        match &self.operation {
            Operation::Insert(v) | Operation::Update(v) | Operation::Upsert(v) => Some(v),
            Operation::Select | Operation::Delete => None,
        }
    }

    /// `Prefer` header value for writes.
    ///
    /// Writes without a column list ask for no representation, as the
    /// Supabase client libraries do when no select is chained.
    pub fn prefer(&self) -> Option<String> {
        let returning = if self.columns.is_some() {
            "return=representation"
        } else {
            "return=minimal"
        };

        match self.operation {
            Operation::Select => None,
            Operation::Upsert(_) => Some(format!("resolution=merge-duplicates,{}", returning)),
            _ => Some(returning.to_string()),
        }
    }

    /// Query string pairs in PostgREST syntax.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 2);

        if let Some(ref columns) = self.columns {
            pairs.push(("select".to_string(), strip_whitespace(columns)));
        }

        for filter in &self.filters {
            pairs.push((
                filter.column.clone(),
                format!("{}.{}", filter.op.as_str(), filter.value),
            ));
        }

        if let Some(ref order) = self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        pairs
    }
}

/// PostgREST rejects spaces in embedded selects; quoted names keep theirs.
fn strip_whitespace(columns: &str) -> String {
    let mut quoted = false;
    columns
        .chars()
        .filter(|c| {
            if *c == '"' {
                quoted = !quoted;
            }
            quoted || !c.is_whitespace()
        })
        .collect()
}
