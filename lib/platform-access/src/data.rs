//! The data service boundary.
//!
//! Tables are addressed by name and rows are plain JSON objects. A
//! [`Filter`] carries the subset of query features the application needs:
//! equality, is-null, column selection and ordering.

use crate::error::DataError;
use async_trait::async_trait;
use serde_json::Value;

/// One row of a table.
pub type Row = serde_json::Map<String, Value>;

/// A single column predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    Eq { column: String, value: Value },
    /// `column IS NULL`, also true when the column is absent.
    IsNull { column: String },
}

impl Condition {
    /// Returns the column the predicate applies to.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::IsNull { column } => column,
        }
    }

    /// Returns true if `row` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq { column, value } => row.get(column) == Some(value),
            Self::IsNull { column } => row.get(column).is_none_or(Value::is_null),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// Returns the wire suffix for the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Row selection for reads and writes.
///
/// Conditions are combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
    select: Option<String>,
    order: Option<(String, Direction)>,
}

impl Filter {
    /// Creates a filter matching every row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `column` to equal `value`.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Requires `column` to be null.
    #[must_use]
    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.conditions.push(Condition::IsNull {
            column: column.into(),
        });
        self
    }

    /// Limits returned columns. The expression is passed through as-is,
    /// so embedded relations such as `*, contacts(full_name)` work.
    #[must_use]
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    /// Orders results by `column`.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    /// Returns the row predicates.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns the column selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.select.as_deref()
    }

    /// Returns the ordering, if any.
    #[must_use]
    pub fn ordering(&self) -> Option<(&str, Direction)> {
        self.order
            .as_ref()
            .map(|(column, direction)| (column.as_str(), *direction))
    }

    /// Returns true if `row` satisfies every condition.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|condition| condition.matches(row))
    }

    /// Renders the filter as key parts. Filters selecting different rows,
    /// columns or orderings never render the same.
    #[must_use]
    pub fn key_parts(&self) -> Vec<String> {
        let mut parts: Vec<String> = self
            .conditions
            .iter()
            .map(|condition| match condition {
                Condition::Eq { column, value } => format!("{column}=eq.{value}"),
                Condition::IsNull { column } => format!("{column}=is.null"),
            })
            .collect();
        if let Some(select) = &self.select {
            parts.push(format!("select={select}"));
        }
        if let Some((column, direction)) = &self.order {
            parts.push(format!("order={column}.{}", direction.as_str()));
        }
        parts
    }
}

/// The hosted data service.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait DataService: Send + Sync {
    /// Returns rows of `table` matching `filter`.
    async fn read(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, DataError>;

    /// Applies `patch` to rows matching `filter`, returning the updated rows.
    ///
    /// An empty result means no row matched.
    async fn write(&self, table: &str, filter: &Filter, patch: Row)
    -> Result<Vec<Row>, DataError>;

    /// Inserts `rows`, returning them as stored.
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, DataError>;

    /// Calls a stored function with named arguments.
    async fn rpc(&self, function: &str, args: Row) -> Result<Value, DataError>;
}
