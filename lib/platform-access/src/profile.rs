//! Partial updates of the signed-in user's profile row.

use crate::data::Row;
use serde_json::Value;

/// Columns a profile update may never touch. The role is owned by the role
/// resolver and administrators; the id is the row key.
pub const PROTECTED_FIELDS: [&str; 2] = ["id", "role"];

/// A set of column changes for the profile row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    fields: Row,
}

impl ProfileUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column` to `value`.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Returns the first protected column in the update, if any.
    #[must_use]
    pub fn protected_field(&self) -> Option<&str> {
        PROTECTED_FIELDS
            .into_iter()
            .find(|field| self.fields.contains_key(*field))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn fields(&self) -> &Row {
        &self.fields
    }

    #[must_use]
    pub fn into_row(self) -> Row {
        self.fields
    }
}

impl From<Row> for ProfileUpdate {
    fn from(fields: Row) -> Self {
        Self { fields }
    }
}
