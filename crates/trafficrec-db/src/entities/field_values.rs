//! Ordered value list stored in the `values` column of child rows

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// All values observed for one header/trailer/cookie name, in encounter order
///
/// Persisted as a JSON array so the same column works on PostgreSQL and SQLite.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct FieldValues(pub Vec<String>);

impl FieldValues {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for FieldValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}
