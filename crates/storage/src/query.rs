//! Query-Execution Interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Reading, StorageError};

/// Fully-qualified reading table.
///
/// Identifiers come from operator configuration, never from callers, and are
/// restricted to `[A-Za-z0-9_-]` because they are rendered into query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTableRef")]
pub struct TableRef {
    project: String,
    dataset: String,
    table: String,
}

#[derive(Deserialize)]
struct RawTableRef {
    project: String,
    dataset: String,
    table: String,
}

impl TryFrom<RawTableRef> for TableRef {
    type Error = StorageError;

    fn try_from(raw: RawTableRef) -> Result<Self, Self::Error> {
        TableRef::new(raw.project, raw.dataset, raw.table)
    }
}

impl TableRef {
    /// Build a table reference, rejecting unsafe identifiers
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let table_ref = Self {
            project: project.into(),
            dataset: dataset.into(),
            table: table.into(),
        };
        for ident in [&table_ref.project, &table_ref.dataset, &table_ref.table] {
            check_identifier(ident)?;
        }
        Ok(table_ref)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Quoted `"dataset"."table"` form for SQL.
    ///
    /// SQLite has no project level; the dataset maps to a schema name.
    pub fn sql_name(&self) -> String {
        format!("\"{}\".\"{}\"", self.dataset, self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

fn check_identifier(ident: &str) -> Result<(), StorageError> {
    let valid = !ident.is_empty()
        && ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(ident.to_string()))
    }
}

/// Typed value bound to a named query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryParam {
    Int64(i64),
}

/// Query text with `@name` placeholders and their bound values
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedQuery {
    pub sql: String,
    pub params: Vec<(&'static str, QueryParam)>,
}

impl ParameterizedQuery {
    /// Look up a bound parameter by name
    pub fn param(&self, name: &str) -> Option<QueryParam> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, value)| *value)
    }

    /// Rewrite `@name` placeholders as numbered `?N` markers, where `N` is the
    /// 1-based position of the parameter in `params`.
    pub fn to_numbered(&self) -> Result<String, StorageError> {
        let mut out = String::with_capacity(self.sql.len());
        let mut chars = self.sql.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '@' {
                out.push(c);
                continue;
            }

            let mut name = String::new();
            while let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    name.push(next);
                    chars.next();
                } else {
                    break;
                }
            }

            let position = self
                .params
                .iter()
                .position(|(n, _)| *n == name)
                .ok_or_else(|| {
                    StorageError::InvalidQuery(format!("unbound parameter @{}", name))
                })?;
            out.push_str(&format!("?{}", position + 1));
        }

        Ok(out)
    }
}

/// Boundary to the tabular store.
///
/// Implementations run the query as-is and decode each row into a
/// [`Reading`], failing on rows that do not match that shape.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &ParameterizedQuery) -> Result<Vec<Reading>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_rendering() {
        let table = TableRef::new("iot-prod", "main", "sensor_readings").unwrap();
        assert_eq!(table.sql_name(), "\"main\".\"sensor_readings\"");
        assert_eq!(table.to_string(), "iot-prod.main.sensor_readings");
    }

    #[test]
    fn test_table_ref_rejects_unsafe_identifiers() {
        assert!(TableRef::new("p", "main", "readings\"; DROP TABLE x").is_err());
        assert!(TableRef::new("p", "", "readings").is_err());
        assert!(TableRef::new("p", "main", "read ings").is_err());
    }

    #[test]
    fn test_numbered_placeholders() {
        let query = ParameterizedQuery {
            sql: "SELECT * FROM t WHERE a BETWEEN @lo AND @hi OR b = @lo".to_string(),
            params: vec![("lo", QueryParam::Int64(1)), ("hi", QueryParam::Int64(2))],
        };
        assert_eq!(
            query.to_numbered().unwrap(),
            "SELECT * FROM t WHERE a BETWEEN ?1 AND ?2 OR b = ?1"
        );
        assert_eq!(query.param("hi"), Some(QueryParam::Int64(2)));
    }

    #[test]
    fn test_unbound_placeholder() {
        let query = ParameterizedQuery {
            sql: "SELECT * FROM t WHERE a = @missing".to_string(),
            params: vec![],
        };
        assert!(matches!(
            query.to_numbered(),
            Err(StorageError::InvalidQuery(_))
        ));
    }
}
