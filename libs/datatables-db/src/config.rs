//! Datatables configuration.
//!
//! A single [`DatatablesConfig`] value is built once at start-up (usually from
//! the `datatables` section of the application Figment) and handed to every
//! [`crate::Datatable`] it configures. Nothing here is global or mutable at
//! request time.
//!
//! ```yaml
//! datatables:
//!   db_adapter: sqlite            # pg | postgres | postgresql | mysql | mysql2 | sqlite | sqlite3
//!   default_additional_sort: "an_int.desc,id"
//!   default_per_page: 10
//! ```

use std::fmt;
use std::str::FromStr;

use datatables_core::DEFAULT_PER_PAGE;
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::{DatatableError, Result};

/// Database family the generated SQL targets.
///
/// Chosen by configuration, never sniffed from the connection: it decides the
/// text type columns are cast to and the regular-expression operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DbAdapterKind {
    #[default]
    Postgres,
    MySql,
    Sqlite,
}

impl DbAdapterKind {
    /// Portable text type for `CAST(column AS ...)`.
    pub fn text_type(self) -> &'static str {
        match self {
            DbAdapterKind::MySql => "CHAR",
            DbAdapterKind::Sqlite => "TEXT",
            DbAdapterKind::Postgres => "VARCHAR",
        }
    }

    /// Binary operator for a regular-expression match.
    pub fn regex_operator(self) -> &'static str {
        match self {
            DbAdapterKind::Postgres => "~",
            DbAdapterKind::MySql | DbAdapterKind::Sqlite => "REGEXP",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DbAdapterKind::Postgres => "postgres",
            DbAdapterKind::MySql => "mysql",
            DbAdapterKind::Sqlite => "sqlite",
        }
    }
}

impl FromStr for DbAdapterKind {
    type Err = DatatableError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Ok(DbAdapterKind::Postgres),
            "mysql" | "mysql2" => Ok(DbAdapterKind::MySql),
            "sqlite" | "sqlite3" => Ok(DbAdapterKind::Sqlite),
            _ => Err(DatatableError::UnknownDbAdapter(s.to_string())),
        }
    }
}

impl TryFrom<String> for DbAdapterKind {
    type Error = DatatableError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DbAdapterKind> for String {
    fn from(kind: DbAdapterKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DbAdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DatatablesConfig {
    pub db_adapter: DbAdapterKind,
    /// Comma-separated `column[.direction]` tokens appended after the
    /// request's own sort, e.g. `"an_int.desc,id"`.
    pub default_additional_sort: Option<String>,
    pub default_per_page: u64,
}

impl Default for DatatablesConfig {
    fn default() -> Self {
        Self {
            db_adapter: DbAdapterKind::default(),
            default_additional_sort: None,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl DatatablesConfig {
    /// Read the `datatables` section of a Figment; a missing section yields
    /// defaults, a malformed one is a configuration error.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let all_data: serde_json::Value = figment
            .extract()
            .map_err(|e| DatatableError::Config(e.to_string()))?;

        let Some(section) = all_data.get("datatables") else {
            return Ok(Self::default());
        };
        // surface a bad adapter name as itself, not as a serde message
        if let Some(adapter) = section.get("db_adapter").and_then(|v| v.as_str()) {
            adapter.parse::<DbAdapterKind>()?;
        }
        serde_json::from_value(section.clone()).map_err(|e| DatatableError::Config(e.to_string()))
    }

    pub fn with_adapter(mut self, db_adapter: DbAdapterKind) -> Self {
        self.db_adapter = db_adapter;
        self
    }

    pub fn with_default_additional_sort(mut self, sort: impl Into<String>) -> Self {
        self.default_additional_sort = Some(sort.into());
        self
    }
}
