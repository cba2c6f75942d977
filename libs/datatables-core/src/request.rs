//! Typed view of one DataTables request.
//!
//! Everything is built fresh per request from the untyped payload and never
//! fails: a field that is missing or unreadable is simply absent, which every
//! later stage treats as "no constraint".

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::params;
use crate::sort::SortDir;

/// A search box: the global one or a per-column one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub value: String,
    pub regex: bool,
}

impl SearchRequest {
    pub fn new(value: impl Into<String>, regex: bool) -> Self {
        Self {
            value: value.into(),
            regex,
        }
    }

    fn from_params(v: &Value) -> Option<Self> {
        let value = params::field(v, "value").and_then(params::text)?;
        let regex = params::field(v, "regex").is_some_and(params::flag);
        Some(Self::new(value.into_owned(), regex))
    }

    pub fn is_blank(&self) -> bool {
        params::is_blank(&self.value)
    }

    /// Whitespace-separated words of the query.
    pub fn atoms(&self) -> impl Iterator<Item = &str> {
        self.value.split_whitespace()
    }
}

/// Per-column request state, addressed by the column's position in the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnRequest {
    pub searchable: bool,
    pub search: Option<SearchRequest>,
}

impl Default for ColumnRequest {
    fn default() -> Self {
        Self {
            searchable: true,
            search: None,
        }
    }
}

impl ColumnRequest {
    fn from_params(v: &Value) -> Self {
        let searchable = match params::field(v, "searchable").and_then(params::text) {
            Some(s) => s != "false",
            None => true,
        };
        let search = params::field(v, "search").and_then(SearchRequest::from_params);
        Self { searchable, search }
    }

    /// The per-column search, if it carries a non-blank value.
    pub fn active_search(&self) -> Option<&SearchRequest> {
        self.search.as_ref().filter(|s| !s.is_blank())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderRequest {
    pub column: usize,
    pub dir: SortDir,
}

impl OrderRequest {
    fn from_params(v: &Value) -> Option<Self> {
        let column = params::field(v, "column").and_then(params::int)?;
        let column = usize::try_from(column).ok()?;
        let dir = params::field(v, "dir").and_then(params::text);
        Some(Self {
            column,
            dir: SortDir::from_request_token(dir.as_deref()),
        })
    }
}

/// Raw date-range filter; parsing the dates is deferred to [`crate::DateBounds`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DateRangeRequest {
    pub column: Option<usize>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub time_zone: Option<String>,
}

impl DateRangeRequest {
    fn from_params(v: &Value) -> Option<Self> {
        let obj = v.as_object().filter(|o| !o.is_empty())?;
        let text = |key: &str| {
            obj.get(key)
                .and_then(params::text)
                .map(|s| s.into_owned())
        };
        let column = obj
            .get("column")
            .and_then(params::int)
            .and_then(|i| usize::try_from(i).ok());
        Some(Self {
            column,
            start: text("start"),
            end: text("end"),
            time_zone: text("time_zone"),
        })
    }
}

/// Raw `start`/`length` pair; see [`crate::Pagination`] for the arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PaginationRequest {
    pub start: Option<i64>,
    pub length: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatatableRequest {
    pub draw: u64,
    pub search: Option<SearchRequest>,
    pub columns: BTreeMap<usize, ColumnRequest>,
    /// `None` when the payload carries no `order` map at all.
    pub order: Option<Vec<OrderRequest>>,
    pub date_range: Option<DateRangeRequest>,
    pub pagination: PaginationRequest,
}

impl DatatableRequest {
    /// Build from the decoded request parameters (JSON body or query string
    /// already turned into a JSON value). Non-object input yields an empty
    /// request.
    pub fn from_params(v: &Value) -> Self {
        let draw = params::field(v, "draw")
            .and_then(params::int)
            .and_then(|d| u64::try_from(d).ok())
            .unwrap_or(0);

        let columns = params::field(v, "columns")
            .map(|cols| {
                params::indexed(cols)
                    .into_iter()
                    .map(|(i, c)| (i, ColumnRequest::from_params(c)))
                    .collect()
            })
            .unwrap_or_default();

        let order = params::field(v, "order").map(|o| {
            params::indexed(o)
                .into_iter()
                .filter_map(|(_, entry)| OrderRequest::from_params(entry))
                .collect()
        });

        Self {
            draw,
            search: params::field(v, "search").and_then(SearchRequest::from_params),
            columns,
            order,
            date_range: params::field(v, "date_range").and_then(DateRangeRequest::from_params),
            pagination: PaginationRequest {
                start: params::field(v, "start").and_then(params::int),
                length: params::field(v, "length").and_then(params::int),
            },
        }
    }

    /// The global search, if it carries a non-blank value.
    pub fn active_search(&self) -> Option<&SearchRequest> {
        self.search.as_ref().filter(|s| !s.is_blank())
    }

    /// Request state for the view column at `index` (defaults when absent).
    pub fn column(&self, index: usize) -> ColumnRequest {
        self.columns.get(&index).cloned().unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for DatatableRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self::from_params(&raw))
    }
}
