//! Transport- and database-agnostic building blocks for DataTables-style
//! server-side processing.
//!
//! The crate turns an untyped request payload into a typed [`DatatableRequest`]
//! and owns the pieces of the translation that need no database: column spec
//! parsing, sort directions, date-range normalisation and pagination
//! arithmetic. Turning those into SQL belongs to `datatables-db`.

pub mod column;
pub mod date_range;
pub mod page;
pub mod params;
pub mod request;
pub mod sort;

pub use column::ColumnSpec;
pub use date_range::{DateBounds, DEFAULT_TIME_ZONE};
pub use page::{Pagination, ResultPage, DEFAULT_PER_PAGE};
pub use request::{
    ColumnRequest, DatatableRequest, DateRangeRequest, OrderRequest, PaginationRequest,
    SearchRequest,
};
pub use sort::SortDir;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A view column must look like `Entity.field` with both parts present.
    #[error("invalid column spec '{0}': expected 'Entity.field'")]
    InvalidColumnSpec(String),
}

pub type Result<T> = std::result::Result<T, Error>;
