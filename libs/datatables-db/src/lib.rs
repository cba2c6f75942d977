//! DataTables request → SeaORM query translation.
//!
//! This crate takes the typed request model from `datatables-core` and turns
//! it into sea-query conditions, order terms and an offset/limit window, then
//! runs them against a [`DataSourceAdapter`].
//!
//! # Features
//! - `pg`, `mysql`, `sqlite`: enable the matching SQLx backend of SeaORM
//!
//! # Pipeline
//! `fetch → filter (simple, then composite + date range) → sort (request,
//! then default additional sort) → paginate`. Each stage is a pure function
//! of the request and the resolved view columns; the result is a
//! [`QueryPlan`] that an adapter applies to its own select statement.
//!
//! # Example
//! ```rust,no_run
//! # async fn demo(db: sea_orm::DatabaseConnection) -> datatables_db::Result<()> {
//! use datatables_core::DatatableRequest;
//! use datatables_db::{Datatable, DatatablesConfig, DbAdapterKind, EntityRegistry, TableSource};
//!
//! let source = TableSource::new(db, "users", ["id", "username", "email"]);
//! let table = Datatable::builder()
//!     .source(source)
//!     .view_columns(["User.username", "User.email"])
//!     .registry(EntityRegistry::new().register("User", "users"))
//!     .config(DatatablesConfig::default().with_adapter(DbAdapterKind::Sqlite))
//!     .build()?;
//!
//! let req = DatatableRequest::from_params(&serde_json::json!({"draw": "1", "search": {"value": "doe"}}));
//! let page = table.run(&req).await?;
//! println!("{}", serde_json::to_string(&page).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod condition;
pub mod config;
pub mod datatable;
pub mod date_range;
pub mod plan;
pub mod resolver;
pub mod sort;
pub mod source;

pub use config::{DatatablesConfig, DbAdapterKind};
pub use datatable::{Datatable, DatatableBuilder};
pub use plan::{ApplyPlan, QueryPlan, ResolvedColumn, ViewColumns};
pub use resolver::{EntityRegistry, ResolveStrategy, TableRef, TableResolver};
pub use sort::OrderTerm;
pub use source::{DataSourceAdapter, SeaOrmSource, TableSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatatableError {
    #[error("no record source configured for the datatable")]
    MissingRecordSource,

    #[error("no view columns configured for the datatable")]
    MissingViewColumns,

    #[error("unknown database adapter: {0}")]
    UnknownDbAdapter(String),

    #[error(transparent)]
    InvalidColumnSpec(#[from] datatables_core::Error),

    #[error("invalid datatables configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

impl DatatableError {
    /// Structural misconfiguration, detected at construction time.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, DatatableError::Db(_))
    }
}

pub type Result<T> = std::result::Result<T, DatatableError>;
