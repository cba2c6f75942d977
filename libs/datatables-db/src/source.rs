//! Record sources the orchestrator runs plans against.

use async_trait::async_trait;
use sea_orm::sea_query::{Alias, Expr, Query, SelectStatement};
use sea_orm::{
    Condition, ConnectionTrait, EntityTrait, FromQueryResult, IdenStatic, Iterable, PaginatorTrait,
};
use serde_json::Value as JsonValue;

use crate::plan::{ApplyPlan, QueryPlan};
use crate::Result;

/// The only capability the orchestrator depends on: an unordered,
/// unfiltered collection it can count and fetch from.
#[async_trait]
pub trait DataSourceAdapter: Send + Sync {
    type Row: Send;

    /// Column names of the result schema, used to validate the default
    /// additional sort.
    fn column_names(&self) -> Vec<String>;

    /// Rows matching `filter`, or all rows when it is `None`.
    async fn count(&self, filter: Option<&Condition>) -> Result<u64>;

    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Self::Row>>;
}

/* ---------- typed entity source ---------- */

/// A SeaORM `Select<E>` plus the connection to run it on.
///
/// The select is the raw record set and may already carry joins or filters
/// of its own; the plan is layered on top.
pub struct SeaOrmSource<E: EntityTrait, C> {
    select: sea_orm::Select<E>,
    conn: C,
}

impl<E: EntityTrait, C> SeaOrmSource<E, C> {
    pub fn new(select: sea_orm::Select<E>, conn: C) -> Self {
        Self { select, conn }
    }

    /// `E::find()` over `conn`.
    pub fn all(conn: C) -> Self {
        Self::new(E::find(), conn)
    }
}

#[async_trait]
impl<E, C> DataSourceAdapter for SeaOrmSource<E, C>
where
    E: EntityTrait,
    E::Model: FromQueryResult + Send + Sync,
    C: ConnectionTrait + Send + Sync,
{
    type Row = E::Model;

    fn column_names(&self) -> Vec<String> {
        E::Column::iter().map(|c| c.as_str().to_string()).collect()
    }

    async fn count(&self, filter: Option<&Condition>) -> Result<u64> {
        let select = self.select.clone().apply_filter(filter);
        Ok(select.count(&self.conn).await?)
    }

    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<E::Model>> {
        let select = self.select.clone().apply_plan(plan);
        Ok(select.all(&self.conn).await?)
    }
}

/* ---------- untyped table source ---------- */

/// A table addressed by name with an explicit column list. Rows come back as
/// JSON objects keyed by column name.
pub struct TableSource<C> {
    conn: C,
    table: String,
    columns: Vec<String>,
}

impl<C> TableSource<C> {
    pub fn new<I, T>(conn: C, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            conn,
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn base_select(&self) -> SelectStatement {
        let mut stmt = Query::select();
        stmt.from(Alias::new(self.table.as_str()));
        stmt
    }
}

#[async_trait]
impl<C> DataSourceAdapter for TableSource<C>
where
    C: ConnectionTrait + Send + Sync,
{
    type Row = JsonValue;

    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }

    async fn count(&self, filter: Option<&Condition>) -> Result<u64> {
        let mut stmt = self.base_select().apply_filter(filter);
        stmt.expr_as(Expr::cust("COUNT(*)"), Alias::new("num_items"));

        let backend = self.conn.get_database_backend();
        let row = self.conn.query_one(backend.build(&stmt)).await?;
        let total = match row {
            Some(row) => row.try_get::<i64>("", "num_items")?,
            None => 0,
        };
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<JsonValue>> {
        let mut stmt = self.base_select();
        for column in &self.columns {
            stmt.column((Alias::new(self.table.as_str()), Alias::new(column.as_str())));
        }
        let stmt = stmt.apply_plan(plan);

        let backend = self.conn.get_database_backend();
        let rows = JsonValue::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;
        Ok(rows)
    }
}
