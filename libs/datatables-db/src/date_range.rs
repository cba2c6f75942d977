//! Date-range predicate over a view column rendered as timestamp text.
//!
//! Both sides of the comparison are `YYYY-MM-DD HH:MM:SS` in UTC. SQLite
//! normalises the stored text through `datetime(..)`, which accepts the
//! `T` separator and `+HH:MM` offsets SeaORM writes. MySQL and Postgres
//! cast to text and keep the first 19 characters, dropping fractional
//! seconds and the `+00` a Postgres `timestamptz` carries. A `timestamptz`
//! renders in the session time zone, so Postgres sessions are expected to
//! run in UTC.

use datatables_core::date_range::sql_text;
use datatables_core::{DatatableRequest, DateBounds};
use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};

use crate::condition::cast_column;
use crate::config::DbAdapterKind;
use crate::plan::ViewColumns;
use crate::resolver::TableRef;

/// Length of `YYYY-MM-DD HH:MM:SS`.
const TIMESTAMP_TEXT_LEN: i32 = 19;

/// `table.column` as UTC timestamp text, comparable with [`sql_text`].
pub fn timestamp_text(table: &TableRef, column: &str, adapter: DbAdapterKind) -> SimpleExpr {
    match adapter {
        DbAdapterKind::Sqlite => Func::cust(Alias::new("datetime"))
            .arg(table.column(column))
            .into(),
        DbAdapterKind::MySql | DbAdapterKind::Postgres => Func::cust(Alias::new("LEFT"))
            .arg(cast_column(table, column, adapter))
            .arg(TIMESTAMP_TEXT_LEN)
            .into(),
    }
}

/// `None` when the request has no date range, names no usable column, or
/// neither bound parses.
pub fn date_range_condition(
    columns: &ViewColumns,
    req: &DatatableRequest,
    adapter: DbAdapterKind,
) -> Option<SimpleExpr> {
    let range = req.date_range.as_ref()?;
    let Some(index) = range.column else {
        tracing::debug!("date range without a column index, ignored");
        return None;
    };
    let column = columns.get(index)?;
    let bounds = DateBounds::from_request(range)?;

    let stamp = Expr::expr(timestamp_text(&column.table, column.field(), adapter));
    Some(match bounds {
        DateBounds::From(start) => stamp.gte(sql_text(&start)),
        DateBounds::Until(end) => stamp.lte(sql_text(&end)),
        DateBounds::Between(start, end) => stamp.between(sql_text(&start), sql_text(&end)),
    })
}
