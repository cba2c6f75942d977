//! Condition builder: search values → sea-query predicates.
//!
//! Non-regex matches compare a text-cast column against `%value%` with LIKE
//! wildcards in the value escaped. Regex matches bind the pattern untouched
//! against the raw column using the adapter's native operator.

use datatables_core::DatatableRequest;
use sea_orm::sea_query::{Alias, BinOper, Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::Condition;

use crate::config::DbAdapterKind;
use crate::date_range::date_range_condition;
use crate::plan::ViewColumns;
use crate::resolver::TableRef;

/* ---------- LIKE helpers ---------- */

/// Escape character for LIKE patterns. Quotes identically on every backend.
const LIKE_ESCAPE: char = '!';

pub(crate) fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | LIKE_ESCAPE => {
                out.push(LIKE_ESCAPE);
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

fn like_contains(s: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", like_escape(s))).escape(LIKE_ESCAPE)
}

/* ---------- leaf predicates ---------- */

/// `CAST(table.column AS <text type>)`.
pub fn cast_column(table: &TableRef, column: &str, adapter: DbAdapterKind) -> SimpleExpr {
    Func::cast_as(table.column(column), Alias::new(adapter.text_type())).into()
}

/// One (column, value, mode) predicate.
pub fn search_condition(
    table: &TableRef,
    column: &str,
    value: &str,
    regex: bool,
    adapter: DbAdapterKind,
) -> SimpleExpr {
    if regex {
        Expr::expr(table.column(column)).binary(
            BinOper::Custom(adapter.regex_operator()),
            value.to_string(),
        )
    } else {
        Expr::expr(cast_column(table, column, adapter)).like(like_contains(value))
    }
}

/* ---------- composition ---------- */

/// Global search box: every whitespace-separated atom must match at least
/// one searchable column.
pub fn simple_search(
    columns: &ViewColumns,
    req: &DatatableRequest,
    adapter: DbAdapterKind,
) -> Option<Condition> {
    let search = req.active_search()?;

    let searchable: Vec<_> = columns
        .iter()
        .filter(|col| req.column(col.index).searchable)
        .collect();
    if searchable.is_empty() {
        tracing::debug!("global search ignored, no searchable columns");
        return None;
    }

    let cond = search.atoms().fold(Condition::all(), |all, atom| {
        let any = searchable.iter().fold(Condition::any(), |any, col| {
            any.add(search_condition(
                &col.table,
                col.field(),
                atom,
                search.regex,
                adapter,
            ))
        });
        all.add(any)
    });
    Some(cond)
}

/// Per-column search boxes ANDed together, plus the date range.
pub fn composite_search(
    columns: &ViewColumns,
    req: &DatatableRequest,
    adapter: DbAdapterKind,
) -> Option<Condition> {
    let mut parts: Vec<SimpleExpr> = columns
        .iter()
        .filter_map(|col| {
            let column_req = req.column(col.index);
            let search = column_req.active_search()?;
            Some(search_condition(
                &col.table,
                col.field(),
                &search.value,
                search.regex,
                adapter,
            ))
        })
        .collect();

    parts.extend(date_range_condition(columns, req, adapter));

    if parts.is_empty() {
        return None;
    }
    Some(parts.into_iter().fold(Condition::all(), Condition::add))
}

/// Filter stage: simple search AND composite search.
pub fn filter_records(
    columns: &ViewColumns,
    req: &DatatableRequest,
    adapter: DbAdapterKind,
) -> Option<Condition> {
    match (
        simple_search(columns, req, adapter),
        composite_search(columns, req, adapter),
    ) {
        (None, None) => None,
        (Some(c), None) | (None, Some(c)) => Some(c),
        (Some(simple), Some(composite)) => Some(Condition::all().add(simple).add(composite)),
    }
}
