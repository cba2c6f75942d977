//! Resolved view columns and the query plan they produce.

use datatables_core::{ColumnSpec, Pagination};
use sea_orm::sea_query::SelectStatement;
use sea_orm::{Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::resolver::{TableRef, TableResolver};
use crate::sort::OrderTerm;
use crate::Result;

/// A view column bound to its position in the request payload and to the
/// table it resolved to. Built once per datatable, never per request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub index: usize,
    pub spec: ColumnSpec,
    pub table: TableRef,
}

impl ResolvedColumn {
    pub fn field(&self) -> &str {
        self.spec.field()
    }
}

/// The ordered, index-aligned view column list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewColumns {
    columns: Vec<ResolvedColumn>,
}

impl ViewColumns {
    /// Parse and resolve every raw `Entity.field` entry. Fails on the first
    /// malformed entry.
    pub fn resolve<I, T>(raw: I, resolver: &TableResolver) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let columns = raw
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let spec = ColumnSpec::parse(raw.as_ref())?;
                let table = resolver.resolve(&spec);
                Ok(ResolvedColumn { index, spec, table })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    /// Column at a request index; `None` (and a debug event) when the index
    /// is past the end of the list.
    pub fn get(&self, index: usize) -> Option<&ResolvedColumn> {
        let column = self.columns.get(index);
        if column.is_none() {
            tracing::debug!(index, len = self.columns.len(), "column index out of range, skipped");
        }
        column
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedColumn> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Everything a request translates into, before any database is touched.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    /// Simple search AND composite search AND date range; `None` when the
    /// request constrains nothing.
    pub filter: Option<Condition>,
    /// Request sort first, default additional sort after it.
    pub order: Vec<OrderTerm>,
    pub pagination: Pagination,
}

impl QueryPlan {
    /// Comma-joined `ORDER BY` body, e.g. `users.email DESC, an_int ASC`.
    pub fn order_clause(&self) -> String {
        self.order
            .iter()
            .map(OrderTerm::to_sql_fragment)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/* ---------- applying a plan ---------- */

/// Apply the stages of a [`QueryPlan`] to a select, the way
/// `QueryFilter`/`QueryOrder` compose on SeaORM selects.
pub trait ApplyPlan: Sized {
    fn apply_filter(self, filter: Option<&Condition>) -> Self;
    fn apply_order(self, order: &[OrderTerm]) -> Self;
    fn apply_window(self, pagination: &Pagination) -> Self;

    fn apply_plan(self, plan: &QueryPlan) -> Self {
        self.apply_filter(plan.filter.as_ref())
            .apply_order(&plan.order)
            .apply_window(&plan.pagination)
    }
}

impl<E: EntityTrait> ApplyPlan for sea_orm::Select<E> {
    fn apply_filter(self, filter: Option<&Condition>) -> Self {
        match filter {
            Some(cond) => self.filter(cond.clone()),
            None => self,
        }
    }

    fn apply_order(self, order: &[OrderTerm]) -> Self {
        order
            .iter()
            .fold(self, |select, term| select.order_by(term.expr(), term.order()))
    }

    fn apply_window(self, pagination: &Pagination) -> Self {
        match pagination.limit() {
            Some(limit) => self.offset(pagination.offset).limit(limit),
            None => self,
        }
    }
}

impl ApplyPlan for SelectStatement {
    fn apply_filter(mut self, filter: Option<&Condition>) -> Self {
        if let Some(cond) = filter {
            self.cond_where(cond.clone());
        }
        self
    }

    fn apply_order(mut self, order: &[OrderTerm]) -> Self {
        for term in order {
            self.order_by_expr(term.expr(), term.order());
        }
        self
    }

    fn apply_window(mut self, pagination: &Pagination) -> Self {
        if let Some(limit) = pagination.limit() {
            self.offset(pagination.offset).limit(limit);
        }
        self
    }
}
