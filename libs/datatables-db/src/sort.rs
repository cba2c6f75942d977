//! Sort builder: request order plus the configured default additional sort.

use datatables_core::{DatatableRequest, SortDir};
use sea_orm::sea_query::{Alias, Expr, Order, SimpleExpr};

use crate::plan::ViewColumns;
use crate::resolver::TableRef;

/// One `ORDER BY` entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderTerm {
    /// `None` for default-sort columns, which are named as in the result
    /// schema.
    pub table: Option<TableRef>,
    pub column: String,
    pub dir: SortDir,
}

impl OrderTerm {
    pub fn qualified(table: TableRef, column: impl Into<String>, dir: SortDir) -> Self {
        Self {
            table: Some(table),
            column: column.into(),
            dir,
        }
    }

    pub fn unqualified(column: impl Into<String>, dir: SortDir) -> Self {
        Self {
            table: None,
            column: column.into(),
            dir,
        }
    }

    pub fn expr(&self) -> SimpleExpr {
        match &self.table {
            Some(table) => table.column(&self.column),
            None => Expr::col(Alias::new(self.column.as_str())).into(),
        }
    }

    pub fn order(&self) -> Order {
        match self.dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        }
    }

    /// `table.column DIR`, for logs and inspection.
    pub fn to_sql_fragment(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{} {}", table, self.column, self.dir.as_sql()),
            None => format!("{} {}", self.column, self.dir.as_sql()),
        }
    }
}

/// Order terms from the request's `order` map, primary sort first.
///
/// Entries whose column index does not address a view column are skipped.
pub fn request_order(columns: &ViewColumns, req: &DatatableRequest) -> Vec<OrderTerm> {
    let Some(order) = req.order.as_ref() else {
        return Vec::new();
    };

    order
        .iter()
        .filter_map(|item| {
            columns
                .get(item.column)
                .map(|col| OrderTerm::qualified(col.table.clone(), col.field(), item.dir))
        })
        .collect()
}

/// Parse a `column[.direction],...` default sort, keeping only columns the
/// result schema actually has.
pub fn additional_order(spec: Option<&str>, column_names: &[String]) -> Vec<OrderTerm> {
    let Some(spec) = spec else {
        return Vec::new();
    };

    spec.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let (column, dir) = match token.split_once('.') {
                Some((column, dir)) => (column.trim(), Some(dir)),
                None => (token, None),
            };
            if column_names.iter().any(|name| name == column) {
                Some(OrderTerm::unqualified(column, SortDir::from_config_token(dir)))
            } else {
                tracing::debug!(token, "default sort column not in result schema, skipped");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{EntityRegistry, TableResolver};
    use serde_json::json;

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn view_columns() -> ViewColumns {
        let resolver = TableResolver::new(EntityRegistry::new().register("User", "users"));
        ViewColumns::resolve(["User.username", "User.email"], &resolver).unwrap()
    }

    #[test]
    fn request_order_resolves_through_view_columns() {
        let req = DatatableRequest::from_params(&json!({
            "order": {
                "0": {"column": "1", "dir": "desc"},
                "1": {"column": "0", "dir": "DESC"},
                "2": {"column": "7", "dir": "asc"}
            }
        }));
        let terms = request_order(&view_columns(), &req);
        let rendered: Vec<_> = terms.iter().map(OrderTerm::to_sql_fragment).collect();
        assert_eq!(rendered, ["users.email DESC", "users.username ASC"]);
    }

    #[test]
    fn absent_order_map_yields_nothing() {
        let req = DatatableRequest::from_params(&json!({"draw": "1"}));
        assert!(request_order(&view_columns(), &req).is_empty());
    }

    #[test]
    fn unknown_default_column_is_dropped_without_touching_neighbours() {
        let terms = additional_order(
            Some("bogus.desc,real_col"),
            &names(&["id", "real_col"]),
        );
        assert_eq!(terms, vec![OrderTerm::unqualified("real_col", SortDir::Asc)]);
    }

    #[test]
    fn default_sort_directions() {
        let schema = names(&["an_int", "column_with_single_value", "id"]);
        let terms = additional_order(
            Some(" column_with_single_value.desc , an_int ,id.ASC,,an_int.sideways"),
            &schema,
        );
        let rendered: Vec<_> = terms.iter().map(OrderTerm::to_sql_fragment).collect();
        assert_eq!(
            rendered,
            [
                "column_with_single_value DESC",
                "an_int ASC",
                "id ASC",
                "an_int ASC"
            ]
        );
    }

    #[test]
    fn no_default_sort_configured() {
        assert!(additional_order(None, &names(&["id"])).is_empty());
    }
}
