//! The query orchestrator.

use datatables_core::{DatatableRequest, Pagination, ResultPage};

use crate::condition::filter_records;
use crate::config::DatatablesConfig;
use crate::plan::{QueryPlan, ViewColumns};
use crate::resolver::{EntityRegistry, TableResolver};
use crate::sort::{additional_order, request_order};
use crate::source::DataSourceAdapter;
use crate::{DatatableError, Result};

/// A table definition bound to its record source.
///
/// Immutable after [`DatatableBuilder::build`]; one value serves any number
/// of concurrent requests.
pub struct Datatable<S> {
    source: S,
    columns: ViewColumns,
    config: DatatablesConfig,
}

impl<S: DataSourceAdapter> Datatable<S> {
    pub fn builder() -> DatatableBuilder<S> {
        DatatableBuilder::default()
    }

    pub fn view_columns(&self) -> &ViewColumns {
        &self.columns
    }

    pub fn config(&self) -> &DatatablesConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Translate a request without touching the database.
    pub fn plan(&self, req: &DatatableRequest) -> QueryPlan {
        let adapter = self.config.db_adapter;

        let filter = filter_records(&self.columns, req, adapter);

        let mut order = request_order(&self.columns, req);
        order.extend(additional_order(
            self.config.default_additional_sort.as_deref(),
            &self.source.column_names(),
        ));

        let pagination = Pagination::from_request(&req.pagination, self.config.default_per_page);

        QueryPlan {
            filter,
            order,
            pagination,
        }
    }

    /// The filtered, sorted and paginated rows.
    pub async fn records(&self, req: &DatatableRequest) -> Result<Vec<S::Row>> {
        let plan = self.plan(req);
        self.source.fetch(&plan).await
    }

    /// Rows plus the counts of the response envelope.
    pub async fn run(&self, req: &DatatableRequest) -> Result<ResultPage<S::Row>> {
        let plan = self.plan(req);

        let records_total = self.source.count(None).await?;
        let records_filtered = match plan.filter.as_ref() {
            Some(filter) => self.source.count(Some(filter)).await?,
            None => records_total,
        };
        let data = self.source.fetch(&plan).await?;

        tracing::debug!(
            draw = req.draw,
            records_total,
            records_filtered,
            offset = plan.pagination.offset,
            limit = ?plan.pagination.limit(),
            order = %plan.order_clause(),
            "datatable request served"
        );

        Ok(ResultPage::new(req.draw, records_total, records_filtered, data))
    }
}

/// Collects the pieces of a [`Datatable`]; [`build`](Self::build) validates
/// them all at once.
pub struct DatatableBuilder<S> {
    source: Option<S>,
    view_columns: Option<Vec<String>>,
    registry: EntityRegistry,
    resolver: Option<TableResolver>,
    config: DatatablesConfig,
}

impl<S> Default for DatatableBuilder<S> {
    fn default() -> Self {
        Self {
            source: None,
            view_columns: None,
            registry: EntityRegistry::default(),
            resolver: None,
            config: DatatablesConfig::default(),
        }
    }
}

impl<S: DataSourceAdapter> DatatableBuilder<S> {
    pub fn source(mut self, source: S) -> Self {
        self.source = Some(source);
        self
    }

    pub fn view_columns<I, T>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.view_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Entity metadata for the default resolver chain. Ignored when an
    /// explicit [`resolver`](Self::resolver) is set.
    pub fn registry(mut self, registry: EntityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn resolver(mut self, resolver: TableResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(mut self, config: DatatablesConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Datatable<S>> {
        let source = self.source.ok_or(DatatableError::MissingRecordSource)?;
        let raw = self
            .view_columns
            .filter(|cols| !cols.is_empty())
            .ok_or(DatatableError::MissingViewColumns)?;

        let resolver = self
            .resolver
            .unwrap_or_else(|| TableResolver::new(self.registry));
        let columns = ViewColumns::resolve(&raw, &resolver)?;

        tracing::debug!(
            columns = columns.len(),
            adapter = %self.config.db_adapter,
            "datatable built"
        );

        Ok(Datatable {
            source,
            columns,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbAdapterKind;
    use async_trait::async_trait;
    use sea_orm::Condition;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records the plans it receives; never touches a database.
    #[derive(Default)]
    struct RecordingSource {
        fetched: Mutex<Vec<QueryPlan>>,
    }

    #[async_trait]
    impl DataSourceAdapter for RecordingSource {
        type Row = u32;

        fn column_names(&self) -> Vec<String> {
            vec!["id".into(), "an_int".into(), "email".into()]
        }

        async fn count(&self, filter: Option<&Condition>) -> Result<u64> {
            Ok(if filter.is_some() { 3 } else { 50 })
        }

        async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<u32>> {
            if let Ok(mut seen) = self.fetched.lock() {
                seen.push(plan.clone());
            }
            Ok(vec![1, 2])
        }
    }

    fn table(config: DatatablesConfig) -> Datatable<RecordingSource> {
        Datatable::builder()
            .source(RecordingSource::default())
            .view_columns(["User.username", "User.email", "User.created_on"])
            .registry(EntityRegistry::new().register("User", "users"))
            .config(config)
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_a_source() {
        let err = Datatable::<RecordingSource>::builder()
            .view_columns(["User.email"])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, DatatableError::MissingRecordSource));
        assert!(err.is_configuration());
    }

    #[test]
    fn build_requires_view_columns() {
        let missing = Datatable::builder()
            .source(RecordingSource::default())
            .build()
            .err()
            .unwrap();
        assert!(matches!(missing, DatatableError::MissingViewColumns));

        let empty = Datatable::builder()
            .source(RecordingSource::default())
            .view_columns(Vec::<String>::new())
            .build()
            .err()
            .unwrap();
        assert!(matches!(empty, DatatableError::MissingViewColumns));
    }

    #[test]
    fn build_rejects_malformed_column() {
        let err = Datatable::builder()
            .source(RecordingSource::default())
            .view_columns(["User.email", "User."])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, DatatableError::InvalidColumnSpec(_)));
    }

    #[test]
    fn plan_combines_every_stage() {
        let dt = table(
            DatatablesConfig::default()
                .with_adapter(DbAdapterKind::Sqlite)
                .with_default_additional_sort("bogus.desc,an_int"),
        );
        let req = DatatableRequest::from_params(&json!({
            "start": "11",
            "length": "10",
            "search": {"value": "doe"},
            "order": {"0": {"column": "1", "dir": "desc"}}
        }));

        let plan = dt.plan(&req);
        assert!(plan.filter.is_some());
        assert_eq!(plan.order_clause(), "users.email DESC, an_int ASC");
        assert_eq!(plan.pagination.offset, 10);
        assert_eq!(plan.pagination.page, 2);
        assert_eq!(plan.pagination.limit(), Some(10));
    }

    #[test]
    fn default_per_page_comes_from_config() {
        let dt = table(DatatablesConfig {
            default_per_page: 25,
            ..DatatablesConfig::default()
        });
        let plan = dt.plan(&DatatableRequest::default());
        assert_eq!(plan.pagination.limit(), Some(25));
        assert!(plan.filter.is_none());
        assert!(plan.order.is_empty());
    }

    #[tokio::test]
    async fn run_fills_the_envelope() {
        let dt = table(DatatablesConfig::default());
        let req = DatatableRequest::from_params(&json!({
            "draw": "7",
            "columns": {"0": {"search": {"value": "john"}}}
        }));

        let page = dt.run(&req).await.unwrap();
        assert_eq!(page.draw, 7);
        assert_eq!(page.records_total, 50);
        assert_eq!(page.records_filtered, 3);
        assert_eq!(page.data, vec![1, 2]);
        assert_eq!(dt.source().fetched.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unfiltered_run_reuses_total() {
        let dt = table(DatatablesConfig::default());
        let page = dt.run(&DatatableRequest::default()).await.unwrap();
        assert_eq!(page.records_filtered, page.records_total);
    }
}
