//! Column descriptor resolution: `Entity.field` → qualified table column.
//!
//! Entity names in view columns are free-form strings, so resolution is an
//! ordered chain of strategies with first-success-wins semantics. The chain
//! never fails: when no strategy recognises the entity, the raw name is used
//! as a table identifier.

use std::collections::HashMap;
use std::fmt;

use convert_case::{Case, Casing};
use datatables_core::ColumnSpec;
use sea_orm::sea_query::{Alias, Expr, SimpleExpr};
use sea_orm::EntityTrait;

/// A resolved, queryable table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `"table"."column"` as a sea-query expression.
    pub fn column(&self, column: &str) -> SimpleExpr {
        Expr::col((Alias::new(self.name.as_str()), Alias::new(column))).into()
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Schema metadata supplied by the table definition: entity type name →
/// table name.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    tables: HashMap<String, String>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, type_name: impl Into<String>, table: impl Into<String>) -> Self {
        self.tables.insert(type_name.into(), table.into());
        self
    }

    /// Register a SeaORM entity under `type_name`, reading its table name.
    pub fn register_entity<E: EntityTrait>(self, type_name: impl Into<String>) -> Self {
        let table = E::default().table_name().to_string();
        self.register(type_name, table)
    }

    pub fn table_for(&self, type_name: &str) -> Option<&str> {
        self.tables.get(type_name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// One step of the resolution chain. Returns `None` for "not found".
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn resolve(&self, entity: &str, registry: &EntityRegistry) -> Option<TableRef>;
}

/// Exact entity type name (`User`).
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactTypeName;

impl ResolveStrategy for ExactTypeName {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn resolve(&self, entity: &str, registry: &EntityRegistry) -> Option<TableRef> {
        registry.table_for(entity).map(TableRef::new)
    }
}

/// Singularized, title-cased entity name (`users` → `User`,
/// `line_items` → `LineItem`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SingularizedTypeName;

impl ResolveStrategy for SingularizedTypeName {
    fn name(&self) -> &'static str {
        "singularized"
    }

    fn resolve(&self, entity: &str, registry: &EntityRegistry) -> Option<TableRef> {
        let candidate = singularize(entity).to_case(Case::Pascal);
        registry.table_for(&candidate).map(TableRef::new)
    }
}

/// The entity string taken literally as a table name. Always succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralTable;

impl ResolveStrategy for LiteralTable {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn resolve(&self, entity: &str, _registry: &EntityRegistry) -> Option<TableRef> {
        Some(TableRef::new(entity))
    }
}

/// Ordered strategy chain plus the registry it consults.
pub struct TableResolver {
    registry: EntityRegistry,
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl TableResolver {
    /// exact → singularized → literal.
    pub fn new(registry: EntityRegistry) -> Self {
        Self::with_strategies(
            registry,
            vec![
                Box::new(ExactTypeName),
                Box::new(SingularizedTypeName),
                Box::new(LiteralTable),
            ],
        )
    }

    pub fn with_strategies(
        registry: EntityRegistry,
        strategies: Vec<Box<dyn ResolveStrategy>>,
    ) -> Self {
        Self {
            registry,
            strategies,
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn resolve(&self, spec: &ColumnSpec) -> TableRef {
        self.resolve_entity(spec.entity())
    }

    pub fn resolve_entity(&self, entity: &str) -> TableRef {
        for strategy in &self.strategies {
            if let Some(table) = strategy.resolve(entity, &self.registry) {
                tracing::trace!(entity, table = %table, strategy = strategy.name(), "entity resolved");
                return table;
            }
        }
        tracing::debug!(entity, "no strategy resolved entity, using it as a table name");
        TableRef::new(entity)
    }
}

impl Default for TableResolver {
    fn default() -> Self {
        Self::new(EntityRegistry::default())
    }
}

impl fmt::Debug for TableResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableResolver")
            .field("registry", &self.registry)
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Naive English singular: `categories` → `category`, `boxes` → `box`,
/// `users` → `user`. Words that do not look plural are returned unchanged.
pub fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.len() > 3 && lower.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && word.len() > 1 {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}
