use std::fmt;

use crate::{Error, Result};

/// A view column in `Entity.field` form.
///
/// The entity part is a free-form name that still has to be resolved into a
/// table; the field part is used verbatim as the column name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    entity: String,
    field: String,
}

impl ColumnSpec {
    /// Parse `Entity.field`, splitting on the first `.`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (entity, field) = raw
            .split_once('.')
            .ok_or_else(|| Error::InvalidColumnSpec(raw.to_string()))?;
        if entity.is_empty() || field.is_empty() {
            return Err(Error::InvalidColumnSpec(raw.to_string()));
        }
        Ok(Self {
            entity: entity.to_string(),
            field: field.to_string(),
        })
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity, self.field)
    }
}

impl std::str::FromStr for ColumnSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
