use stepwise_common::Result;
use tracing::debug;

use crate::unit::MigrationUnit;
use crate::validation::validate_unit;

/// Migrations in execution order. Append-only.
#[derive(Debug, Default, Clone)]
pub struct MigrationRegistry {
    units: Vec<MigrationUnit>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append `unit`. On error the registry is left untouched.
    pub fn register(&mut self, unit: MigrationUnit) -> Result<()> {
        validate_unit(&unit)?;
        debug!(
            "registered migration #{} {} ({})",
            self.units.len() + 1,
            unit.name(),
            unit.display_label()
        );
        self.units.push(unit);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit at a 0-based index.
    pub fn get(&self, index: usize) -> Option<&MigrationUnit> {
        self.units.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MigrationUnit> {
        self.units.iter()
    }
}
