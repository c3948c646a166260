use stepwise_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::backend::{BackendRegistry, StorageBackend};
use crate::registry::MigrationRegistry;
use crate::report::{DownReport, ListReport, MigrationState, MigrationStatus, UpReport};
use crate::unit::{Direction, MigrationUnit};
use crate::validation::resolve_backend;

/// Applies and reverts registered migrations, tracking progress through the
/// active storage backend.
///
/// The cursor is never cached: every operation constructs a fresh backend
/// and reads the cursor again, so changes made by other runs between calls
/// are picked up.
pub struct MigrationEngine {
    storage_key: Option<String>,
    backends: BackendRegistry,
    registry: MigrationRegistry,
}

impl MigrationEngine {
    pub fn new(storage_key: Option<String>) -> Self {
        Self {
            storage_key,
            backends: BackendRegistry::new(),
            registry: MigrationRegistry::new(),
        }
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn set_storage_key(&mut self, key: Option<String>) {
        self.storage_key = key;
    }

    pub fn register_backend<F>(&mut self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn StorageBackend>> + Send + Sync + 'static,
    {
        self.backends.register(key, factory);
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Register a migration. Units run in the order they are registered.
    pub fn use_migration(&mut self, unit: MigrationUnit) -> Result<()> {
        self.registry.register(unit)
    }

    pub fn migrations(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Validate configuration and construct the active backend.
    pub fn check(&self) -> Result<Box<dyn StorageBackend>> {
        resolve_backend(self.storage_key.as_deref(), &self.backends)
    }

    pub async fn save_index(&self, index: u64, label: &str) -> Result<()> {
        let storage = self.check()?;
        storage.save_index(index, label).await
    }

    pub async fn load_index(&self) -> Result<u64> {
        let storage = self.check()?;
        storage.load_index().await
    }

    /// Report every registered unit as done or todo relative to the cursor.
    pub async fn list(&self) -> Result<ListReport> {
        let storage = self.check()?;
        let cursor = storage.load_index().await?;
        info!("latest migration run is @{cursor}");

        let entries = self
            .registry
            .iter()
            .enumerate()
            .map(|(idx, unit)| {
                let position = idx + 1;
                let state = if (position as u64) <= cursor {
                    MigrationState::Done
                } else {
                    MigrationState::Todo
                };
                debug!("{position} {} {}", unit.display_label(), state.as_str());
                MigrationStatus {
                    position,
                    name: unit.name().to_string(),
                    label: unit.display_label().to_string(),
                    state,
                }
            })
            .collect();

        Ok(ListReport { cursor, entries })
    }

    /// Run every pending migration in order.
    ///
    /// The cursor is persisted after each successful unit. The first failing
    /// unit aborts the run and leaves the cursor at the last applied
    /// position, so a later `up` resumes from the failed unit.
    pub async fn up(&self) -> Result<UpReport> {
        let storage = self.check()?;
        let cursor = storage.load_index().await?;
        info!("latest migration run is @{cursor}");

        if cursor > self.registry.len() as u64 {
            warn!(
                "cursor @{cursor} is beyond the {} registered migrations",
                self.registry.len()
            );
        }

        let mut report = UpReport {
            cursor_before: cursor,
            cursor_after: cursor,
            ..Default::default()
        };

        for (idx, unit) in self.registry.iter().enumerate() {
            let position = idx + 1;
            if (position as u64) <= cursor {
                info!("skipping migration @{position} (already done <= {cursor})");
                report.skipped.push(position);
                continue;
            }

            info!("running migration @{position} {}", unit.display_label());
            run_step(unit, Direction::Up).await?;

            storage
                .save_index(position as u64, unit.display_label())
                .await?;
            info!("updating migration index to @{position}");

            report.applied.push(position);
            report.cursor_after = position as u64;
        }

        Ok(report)
    }

    /// Revert the most recently applied migration, if any.
    pub async fn down(&self) -> Result<DownReport> {
        let storage = self.check()?;
        let cursor = storage.load_index().await?;
        info!("latest migration run is @{cursor}");

        if cursor == 0 {
            info!("no down migration to run");
            return Ok(DownReport::Noop);
        }

        let idx = (cursor - 1) as usize;
        let unit = self.registry.get(idx).ok_or_else(|| {
            Error::State(format!(
                "current migration code is missing (cursor @{cursor}, {} registered)",
                self.registry.len()
            ))
        })?;

        info!("reverting migration @{cursor} {}", unit.display_label());
        run_step(unit, Direction::Down).await?;

        // After reverting, the label names the unit that is now the last applied.
        let label = idx
            .checked_sub(1)
            .and_then(|prev| self.registry.get(prev))
            .map(MigrationUnit::display_label)
            .unwrap_or("");

        let next = cursor - 1;
        storage.save_index(next, label).await?;
        info!("updating migration index to @{next}");

        Ok(DownReport::Reverted {
            position: cursor as usize,
            name: unit.name().to_string(),
            cursor: next,
        })
    }
}

async fn run_step(unit: &MigrationUnit, direction: Direction) -> Result<()> {
    let step = unit.step(direction).ok_or_else(|| {
        Error::Registration(format!(
            "{direction} function is required for {}",
            unit.name()
        ))
    })?;

    step().await.map_err(|e| {
        Error::Execution(format!(
            "{direction} failed for {} ({}): {e}",
            unit.name(),
            unit.display_label()
        ))
    })
}
