use stepwise_common::{Error, Result};

use crate::backend::{BackendRegistry, StorageBackend};
use crate::unit::MigrationUnit;

/// Check that a unit is complete enough to register.
pub fn validate_unit(unit: &MigrationUnit) -> Result<()> {
    if unit.name().trim().is_empty() {
        return Err(Error::Registration("migration name is missing".into()));
    }
    if !unit.has_up() {
        return Err(Error::Registration(format!(
            "up function is required for {}",
            unit.name()
        )));
    }
    if !unit.has_down() {
        return Err(Error::Registration(format!(
            "down function is required for {}",
            unit.name()
        )));
    }
    Ok(())
}

/// Resolve the configured storage key to a freshly constructed backend.
pub fn resolve_backend(
    storage_key: Option<&str>,
    backends: &BackendRegistry,
) -> Result<Box<dyn StorageBackend>> {
    let key = match storage_key {
        Some(key) if !key.trim().is_empty() => key,
        _ => return Err(Error::Config("please define a storage".into())),
    };

    let factory = backends.get(key).ok_or_else(|| {
        let known: Vec<&str> = backends.keys().collect();
        Error::Config(format!(
            "storage backend '{key}' is not registered (known: {})",
            if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            }
        ))
    })?;

    factory()
}
