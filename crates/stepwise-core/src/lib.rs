pub mod backend;
pub mod engine;
pub mod registry;
pub mod report;
pub mod unit;
pub mod validation;

pub use backend::{BackendFactory, BackendRegistry, MemoryBackend, StorageBackend};
pub use engine::MigrationEngine;
pub use registry::MigrationRegistry;
pub use report::{DownReport, ListReport, MigrationState, MigrationStatus, UpReport};
pub use unit::{Direction, Migration, MigrationUnit, StepFn};
