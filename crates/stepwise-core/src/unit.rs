use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use stepwise_common::Result;

/// Shared async step: the body of an `up` or `down` transition.
pub type StepFn = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Which way a unit is being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// A migration written as a type rather than a pair of closures.
#[async_trait]
pub trait Migration: Send + Sync {
    fn name(&self) -> &str;

    /// Display identifier shown in listings and persisted as the cursor label.
    fn label(&self) -> &str {
        self.name()
    }

    async fn up(&self) -> Result<()>;

    async fn down(&self) -> Result<()>;
}

/// A named, ordered pair of reversible steps.
///
/// `up` and `down` are optional only so that incomplete definitions can be
/// rejected at registration time; a registered unit always carries both.
#[derive(Clone)]
pub struct MigrationUnit {
    name: String,
    label: String,
    up: Option<StepFn>,
    down: Option<StepFn>,
}

impl MigrationUnit {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            up: None,
            down: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn up<F, Fut>(mut self, step: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.up = Some(into_step(step));
        self
    }

    pub fn down<F, Fut>(mut self, step: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.down = Some(into_step(step));
        self
    }

    /// Wrap a `Migration` implementation.
    pub fn from_migration<M>(migration: M) -> Self
    where
        M: Migration + 'static,
    {
        let migration = Arc::new(migration);
        let up_target = Arc::clone(&migration);
        let down_target = Arc::clone(&migration);

        let up: StepFn = Arc::new(move || -> BoxFuture<'static, Result<()>> {
            let m = Arc::clone(&up_target);
            Box::pin(async move { m.up().await })
        });
        let down: StepFn = Arc::new(move || -> BoxFuture<'static, Result<()>> {
            let m = Arc::clone(&down_target);
            Box::pin(async move { m.down().await })
        });

        Self {
            name: migration.name().to_string(),
            label: migration.label().to_string(),
            up: Some(up),
            down: Some(down),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_label(&self) -> &str {
        &self.label
    }

    pub fn has_up(&self) -> bool {
        self.up.is_some()
    }

    pub fn has_down(&self) -> bool {
        self.down.is_some()
    }

    pub(crate) fn step(&self, direction: Direction) -> Option<&StepFn> {
        match direction {
            Direction::Up => self.up.as_ref(),
            Direction::Down => self.down.as_ref(),
        }
    }
}

impl fmt::Debug for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationUnit")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("up", &self.up.is_some())
            .field("down", &self.down.is_some())
            .finish()
    }
}

fn into_step<F, Fut>(step: F) -> StepFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, Result<()>> { Box::pin(step()) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CreateUsers {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Migration for CreateUsers {
        fn name(&self) -> &str {
            "create_users"
        }

        fn label(&self) -> &str {
            "20240101-000000-create_users.yml"
        }

        async fn up(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn down(&self) -> Result<()> {
            self.calls.fetch_add(10, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn label_defaults_to_name() {
        let unit = MigrationUnit::new("add_index");
        assert_eq!(unit.name(), "add_index");
        assert_eq!(unit.display_label(), "add_index");
        assert!(!unit.has_up());
        assert!(!unit.has_down());

        let unit = unit.label("0001-add_index.yml");
        assert_eq!(unit.display_label(), "0001-add_index.yml");
    }

    #[tokio::test]
    async fn builder_steps_are_invocable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let up_calls = Arc::clone(&calls);
        let unit = MigrationUnit::new("seed")
            .up(move || {
                let calls = Arc::clone(&up_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .down(|| async { Ok(()) });

        let up = unit.step(Direction::Up).unwrap();
        up().await.unwrap();
        up().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn from_migration_delegates_to_trait() {
        let calls = Arc::new(AtomicUsize::new(0));
        let unit = MigrationUnit::from_migration(CreateUsers {
            calls: Arc::clone(&calls),
        });

        assert_eq!(unit.name(), "create_users");
        assert_eq!(unit.display_label(), "20240101-000000-create_users.yml");

        (unit.step(Direction::Up).unwrap())().await.unwrap();
        (unit.step(Direction::Down).unwrap())().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn direction_displays_lowercase() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }
}
