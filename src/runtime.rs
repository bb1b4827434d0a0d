//! Runtime abstraction layer for async operations
//!
//! Backend queries are spawned through [`AsyncSpawner`] so the sync engine
//! does not depend on a particular executor. Tokio is provided behind the
//! `tokio-runtime` feature; hosts with another executor implement the trait.

use crate::prelude::{Arc, Duration, Future, Pin};
use crate::{MapError, Result};

/// A boxed, sendable unit of background work
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task. Cancelling a finished task does nothing.
    fn cancel(&self);
}

/// Convenience wrapper for spawning without boxing at the call site
pub fn spawn_on<F>(spawner: &dyn AsyncSpawner, future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    spawner.spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::runtime::Handle;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner bound to one runtime
        #[derive(Clone)]
        pub struct TokioSpawner {
            handle: Handle,
        }

        impl TokioSpawner {
            pub fn new(handle: Handle) -> Self {
                Self { handle }
            }

            /// Binds to the runtime the caller is running on
            pub fn current() -> Result<Self> {
                Handle::try_current()
                    .map(Self::new)
                    .map_err(|err| MapError::Config(format!("no tokio runtime: {err}")))
            }
        }

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(&self, future: BoxedTask) -> Box<dyn AsyncHandle> {
                let handle = self.handle.spawn(future);
                Box::new(TokioHandle(handle))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }
}

/// The spawner for the ambient runtime
pub fn default_spawner() -> Result<Arc<dyn AsyncSpawner>> {
    #[cfg(feature = "tokio-runtime")]
    {
        let spawner = spawners::tokio_impl::TokioSpawner::current()?;
        Ok(Arc::new(spawner))
    }

    #[cfg(not(feature = "tokio-runtime"))]
    {
        Err(MapError::Config(
            "no async runtime available; enable 'tokio-runtime' or supply a spawner".into(),
        ))
    }
}

/// Runs `future`, failing with [`MapError::Timeout`] once `limit` elapses.
/// Without a limit the future runs to completion.
pub async fn with_timeout<F, T>(limit: Option<Duration>, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        #[cfg(feature = "tokio-runtime")]
        Some(limit) => match ::tokio::time::timeout(limit, future).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("request timed out after {:?}", limit);
                Err(MapError::Timeout(limit))
            }
        },
        #[cfg(not(feature = "tokio-runtime"))]
        Some(limit) => {
            log::debug!("timeout of {:?} ignored without a timer", limit);
            future.await
        }
        None => future.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_tokio_spawner() {
        let spawner = default_spawner().unwrap();
        let handle = spawn_on(spawner.as_ref(), async {
            ::tokio::time::sleep(Duration::from_millis(10)).await;
        });

        // Should not be finished immediately
        assert!(!handle.is_finished());

        // Wait a bit and check again
        ::tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_cancel_stops_the_task() {
        let spawner = default_spawner().unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = spawn_on(spawner.as_ref(), async move {
            ::tokio::time::sleep(Duration::from_millis(20)).await;
            let _ = tx.send(());
        });

        handle.cancel();
        ::tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
        assert!(rx.try_recv().is_err());
    }

    #[cfg(feature = "tokio-runtime")]
    #[::tokio::test]
    async fn test_with_timeout() {
        let slow = with_timeout(Some(Duration::from_millis(5)), async {
            ::tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(1)
        })
        .await;
        assert!(matches!(slow, Err(MapError::Timeout(_))));

        let fast = with_timeout(None, async { Ok(2) }).await.unwrap();
        assert_eq!(fast, 2);
    }

    #[test]
    fn test_default_spawner_outside_runtime() {
        assert!(matches!(default_spawner(), Err(MapError::Config(_))));
    }
}
