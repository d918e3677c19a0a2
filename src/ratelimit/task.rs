//! The executable-task capability consumed by the limiter.

use std::future::Future;

use async_trait::async_trait;

/// A unit of work whose execution time is managed by a
/// [`Limiter`](crate::ratelimit::Limiter).
///
/// The limiter holds a task only long enough to admit and dispatch it. When
/// capacity is available, `run` is invoked on its own Tokio task, concurrent
/// with other admitted tasks and with ongoing admission decisions. The
/// limiter discards any outcome: implementations convey results or errors
/// through their own channels.
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Perform the work now.
    async fn run(&self);
}

/// Async closures are tasks, so `Box::new(|| async { .. })` can be enqueued
/// directly.
#[async_trait]
impl<F, Fut> Task for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn run(&self) {
        self().await;
    }
}
