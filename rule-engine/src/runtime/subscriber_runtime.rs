//! Runtime helper for hosting the control-plane subscriber loop.

use std::future::Future;
use std::thread;
use tokio::runtime::Builder;

pub(crate) const SUBSCRIBER_RUNTIME_THREAD_NAME: &str = "rule-subscriber";

/// Spawns a dedicated thread with a current-thread runtime driving the
/// subscriber loop to completion.
pub(crate) fn spawn_subscriber_loop<F, Fut>(run_loop: F) -> thread::JoinHandle<()>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    thread::Builder::new()
        .name(SUBSCRIBER_RUNTIME_THREAD_NAME.to_string())
        .spawn(move || {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create subscriber Tokio runtime");

            runtime.block_on(run_loop());
        })
        .expect("Failed to spawn subscriber runtime thread")
}
