//! Runtime Bridge Module
//!
//! Drives a future to completion for a synchronous caller, whether or not a
//! tokio runtime is already running on the current thread.

use std::future::Future;
use std::panic;
use std::thread;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};
use tokio::task;

use crate::error::Result;

// == Block On ==
/// Runs `future` to completion and returns its output.
///
/// - No runtime on this thread: a private current-thread runtime is built.
/// - Inside a multi-thread runtime: the worker is handed over with
///   `block_in_place` and the future is driven on the existing runtime.
/// - Inside a current-thread runtime: that runtime cannot be re-entered, so
///   the future runs on a scoped helper thread with its own runtime.
pub fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    let Ok(handle) = Handle::try_current() else {
        return run_private(future);
    };

    match handle.runtime_flavor() {
        RuntimeFlavor::MultiThread => Ok(task::block_in_place(|| handle.block_on(future))),
        _ => run_on_helper_thread(future),
    }
}

fn run_private<F: Future>(future: F) -> Result<F::Output> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

fn run_on_helper_thread<F>(future: F) -> Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    thread::scope(|scope| {
        let helper = scope.spawn(move || run_private(future));
        match helper.join() {
            Ok(output) => output,
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn slow_double(n: u32) -> u32 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        n * 2
    }

    #[test]
    fn test_block_on_without_runtime() {
        assert_eq!(block_on(slow_double(2)).unwrap(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_on_inside_multi_thread_runtime() {
        assert_eq!(block_on(slow_double(3)).unwrap(), 6);
    }

    #[tokio::test]
    async fn test_block_on_inside_current_thread_runtime() {
        assert_eq!(block_on(slow_double(4)).unwrap(), 8);
    }

    #[test]
    fn test_nested_block_on() {
        let outer = block_on(async { block_on(slow_double(5)).unwrap() + 1 }).unwrap();
        assert_eq!(outer, 11);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_panic_propagates_from_helper_thread() {
        let runtime = Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let _ = block_on(async { panic!("boom") });
        });
    }
}
