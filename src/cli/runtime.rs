//! Runtime setup for the binary.

use std::future::Future;
use std::time::Duration;

/// How long to wait for blocking tasks once the main future has finished.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Run `future` on a fresh multi-threaded runtime.
///
/// A pending prompt keeps a blocking thread parked on stdin. Dropping the
/// runtime normally waits for that thread, so shutdown only waits
/// [`SHUTDOWN_GRACE`] before abandoning it.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let output = runtime.block_on(future);
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    Ok(output)
}
