//! Test modules for the executor crate.
//!
//! Run with `RUST_LOG=writepath=debug` to see the batch logs of a test.

use tracing_subscriber::EnvFilter;

pub mod determinism;
pub mod execute_many;
pub mod unordered;

/// Route `tracing` output through the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
