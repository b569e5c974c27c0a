//! Route log events of a test run to the test output.

/// Install the test logger. `RUST_LOG` controls the level; calling this more than once is fine.
pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
