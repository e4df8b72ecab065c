/*! Integration tests for Silt.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - engine: Cross-module flows through the Engine (writes, indexes, recovery)
 * - query: End-to-end query scenarios (filters, pagination, projection)
 * - server: The HTTP boundary (routes, auth, error mapping, event stream)
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("silt=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

mod helpers;

mod engine;
mod query;
mod server;
