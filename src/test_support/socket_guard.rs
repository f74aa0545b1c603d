use std::net::TcpListener;

use wiremock::MockServer;

/// `TRAXIV_REQUIRE_SOCKET_TESTS=1` turns skips into failures.
fn socket_tests_required() -> bool {
    std::env::var("TRAXIV_REQUIRE_SOCKET_TESTS")
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Starts a mock server, or returns `None` in sandboxes without localhost sockets.
pub(crate) async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return Some(MockServer::start().await);
    }

    let message = "[socket-bound-test] cannot bind a localhost socket";
    assert!(!socket_tests_required(), "{message}");
    eprintln!("{message}. Skipping unit test.");
    None
}
