mod client_test;
mod endpoint_test;
mod role_test;

use httpmock::prelude::*;
use rstest::*;
use serde_json::json;
use tracing_test::traced_test;

use super::*;

const TEST_TOKEN: &str = "gAAAAABkZ-test-token";
const TEST_REGION: &str = "regionOne";

#[fixture]
fn keystone() -> MockServer {
    MockServer::start()
}

fn client(server: &MockServer) -> OpenStack {
    OpenStack::with_token(&server.url("/v3"), TEST_TOKEN, TEST_REGION).unwrap()
}
