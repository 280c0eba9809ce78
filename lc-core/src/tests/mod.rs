mod database_test;
mod logging_test;
mod networkattachment_test;
mod statefulset_test;
mod util_test;

use httpmock::prelude::*;
use lc_testutils::*;
use rstest::*;
use tracing_test::traced_test;

use super::*;
use crate::prelude::*;

fn test_helper(client: kube::Client) -> Helper {
    Helper::new_dynamic(&test_owner(), client).unwrap()
}

fn ns_path(group_version: &str, resource: &str) -> String {
    if group_version == "v1" {
        format!("/api/v1/namespaces/{TEST_NAMESPACE}/{resource}")
    } else {
        format!("/apis/{group_version}/namespaces/{TEST_NAMESPACE}/{resource}")
    }
}
