pub const TEST_NAMESPACE: &str = "test-namespace";
pub const TEST_OWNER_NAME: &str = "keystone";
pub const TEST_OWNER_UID: &str = "6a6b84ea-7c4c-4b33-a1e2-5f5c0b1f3a77";
pub const TEST_OWNER_API_VERSION: &str = "test.openstack.org/v1beta1";
pub const TEST_OWNER_KIND: &str = "KeystoneAPI";
pub const TEST_STATEFULSET: &str = "keystone-api";
pub const TEST_DEPLOYMENT: &str = "keystone-api";
pub const TEST_JOB: &str = "keystone-db-sync";
pub const TEST_SECRET: &str = "osp-secret";
pub const TEST_SERVICE_LABEL: &str = "service";
