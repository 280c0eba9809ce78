use std::time::Duration;

// Label suffixes used to tie objects back to the custom resource that owns them
pub const GROUP_LABEL_SUFFIX: &str = "openstack.org";
pub const OWNER_UID_LABEL_SUFFIX: &str = "uid";
pub const OWNER_NAMESPACE_LABEL_SUFFIX: &str = "namespace";
pub const OWNER_NAME_LABEL_SUFFIX: &str = "name";

// MetalLB annotations
pub const METALLB_ADDRESS_POOL_ANNOTATION: &str = "metallb.universe.tf/address-pool";
pub const METALLB_ALLOW_SHARED_IP_ANNOTATION: &str = "metallb.universe.tf/allow-shared-ip";
pub const METALLB_LOADBALANCER_IPS_ANNOTATION: &str = "metallb.universe.tf/loadBalancerIPs";

// Multus annotations
pub const NETWORK_ATTACHMENT_ANNOTATION: &str = "k8s.v1.cni.cncf.io/networks";
pub const NETWORK_STATUS_ANNOTATION: &str = "k8s.v1.cni.cncf.io/network-status";

// Hash of the job definition a job was created from
pub const JOB_HASH_ANNOTATION: &str = "openstack.org/job-hash";

// Timing
pub const DEFAULT_REQUEUE_DURATION: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(10);

// Kinds
pub const SERVICE_KIND: &str = "Service";
