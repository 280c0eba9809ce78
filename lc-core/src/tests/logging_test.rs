use super::*;

#[rstest]
fn test_env_filter_default() {
    // RUST_LOG isn't set by the test harness
    if std::env::var(logging::LOG_FILTER_ENV_VAR).is_err() {
        let filter = logging::env_filter("info,lc_core=debug").to_string();
        assert!(filter.contains("lc_core=debug"));
        assert!(filter.contains("info"));
    }
}
