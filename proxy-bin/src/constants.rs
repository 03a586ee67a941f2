pub const QUERY_LOG_EVENT_NAME: &str = "query_log";

/// Tracing targets of this binary and the proxy library
pub const OWN_LOG_TARGETS: &[&str] = &[env!("CARGO_CRATE_NAME"), "doh_udp_proxy_lib"];
