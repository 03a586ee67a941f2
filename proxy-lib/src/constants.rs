////////////////////////////////
// Constant Values for Config //
////////////////////////////////
// Cannot override by config.toml

/// UDP buffer size. Queries are accepted up to the classic 512-byte limit, EDNS0 is not negotiated.
pub const UDP_BUFFER_SIZE: usize = 512;
/// UDP channel capacity for responses waiting to be sent out
pub const UDP_CHANNEL_CAPACITY: usize = 1024;
/// DNS message header length
pub const DNS_HEADER_LEN: usize = 12;

/// Query log channel capacity
pub const QUERY_LOG_CHANNEL_SIZE: usize = 1024;
/// Event name of query log emitted via tracing
pub const QUERY_LOG_EVENT_NAME: &str = "query_log";

////////////////////////////////
// Default Values for Config  //
////////////////////////////////
// Can override by command line options or config.toml

/// Default listen address
pub const LISTEN_ADDRESS: &str = "0.0.0.0";
/// Default listen port
pub const LISTEN_PORT: u16 = 53;

/// Max in-flight UDP queries
pub const MAX_CONNECTIONS: usize = 128;
/// Time out secs for HTTP requests
pub const HTTP_TIMEOUT_SEC: u64 = 10;

/// Default DoH target server
pub const DOH_TARGET_URL: &str = "https://dns.google/dns-query";

///////////////////////////////
// Constant Values for Proxy //
///////////////////////////////

/// HTTP User-Agent
pub const HTTP_USER_AGENT: &str = "doh-udp-proxy";

/// Media type of DoH messages
pub const DOH_CONTENT_TYPE: &str = "application/dns-message";
/// Query parameter carrying base64url encoded DNS message in GET method
pub const DOH_QUERY_PARAM_DNS: &str = "dns";
/// Query parameter carrying the mnemonic of the query type as a hint for the upstream
pub const DOH_QUERY_PARAM_QUERY_TYPE: &str = "queryType";
