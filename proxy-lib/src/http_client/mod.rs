mod error;
mod http_client_main;

pub use error::HttpClientError;
pub use http_client_main::HttpClient;
