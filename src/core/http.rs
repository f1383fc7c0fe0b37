use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("xonotic-gsm/", env!("CARGO_PKG_VERSION"));

/// Shared client. `idle_timeout` bounds connecting and each wait between
/// reads, never the whole transfer: release archives run to gigabytes.
pub fn build_http_client(idle_timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(idle_timeout)
        .read_timeout(idle_timeout)
        .build()
}
