use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::config::DEFAULT_HTTP_TIMEOUT;

const USER_AGENT: &str = concat!("charsheet_terminal/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Builds the shared client with the configured timeout. Only the first call
/// decides the timeout; later calls return the existing client.
pub fn init_http_client(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| build_client(timeout))
}

/// Falls back to the default timeout when `init_http_client` was never called.
pub fn http_client() -> Result<&'static Client> {
    init_http_client(DEFAULT_HTTP_TIMEOUT)
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        // Requests go straight to the API host, system proxies are ignored.
        .no_proxy()
        .build()
        .context("failed to build http client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_client_is_the_shared_one() {
        let configured = init_http_client(Duration::from_secs(3)).expect("client builds");
        let shared = http_client().expect("client available");
        assert!(std::ptr::eq(configured, shared));
    }
}
