//! Tor SOCKS5h proxy client
//!
//! Creates HTTP clients that route through Tor for .onion access.

use reqwest::{redirect, Client, Proxy};
use std::time::Duration;

use crate::FetchError;

/// Tor proxy configuration
#[derive(Debug, Clone)]
pub struct TorConfig {
    /// SOCKS proxy host (default: 127.0.0.1)
    pub socks_host: String,
    /// SOCKS proxy port (default: 9050)
    pub socks_port: u16,
    /// Time allowed to read the document once the response has started
    pub script_timeout: Duration,
    /// Maximum redirects followed per navigation
    pub max_redirects: usize,
}

impl Default for TorConfig {
    fn default() -> Self {
        Self {
            socks_host: "127.0.0.1".to_string(),
            socks_port: 9050,
            script_timeout: Duration::from_secs(30),
            max_redirects: 5,
        }
    }
}

impl TorConfig {
    /// Proxy URL with remote DNS resolution
    pub fn socks_addr(&self) -> String {
        format!("socks5h://{}:{}", self.socks_host, self.socks_port)
    }
}

/// User agents for rotation
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:128.0) Gecko/20100101 Firefox/128.0",
];

/// Get a random user agent
pub fn random_user_agent() -> &'static str {
    use rand::Rng;
    let idx = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[idx]
}

/// Create a Tor-enabled HTTP client
///
/// No overall timeout is set; callers bound navigation and document
/// reads separately.
pub fn create_tor_client(config: &TorConfig) -> Result<Client, FetchError> {
    let proxy = Proxy::all(config.socks_addr())
        .map_err(|e| FetchError::Client(e.to_string()))?;

    Client::builder()
        .proxy(proxy)
        .user_agent(random_user_agent())
        .redirect(redirect::Policy::limited(config.max_redirects))
        .danger_accept_invalid_certs(true) // Many .onion sites have self-signed certs
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}

/// Check if Tor proxy is reachable
pub async fn check_tor_connection(config: &TorConfig, timeout: Duration) -> Result<bool, FetchError> {
    let client = create_tor_client(config)?;

    // Tor Project's onion service
    let request = client
        .get("http://2gzyxa5ihm7nsggfxnu52rck2vv4rvmdlkiu3ber7fzs2xqxczfebsid.onion/")
        .send();

    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(resp)) => Ok(resp.status().is_success() || resp.status().is_redirection()),
        Ok(Err(_)) | Err(_) => Ok(false),
    }
}
