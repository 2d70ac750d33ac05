//! Shared HTTP client construction.

use std::time::Duration;

/// Knobs for the HTTP client used by manifest resolution and downloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// `User-Agent` header value.
    pub user_agent: String,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout. `None` waits indefinitely, which large runtime
    /// archives on slow links need.
    pub request_timeout: Option<Duration>,
    /// Redirects followed before giving up.
    pub max_redirects: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("rvm/", env!("CARGO_PKG_VERSION")).to_owned(),
            connect_timeout: Duration::from_secs(30),
            request_timeout: None,
            max_redirects: 10,
        }
    }
}

/// Build a `reqwest` client from [`HttpOptions`].
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client(options: &HttpOptions) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(options.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(options.max_redirects))
        .connect_timeout(options.connect_timeout);
    if let Some(timeout) = options.request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}
