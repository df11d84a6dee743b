use crate::config::HttpConfig;
use reqwest::Client;
use std::time::Duration;

pub fn build_http_client(config: &HttpConfig) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(concat!("coresync/", env!("CARGO_PKG_VERSION")))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Client for streamed responses: no overall deadline, only a connect one.
pub fn build_streaming_client(config: &HttpConfig) -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .user_agent(concat!("coresync/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| Client::new())
}
