//! HTTP clients for the read-only upstream lookups
//!
//! Geocoding, water-resource and weather lookups share one construction
//! path: a bounded timeout, an identifying user agent, and transient-failure
//! retries through `reqwest-retry`. The generation endpoint does not use
//! this; it is called exactly once per request.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

/// Build a lookup client with `max_retries` retries on transient failures
pub fn lookup_client(
    user_agent: &str,
    timeout_seconds: u32,
    max_retries: u32,
) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds.into()))
        .user_agent(user_agent)
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}
