use std::time::Duration;

use crate::error::Result;

/// Build the shared reqwest client used by the outbound adapters.
pub fn build_client(user_agent: &str, timeout_seconds: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?;
    Ok(client)
}

/// Join a base URL and a path without doubling or dropping the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
