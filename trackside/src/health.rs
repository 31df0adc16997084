use log::*;
use serde::Deserialize;
use std::{sync::mpsc::Sender, thread, time::Duration};

use crate::config::RemoteSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl core::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::Unknown => write!(f, "?"),
            Self::Online => write!(f, "Online"),
            Self::Offline => write!(f, "Offline"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    #[allow(dead_code)]
    timestamp: Option<String>,
}

fn interpret(response: HealthResponse) -> HealthStatus {
    match response.status.as_str() {
        "ok" | "healthy" | "up" => HealthStatus::Online,
        other => {
            debug!("Health endpoint reported status {other:?}");
            HealthStatus::Offline
        }
    }
}

fn check(client: &reqwest::blocking::Client, base_url: &str) -> HealthStatus {
    let url = format!("{}/api/health", base_url.trim_end_matches('/'));
    let result = client
        .get(&url)
        .send()
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.json::<HealthResponse>());
    match result {
        Ok(response) => interpret(response),
        Err(e) => {
            debug!("Health check against {url} failed: {e}");
            HealthStatus::Offline
        }
    }
}

/// Polls the health endpoint on its own thread, posting each result to the
/// app's event loop. Exits when the receiving side hangs up.
pub fn spawn_poller(settings: RemoteSettings, tx: Sender<HealthStatus>) {
    thread::spawn(move || {
        let client = match reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                warn!("Could not build the health check client: {e}");
                return;
            }
        };

        let interval = Duration::from_secs(settings.poll_secs.max(1));
        loop {
            let status = check(&client, &settings.base_url);
            if tx.send(status).is_err() {
                break;
            }
            thread::sleep(interval);
        }
    });
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_interpret_known_statuses() {
        let parse = |json: &str| -> HealthResponse { serde_json::from_str(json).unwrap() };

        assert_eq!(
            interpret(parse(r#"{"status": "ok", "timestamp": "2026-08-25T10:00:00Z"}"#)),
            HealthStatus::Online
        );
        assert_eq!(
            interpret(parse(r#"{"status": "healthy"}"#)),
            HealthStatus::Online
        );
        assert_eq!(
            interpret(parse(r#"{"status": "degraded"}"#)),
            HealthStatus::Offline
        );
    }

    #[test]
    fn test_missing_status_fails_to_parse() {
        let result: Result<HealthResponse, _> = serde_json::from_str(r#"{"timestamp": "x"}"#);
        assert!(result.is_err());
    }
}
