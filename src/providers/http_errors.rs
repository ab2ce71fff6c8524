use reqwest::StatusCode;
use std::error::Error as StdError;
use std::io::ErrorKind;

use crate::error::ModelError;

fn error_chain_any(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }

        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_any(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_any(err, ErrorKind::TimedOut, "timed out")
}

pub(crate) fn model_api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> ModelError {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return ModelError::Timeout {
            secs: timeout_secs,
            url: api_url.to_string(),
        };
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return ModelError::Connect(format!(
                "Connection refused by model API at '{api_url}'. \
                 Check MODEL_BASE_URL and network connectivity."
            ));
        }

        return ModelError::Connect(format!(
            "Failed to connect to model API at '{api_url}'. \
             Check MODEL_BASE_URL and network connectivity."
        ));
    }

    ModelError::Connect(format!("Failed to call model API at '{api_url}': {err}"))
}

/// Upstream error bodies are cut to this many characters before they reach
/// the page.
const MAX_ERROR_BODY_CHARS: usize = 512;

pub(crate) fn model_api_status_error(status: StatusCode, body: String) -> ModelError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelError::Auth {
            status: status.as_u16(),
        },
        _ => ModelError::Upstream {
            status: status.as_u16(),
            body: truncate_body(body),
        },
    }
}

fn truncate_body(body: String) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}…", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MAX_ERROR_BODY_CHARS, error_chain_has_timeout, model_api_request_error,
        model_api_status_error,
    };
    use crate::error::ModelError;
    use reqwest::{Client, StatusCode};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn free_local_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn maps_connection_refused_errors_to_connect_error() {
        let addr = free_local_addr();
        let api_url = format!("http://{}/chat/completions", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with connection-refused");
        let mapped = model_api_request_error(req_err, &api_url, 1);

        match mapped {
            ModelError::Connect(msg) => {
                assert!(msg.contains("MODEL_BASE_URL"), "unexpected message: {msg}")
            }
            other => panic!("expected connect error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_timeout_errors_to_timeout_variant() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let server = thread::spawn(move || {
            let (_stream, _) = listener.accept().expect("accept should succeed");
            thread::sleep(Duration::from_secs(1));
        });

        let api_url = format!("http://{}/chat/completions", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with timeout");
        let mapped = model_api_request_error(req_err, &api_url, 2);

        assert_eq!(
            mapped,
            ModelError::Timeout {
                secs: 2,
                url: api_url.clone()
            }
        );

        server.join().expect("server thread should join");
    }

    #[test]
    fn detects_timeout_from_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(error_chain_has_timeout(&err));
    }

    #[test]
    fn rejected_key_statuses_map_to_auth() {
        assert_eq!(
            model_api_status_error(StatusCode::UNAUTHORIZED, String::new()),
            ModelError::Auth { status: 401 }
        );
        assert_eq!(
            model_api_status_error(StatusCode::FORBIDDEN, String::new()),
            ModelError::Auth { status: 403 }
        );
    }

    #[test]
    fn other_statuses_keep_body() {
        assert_eq!(
            model_api_status_error(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string()),
            ModelError::Upstream {
                status: 429,
                body: "slow down".to_string()
            }
        );
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let page = format!("<html>{}</html>", "错".repeat(4000));
        let ModelError::Upstream { status, body } =
            model_api_status_error(StatusCode::BAD_GATEWAY, page)
        else {
            panic!("502 should map to an upstream error");
        };
        assert_eq!(status, 502);
        assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS + 1);
        assert!(body.starts_with("<html>"));
        assert!(body.ends_with('…'));
    }
}
