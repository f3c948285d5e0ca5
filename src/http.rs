use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum FetchError {
    #[error("HTTP status {status}{}", body_suffix(.body))]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response decode failed: {0}")]
    Decode(String),
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({body})")
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Timeouts {
    pub(crate) connect: Duration,
    pub(crate) read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(20),
        }
    }
}

pub(crate) fn get_text(
    url: &str,
    query: &[(String, String)],
    timeouts: Timeouts,
) -> Result<String, FetchError> {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeouts.connect)
        .timeout_read(timeouts.read)
        .timeout_write(timeouts.read)
        .user_agent(concat!("arctrack/", env!("CARGO_PKG_VERSION")))
        .build();

    let mut request = agent.get(url);
    for (key, value) in query {
        request = request.query(key, value);
    }

    match request.call() {
        Ok(response) => response
            .into_string()
            .map_err(|err| FetchError::Decode(err.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let response_body = response.into_string().ok().unwrap_or_default();
            let body = response_body.trim().chars().take(240).collect::<String>();
            Err(FetchError::Status { status, body })
        }
        Err(ureq::Error::Transport(err)) => Err(FetchError::Transport(err.to_string())),
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::{Behavior, TestServer};
    use super::*;

    fn short_timeouts() -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(200),
            read: Duration::from_millis(200),
        }
    }

    #[test]
    fn returns_body_on_success() {
        let server = TestServer::spawn(vec![Behavior::Respond(200, "ok".to_string())]);
        let query = vec![("page".to_string(), "1".to_string())];

        let result = get_text(&server.base_url, &query, short_timeouts());

        assert_eq!(result.expect("request should succeed"), "ok");
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn does_not_retry_server_errors() {
        let server = TestServer::spawn(vec![
            Behavior::Respond(503, "down".to_string()),
            Behavior::Respond(200, "ok".to_string()),
        ]);

        let err = get_text(&server.base_url, &[], short_timeouts())
            .expect_err("503 should surface immediately");
        assert_eq!(
            err,
            FetchError::Status {
                status: 503,
                body: "down".to_string()
            }
        );
        assert_eq!(err.to_string(), "HTTP status 503 (down)");
        assert_eq!(server.request_count(), 1);
    }

    #[test]
    fn slow_response_is_a_transport_error() {
        let server = TestServer::spawn(vec![Behavior::DelayRespond(
            Duration::from_millis(150),
            200,
            "slow".to_string(),
        )]);
        let timeouts = Timeouts {
            connect: Duration::from_millis(250),
            read: Duration::from_millis(20),
        };

        let err = get_text(&server.base_url, &[], timeouts).expect_err("read should time out");
        assert!(
            matches!(err, FetchError::Transport(_)),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn status_without_body_has_short_message() {
        let err = FetchError::Status {
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "HTTP status 404");
    }
}
