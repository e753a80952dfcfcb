use thiserror::Error;

/// How many raw-body bytes to keep when reporting a malformed response.
const BODY_EXCERPT_LEN: usize = 240;

/// Typed failures raised by the GraphQL client.
///
/// None of these are retried inside the client; a half-consumed page must not
/// be refetched blindly, so retry decisions belong to the scheduler at the
/// batch level.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network unreachable, connection reset, timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The source rejected our credential (HTTP 401/403). Retrying cannot
    /// succeed without user intervention.
    #[error("Authorization failed with status {status}")]
    Auth { status: u16 },

    /// Any other non-2xx response.
    #[error("Unexpected HTTP status {status}: {excerpt}")]
    Http { status: u16, excerpt: String },

    /// The body was not JSON, or JSON missing an expected field.
    #[error("Malformed response ({detail}): {excerpt}")]
    MalformedBody { detail: String, excerpt: String },

    /// The response carried a GraphQL `errors` array.
    #[error("GraphQL errors: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },
}

impl FetchError {
    pub fn malformed(detail: impl Into<String>, body: &str) -> Self {
        FetchError::MalformedBody {
            detail: detail.into(),
            excerpt: excerpt(body),
        }
    }

    pub fn http(status: u16, body: &str) -> Self {
        FetchError::Http {
            status,
            excerpt: excerpt(body),
        }
    }

    /// True when the failure is a credential problem rather than a transient
    /// or structural one.
    pub fn is_auth(&self) -> bool {
        match self {
            FetchError::Auth { .. } => true,
            FetchError::GraphQl { messages } => messages
                .iter()
                .any(|m| m.contains("ACCESS_DENIED") || m.contains("Unauthorized")),
            _ => false,
        }
    }
}

/// Truncate a raw body for diagnostics without flooding the log.
pub fn excerpt(body: &str) -> String {
    if body.len() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let mut end = BODY_EXCERPT_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
