//! The seam between the bridge and whatever actually performs requests.

/// What the transport reports when a request ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResult {
    /// A response arrived, whatever its status.
    Response { status: u16, body: Vec<u8> },
    /// The request failed before a response (connect error, timeout, body read).
    Failed(String),
    /// The transport acknowledged a cancellation.
    Cancelled,
}

/// Called once by the transport, from any thread, when a request ends.
pub type CompletionCallback = Box<dyn FnOnce(TransportResult) + Send + 'static>;

/// Performs requests asynchronously on its own threads.
///
/// Implementations must invoke each callback at most once and must never invoke it
/// from inside `start`, `cancel` or `cancel_all`.
pub trait Transport: Send + Sync + 'static {
    /// Opaque per-request cancellation token.
    type Token: Clone + Send + 'static;

    /// Begin `request`. `None` means the transport refused it and will never call
    /// `on_complete`.
    fn start(&self, request: HttpRequest, on_complete: CompletionCallback) -> Option<Self::Token>;

    /// Best-effort cancellation. The callback still fires, usually with
    /// [`TransportResult::Cancelled`].
    fn cancel(&self, token: &Self::Token);

    /// Best-effort cancellation of everything in flight.
    fn cancel_all(&self);
}

/// A request as issued by the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Present for POST.
    pub payload: Option<Vec<u8>>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            payload: None,
        }
    }

    #[must_use]
    pub fn post(url: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            payload: Some(payload),
        }
    }

    /// Append headers from a `Name: value` block (see [`parse_headers`]).
    #[must_use]
    pub fn with_header_block(mut self, raw: &str) -> Self {
        self.headers.extend(parse_headers(raw));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn method(&self) -> &'static str {
        if self.payload.is_some() { "POST" } else { "GET" }
    }
}

/// Parse `Name: value` lines separated by `\r\n`.
///
/// Bare `\n` separators are accepted too. Blank lines and lines without a colon or
/// with an empty name are skipped.
#[must_use]
pub fn parse_headers(raw: &str) -> Vec<(String, String)> {
    raw.split('\n')
        .filter_map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let (name, value) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crlf_headers() {
        let headers = parse_headers("User-Agent: ferry\r\nAccept: */*\r\n");
        assert_eq!(
            headers,
            vec![
                ("User-Agent".to_string(), "ferry".to_string()),
                ("Accept".to_string(), "*/*".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let headers = parse_headers("\r\nno colon here\r\n: empty name\r\nX-Ok:  1 \n");
        assert_eq!(headers, vec![("X-Ok".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_value_may_contain_colon() {
        let headers = parse_headers("Referer: https://example.com:8080/x");
        assert_eq!(headers[0].1, "https://example.com:8080/x");
    }

    #[test]
    fn test_method_follows_payload() {
        assert_eq!(HttpRequest::get("http://a").method(), "GET");
        assert_eq!(HttpRequest::post("http://a", b"q".to_vec()).method(), "POST");
    }

    #[test]
    fn test_empty_header_block() {
        let request = HttpRequest::get("http://a").with_header_block("");
        assert!(request.headers.is_empty());
    }
}
