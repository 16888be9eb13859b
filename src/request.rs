//! Request shapes shared by the signer, client and transport.

/// HTTP method of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET request; parameters travel in the query string
    Get,
    /// POST request; parameters travel in the body
    Post,
    /// PUT request; parameters travel in the body
    Put,
    /// DELETE request; parameters travel in the body
    Delete,
}

impl HttpMethod {
    /// The uppercase method name, as used in signing preimages.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether parameters are routed to the request body for this method.
    pub fn sends_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the signer needs for one request.
///
/// Built per request, consumed once, then discarded. The `query` and `body`
/// fields hold the parameters exactly as they will be transmitted; the
/// signer adds authentication artifacts but never rewrites the payload.
#[derive(Debug, Clone)]
pub struct SigningContext {
    /// HTTP method
    pub method: HttpMethod,
    /// URL path, e.g. `/api/v3/order`
    pub path: String,
    /// Query parameters in insertion order
    pub query: Vec<(String, String)>,
    /// Body to transmit, already encoded
    pub body: Option<String>,
    /// Nonce issued for this request
    pub nonce: u64,
    /// Wall-clock timestamp in milliseconds
    pub timestamp_ms: u64,
}

impl SigningContext {
    /// Render the query parameters as a urlencoded string, optionally
    /// sorted by key (stable, so duplicate keys keep insertion order).
    pub fn query_string(&self, sorted: bool) -> String {
        let mut pairs = self.query.clone();
        if sorted {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
        }
        encode_pairs(&pairs)
    }
}

/// A fully signed request, ready for the transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Complete URL including any query string and signature parameter
    pub url: String,
    /// Headers in insertion order (some venues care about ordering)
    pub headers: Vec<(String, String)>,
    /// Body to transmit verbatim, byte-identical to what was signed
    pub body: Option<String>,
}

impl SignedRequest {
    /// Create a signed request.
    pub fn new(
        method: HttpMethod,
        url: String,
        headers: Vec<(String, String)>,
        body: Option<String>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// Look up a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Percent-encode a string using the RFC 3986 unreserved set.
pub fn percent_encode(input: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push(HEX[(byte >> 4) as usize] as char);
                out.push(HEX[(byte & 15) as usize] as char);
            }
        }
    }
    out
}

/// Render key/value pairs as a urlencoded string in the given order.
pub fn encode_pairs(pairs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in pairs {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(&percent_encode(key));
        out.push('=');
        out.push_str(&percent_encode(value));
    }
    out
}
