//! Gemini response builder.

/// Default meta for successful gemtext responses.
pub(crate) const GEMTEXT: &str = "text/gemini";

/// Gemini status codes used by the router.
///
/// The protocol defines more (redirects, client certificates); only the
/// codes this gateway actually emits are listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    /// 10 - query input expected.
    Input,
    /// 20 - success; meta is the body's MIME type.
    Success,
    /// 40 - temporary failure; meta is a short message.
    TemporaryFailure,
    /// 51 - resource not found; meta is a short message.
    NotFound,
    /// 59 - malformed request line.
    BadRequest,
}

impl Status {
    /// Two-digit wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::Input => 10,
            Self::Success => 20,
            Self::TemporaryFailure => 40,
            Self::NotFound => 51,
            Self::BadRequest => 59,
        }
    }
}

/// A Gemini response: status, meta line, optional body.
///
/// Owned exclusively by the router while a request is handled, then
/// serialized with [`to_bytes`](Self::to_bytes) and dropped. The default
/// value is a successful empty gemtext response, so a handler only sets
/// what differs from the defaults.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Response {
    status: Status,
    meta: String,
    body: Option<Vec<u8>>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: Status::Success,
            meta: GEMTEXT.to_owned(),
            body: None,
        }
    }
}

impl Response {
    /// Successful response with an explicit MIME type and raw body.
    pub fn success(meta: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status: Status::Success,
            meta: meta.into(),
            body: Some(body),
        }
    }

    /// Successful gemtext response.
    pub fn gemtext(body: impl Into<String>) -> Self {
        Self::success(GEMTEXT, body.into().into_bytes())
    }

    /// Input-expected response with a prompt.
    pub fn input(prompt: impl Into<String>) -> Self {
        Self {
            status: Status::Input,
            meta: prompt.into(),
            body: None,
        }
    }

    /// Not-found response with a human-readable message.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            meta: message.into(),
            body: None,
        }
    }

    /// Temporary-failure response with a human-readable message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Status::TemporaryFailure,
            meta: message.into(),
            body: None,
        }
    }

    /// Malformed-request response.
    pub fn bad_request() -> Self {
        Self {
            status: Status::BadRequest,
            meta: "Bad request".to_owned(),
            body: None,
        }
    }

    /// Response status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Meta line: MIME type on success, message or prompt otherwise.
    pub fn meta(&self) -> &str {
        &self.meta
    }

    /// Response body, present only on success.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Serialize as `<status> <meta>\r\n<body>`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = format!("{} {}\r\n", self.status.code(), self.meta()).into_bytes();
        if let Some(body) = self.body() {
            bytes.extend_from_slice(body);
        }
        bytes
    }
}
