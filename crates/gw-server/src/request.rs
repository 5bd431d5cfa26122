//! Gemini request parsing.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::ServerError;

/// A parsed Gemini request.
///
/// Built once per connection from the single request line and read-only
/// afterwards. The path is percent-decoded; the query is kept raw because
/// the search handler decodes it itself after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Request {
    host: String,
    path: String,
    query: Option<String>,
}

impl Request {
    /// Parse a request line of the form `gemini://host/path?query`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidRequest`] for non-gemini schemes,
    /// missing hosts, and unparseable URLs.
    pub fn parse(line: &str) -> Result<Self, ServerError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let url =
            Url::parse(line).map_err(|e| ServerError::InvalidRequest(format!("{line:?}: {e}")))?;
        if url.scheme() != "gemini" {
            return Err(ServerError::InvalidRequest(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ServerError::InvalidRequest(format!("no host in {line:?}")))?
            .to_owned();
        let path = percent_decode_str(url.path())
            .decode_utf8_lossy()
            .into_owned();
        let query = url.query().map(ToOwned::to_owned);
        Ok(Self { host, path, query })
    }

    /// Requested host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Percent-decoded request path, `"/"` or `""` for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, if any.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}
