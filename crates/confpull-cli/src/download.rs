use std::error::Error as _;
use std::io::Read;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct HttpOptions {
    /// `None` keeps the request unbounded.
    pub(crate) timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransportFailure {
    pub(crate) code: String,
    pub(crate) message: String,
}

impl TransportFailure {
    fn from_reqwest(err: &reqwest::Error) -> Self {
        let code = if let Some(status) = err.status() {
            format!("http-{}", status.as_u16())
        } else if err.is_timeout() {
            "timeout".to_string()
        } else if err.is_connect() {
            "connect".to_string()
        } else if err.is_redirect() {
            "redirect".to_string()
        } else if err.is_body() || err.is_decode() {
            "body".to_string()
        } else {
            "request".to_string()
        };

        Self {
            code,
            message: error_chain(err),
        }
    }

    fn from_body_read(err: &std::io::Error) -> Self {
        let code = if err.kind() == std::io::ErrorKind::TimedOut {
            "timeout"
        } else {
            "body"
        };
        Self {
            code: code.to_string(),
            message: format!("failed reading response body: {err}"),
        }
    }
}

/// Fetches `url` with a single GET, no retries. Non-2xx answers are transport
/// failures with code `http-<status>` even when they carry a body.
///
/// `on_progress` receives `(downloaded, total)` after every chunk; `total` is the
/// advertised `Content-Length`, if any.
pub(crate) fn download_with_progress<F>(
    url: &str,
    options: &HttpOptions,
    mut on_progress: F,
) -> Result<Vec<u8>, TransportFailure>
where
    F: FnMut(u64, Option<u64>),
{
    let client = reqwest::blocking::Client::builder()
        .timeout(options.timeout)
        .user_agent(concat!("confpull/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| TransportFailure::from_reqwest(&err))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|err| TransportFailure::from_reqwest(&err))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportFailure {
            code: format!("http-{}", status.as_u16()),
            message: format!("server answered {status}"),
        });
    }

    let total = response.content_length();
    let mut body = Vec::new();
    let mut chunk = [0_u8; 8192];
    loop {
        let read = response
            .read(&mut chunk)
            .map_err(|err| TransportFailure::from_body_read(&err))?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);
        on_progress(body.len() as u64, total);
    }
    if body.is_empty() {
        on_progress(0, total);
    }

    tracing::debug!(url, bytes = body.len(), status = status.as_u16(), "download complete");
    Ok(body)
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
