use super::debug::{HttpDebugConfig, clip, masked_body, masked_header, masked_url};
use crate::trace::SessionTrace;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Thin wrapper over `reqwest::Client` that mirrors every exchange into the
/// session trace and, when verbose, onto stderr with secrets masked.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: HttpDebugConfig,
    sink: DebugSink,
    trace: Option<SessionTrace>,
}

#[derive(Clone)]
enum DebugSink {
    Stderr,
    #[cfg(test)]
    Memory(Arc<Mutex<Vec<String>>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("debug", &self.debug)
            .field("traced", &self.trace.is_some())
            .finish()
    }
}

impl HttpClient {
    pub fn new(inner: Client, debug: HttpDebugConfig) -> Self {
        Self {
            inner,
            debug,
            sink: DebugSink::Stderr,
            trace: None,
        }
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        payload: &T,
    ) -> Result<HttpReply, reqwest::Error> {
        let request = headers
            .iter()
            .fold(self.inner.post(url), |builder, (name, value)| {
                builder.header(*name, *value)
            })
            .json(payload)
            .build()?;
        let body_text = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        self.emit_debug(|debug| request_lines(debug, &request, &body_text));
        if let Some(trace) = &self.trace {
            trace.log_http_request(
                request.method().as_str(),
                request.url().as_str(),
                request.headers(),
                &body_text,
            );
        }

        let response = self.inner.execute(request).await.inspect_err(|err| {
            if let Some(trace) = &self.trace {
                trace.log_http_error(&err.to_string());
            }
        })?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await?;

        self.emit_debug(|debug| response_lines(debug, status, &headers, &body));
        if let Some(trace) = &self.trace {
            trace.log_http_response(status, &headers, &body);
        }

        Ok(HttpReply { status, body })
    }

    fn emit_debug(&self, lines: impl FnOnce(HttpDebugConfig) -> Vec<String>) {
        if !self.debug.enabled {
            return;
        }

        let lines = lines(self.debug);
        match &self.sink {
            DebugSink::Stderr => {
                let mut stderr = io::stderr().lock();
                for line in lines {
                    let _ = writeln!(stderr, "{line}");
                }
            }
            #[cfg(test)]
            DebugSink::Memory(buffer) => {
                if let Ok(mut buffer) = buffer.lock() {
                    buffer.extend(lines);
                }
            }
        }
    }

    #[cfg(test)]
    fn with_memory_sink(inner: Client, debug: HttpDebugConfig) -> (Self, Arc<Mutex<Vec<String>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let client = Self {
            inner,
            debug,
            sink: DebugSink::Memory(Arc::clone(&buffer)),
            trace: None,
        };
        (client, buffer)
    }
}

fn request_lines(debug: HttpDebugConfig, request: &reqwest::Request, body: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "[http-debug] > {} {}",
        request.method(),
        masked_url(request.url())
    )];
    lines.extend(header_lines('>', request.headers()));
    lines.push("[http-debug] >".to_string());
    lines.extend(body_lines('>', &clip(&masked_body(body), debug.max_body_chars)));
    lines
}

fn response_lines(
    debug: HttpDebugConfig,
    status: u16,
    headers: &HeaderMap,
    body: &str,
) -> Vec<String> {
    let mut lines = vec![format!("[http-debug] < HTTP {status}")];
    lines.extend(header_lines('<', headers));
    lines.push("[http-debug] <".to_string());
    lines.extend(body_lines('<', &clip(&masked_body(body), debug.max_body_chars)));
    lines
}

fn header_lines(direction: char, headers: &HeaderMap) -> impl Iterator<Item = String> + '_ {
    headers.iter().map(move |(name, value)| {
        format!(
            "[http-debug] {direction} {}: {}",
            name.as_str(),
            masked_header(name.as_str(), value)
        )
    })
}

fn body_lines(direction: char, body: &str) -> Vec<String> {
    if body.is_empty() {
        return vec![format!("[http-debug] {direction} <empty body>")];
    }
    body.lines()
        .map(|line| format!("[http-debug] {direction} {line}"))
        .collect()
}
