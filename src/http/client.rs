use super::debug::{Direction, HttpDebugConfig, exchange_lines, url_for_log};
use crate::trace::SessionTrace;
use reqwest::Client;
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    debug: HttpDebugConfig,
    sink: DebugSink,
    trace: Option<SessionTrace>,
}

/// Where redacted `[http-debug]` lines go. The TUI owns the terminal, so it logs into the trace.
#[derive(Clone)]
pub enum DebugSink {
    Stderr,
    Trace,
    #[cfg(test)]
    Buffer(Arc<Mutex<Vec<String>>>),
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("debug", &self.debug)
            .field("traced", &self.trace.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponseData {
    pub status: u16,
    pub body: String,
}

impl HttpResponseData {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
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

    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.sink = sink;
        self
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        payload: &T,
    ) -> Result<HttpResponseData, reqwest::Error> {
        let request = self.inner.post(url).query(query).json(payload).build()?;
        let body_json = request
            .body()
            .and_then(|body| body.as_bytes())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();

        if self.debug.enabled {
            let headline = format!(
                "{} {}",
                request.method(),
                url_for_log(request.url(), self.debug.redact_secrets)
            );
            self.emit(exchange_lines(
                self.debug,
                Direction::Outgoing,
                &headline,
                request.headers(),
                &body_json,
            ));
        }
        if let Some(trace) = &self.trace {
            trace.log_http_request(
                request.method().as_str(),
                request.url().as_str(),
                request.headers(),
                &body_json,
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
        self.log_response(status, &headers, &body);

        Ok(HttpResponseData { status, body })
    }

    fn log_response(&self, status: u16, headers: &HeaderMap, body: &str) {
        if self.debug.enabled {
            self.emit(exchange_lines(
                self.debug,
                Direction::Incoming,
                &format!("HTTP {status}"),
                headers,
                body,
            ));
        }
        if let Some(trace) = &self.trace {
            trace.log_http_response(status, headers, body);
        }
    }

    fn emit(&self, lines: Vec<String>) {
        match &self.sink {
            DebugSink::Stderr => {
                let mut stderr = io::stderr().lock();
                for line in lines {
                    let _ = writeln!(stderr, "{line}");
                }
            }
            DebugSink::Trace => {
                if let Some(trace) = &self.trace {
                    for line in lines {
                        trace.log_http_debug(&line);
                    }
                }
            }
            #[cfg(test)]
            DebugSink::Buffer(buffer) => {
                if let Ok(mut buffer) = buffer.lock() {
                    buffer.extend(lines);
                }
            }
        }
    }

    #[cfg(test)]
    pub fn with_buffer_sink(
        inner: Client,
        debug: HttpDebugConfig,
    ) -> (Self, Arc<Mutex<Vec<String>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let client = Self::new(inner, debug).with_debug_sink(DebugSink::Buffer(Arc::clone(&buffer)));
        (client, buffer)
    }
}
