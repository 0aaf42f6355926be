use std::time::Duration;

use reqwest::{Method, StatusCode};
use url::Url;

use crate::{color::TargetColor, error::EndpointError};

use super::RecolorRequest;

/// What is known about an outgoing recolor request
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub url: Url,
    pub color: TargetColor,
    /// Length of the `file` field in bytes
    pub file_len: usize,
}

impl RequestInfo {
    pub fn new(method: Method, url: &Url, request: &RecolorRequest) -> Self {
        Self {
            method,
            url: url.clone(),
            color: request.color(),
            file_len: request.file().len(),
        }
    }
}

/// What came back, whatever the status
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub status: StatusCode,
    pub body_len: usize,
    pub elapsed: Duration,
}

/// Request/response hook scoped to a single client
pub trait RequestLogger: Send + Sync {
    fn on_request(&self, request: &RequestInfo);

    fn on_response(&self, request: &RequestInfo, response: &ResponseInfo);

    fn on_error(&self, request: &RequestInfo, error: &EndpointError);
}

/// Writes through the `log` facade
#[derive(Debug, Clone)]
pub struct LogLogger {
    level: log::Level,
}

impl LogLogger {
    pub fn new(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LogLogger {
    fn default() -> Self {
        Self::new(log::Level::Debug)
    }
}

impl RequestLogger for LogLogger {
    fn on_request(&self, request: &RequestInfo) {
        log::log!(
            self.level,
            "starting request: {} {} color={} file={}B",
            request.method,
            request.url,
            request.color,
            request.file_len
        );
    }

    fn on_response(&self, request: &RequestInfo, response: &ResponseInfo) {
        log::log!(
            self.level,
            "response: {} {} -> {} ({}B in {:?})",
            request.method,
            request.url,
            response.status,
            response.body_len,
            response.elapsed
        );
    }

    fn on_error(&self, request: &RequestInfo, error: &EndpointError) {
        log::warn!("response error: {} {}: {}", request.method, request.url, error);
    }
}

/// Logs nothing
#[derive(Debug, Clone, Default)]
pub struct NoopLogger;

impl RequestLogger for NoopLogger {
    fn on_request(&self, _request: &RequestInfo) {}

    fn on_response(&self, _request: &RequestInfo, _response: &ResponseInfo) {}

    fn on_error(&self, _request: &RequestInfo, _error: &EndpointError) {}
}
