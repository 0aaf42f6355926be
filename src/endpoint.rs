pub mod http;
pub mod logger;

use std::{future::Future, time::Duration};

use anyhow::Result;
use reqwest::header::{self, HeaderMap, HeaderValue};
use url::Url;

use crate::{
    color::{Channel, TargetColor},
    data::{DataUrl, ImageRef},
    error::{EndpointError, ResponseError},
    utils,
};

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "https://yourserver.com/predict";

/// MIME type the uploaded image is labelled with, whatever its real format
const UPLOAD_MIME: &str = "image/jpeg";

/// One recolor call: the image as a data url plus the target color
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecolorRequest {
    file: String,
    color: TargetColor,
}

impl RecolorRequest {
    pub fn new(payload_base64: String, color: TargetColor) -> Self {
        Self {
            file: DataUrl::from_base64(UPLOAD_MIME, payload_base64).to_string(),
            color,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn color(&self) -> TargetColor {
        self.color
    }

    /// Multipart fields in wire order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("file", self.file.clone())];
        for channel in [Channel::R, Channel::G, Channel::B] {
            fields.push((channel.field(), self.color.channel(channel).to_string()));
        }
        fields
    }

    pub fn form(&self) -> reqwest::multipart::Form {
        self.fields()
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            })
    }
}

/// Body of a 2xx reply with its declared content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecolorResponse {
    content_type: Option<String>,
    body: Vec<u8>,
}

impl RecolorResponse {
    pub fn new(content_type: Option<String>, body: Vec<u8>) -> Self {
        Self { content_type, body }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn to_image(&self) -> Result<ImageRef, ResponseError> {
        ImageRef::from_response(self.content_type(), &self.body)
    }
}

/// Remote service that recolors an image
pub trait RecolorEndpoint {
    /// Submit the request and return the body of a 2xx reply
    fn recolor(
        &self,
        request: &RecolorRequest,
    ) -> impl Future<Output = Result<RecolorResponse, EndpointError>>;
}

/// endpoint config
#[derive(Debug, Clone)]
pub struct Config {
    endpoint: Url,
    timeout: Option<Duration>,
}

impl Config {
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn create_header(&self) -> Result<HeaderMap, EndpointError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&utils::UserAgent::App.value())?,
        );
        Ok(headers)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    endpoint: Url,
    timeout: Option<Duration>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid url"),
            timeout: None,
        }
    }
}

impl ConfigBuilder {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: None,
        }
    }

    /// Create a new ConfigBuilder from custom url
    pub fn custom(url: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(url)?))
    }

    /// No timeout unless one is set here
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }

    pub fn build(&self) -> Config {
        Config {
            endpoint: self.endpoint.clone(),
            timeout: self.timeout,
        }
    }
}
