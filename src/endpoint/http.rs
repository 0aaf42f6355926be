use std::{sync::Arc, time::Instant};

use reqwest::{header, Method, StatusCode};

use crate::error::EndpointError;

use super::{
    logger::{LogLogger, RequestInfo, RequestLogger, ResponseInfo},
    Config, RecolorEndpoint, RecolorRequest, RecolorResponse,
};

/// Status, declared MIME type and body of one exchange
type Exchange = (StatusCode, Option<String>, Vec<u8>);

/// Recolor endpoint client over HTTP multipart
#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
    config: Config,
    logger: Arc<dyn RequestLogger>,
}

impl Client {
    /// Client that logs through the `log` facade at debug level
    pub fn new(config: Config) -> Self {
        Self::with_logger(config, Arc::new(LogLogger::default()))
    }

    pub fn with_logger(config: Config, logger: Arc<dyn RequestLogger>) -> Self {
        let client = reqwest::Client::new();
        Self {
            client,
            config,
            logger,
        }
    }

    async fn exchange(
        &self,
        request: &RecolorRequest,
    ) -> Result<Exchange, EndpointError> {
        let mut req = self
            .client
            .request(Method::POST, self.config.endpoint().clone())
            .headers(self.config.create_header()?)
            .multipart(request.form());
        if let Some(timeout) = self.config.timeout() {
            req = req.timeout(timeout);
        }
        let res = req.send().await?;
        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = res.bytes().await?;
        Ok((status, content_type, body.to_vec()))
    }
}

impl RecolorEndpoint for Client {
    async fn recolor(&self, request: &RecolorRequest) -> Result<RecolorResponse, EndpointError> {
        let info = RequestInfo::new(Method::POST, self.config.endpoint(), request);
        self.logger.on_request(&info);

        let started = Instant::now();
        let result = self.exchange(request).await;
        match &result {
            Ok((status, _, body)) => self.logger.on_response(
                &info,
                &ResponseInfo {
                    status: *status,
                    body_len: body.len(),
                    elapsed: started.elapsed(),
                },
            ),
            Err(err) => self.logger.on_error(&info, err),
        }

        let (status, content_type, body) = result?;
        if !status.is_success() {
            return Err(EndpointError::Status(status));
        }
        Ok(RecolorResponse::new(content_type, body))
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };
    use url::Url;

    use crate::{
        color::TargetColor,
        data::{test::sample_png, ImageRef},
        endpoint::{logger::NoopLogger, ConfigBuilder},
    };

    use super::*;

    const HEADER_END: &[u8] = b"\r\n\r\n";

    /// Accept one connection, answer it and hand back the raw request
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = Url::parse(&format!("http://{}/predict", addr)).unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 8192];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                content_type,
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(end) = raw.windows(HEADER_END.len()).position(|w| w == HEADER_END) else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..end]).to_ascii_lowercase();
        let body_len = raw.len() - end - HEADER_END.len();
        match head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
        {
            Some(expected) => body_len >= expected,
            None => raw.ends_with(b"--\r\n"),
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<String>>,
    }

    impl RequestLogger for RecordingLogger {
        fn on_request(&self, request: &RequestInfo) {
            self.events
                .lock()
                .unwrap()
                .push(format!("request {} {}", request.method, request.color));
        }

        fn on_response(&self, _request: &RequestInfo, response: &ResponseInfo) {
            self.events
                .lock()
                .unwrap()
                .push(format!("response {}", response.status.as_u16()));
        }

        fn on_error(&self, _request: &RequestInfo, _error: &EndpointError) {
            self.events.lock().unwrap().push("error".to_string());
        }
    }

    fn client_for(url: Url, logger: Arc<dyn RequestLogger>) -> Client {
        Client::with_logger(ConfigBuilder::new(url).build(), logger)
    }

    #[tokio::test]
    async fn test_recolor_posts_multipart_fields() {
        let png = sample_png(2, 2);
        let (url, server) = serve_once("200 OK", "image/png", png.clone()).await;
        let logger = Arc::new(RecordingLogger::default());
        let client = client_for(url, logger.clone());

        let request = RecolorRequest::new("YWJj".to_string(), TargetColor::new(255, 0, 0));
        let response = client.recolor(&request).await.unwrap();
        assert_eq!(response.content_type(), Some("image/png"));
        assert_eq!(response.body(), png.as_slice());

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /predict HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("user-agent: tile-recolor/1.0"));
        assert!(raw.contains("multipart/form-data; boundary="));
        assert!(raw.contains("name=\"file\"\r\n\r\ndata:image/jpeg;base64,YWJj\r\n"));
        assert!(raw.contains("name=\"r\"\r\n\r\n255\r\n"));
        assert!(raw.contains("name=\"g\"\r\n\r\n0\r\n"));
        assert!(raw.contains("name=\"b\"\r\n\r\n0\r\n"));

        let events = logger.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec!["request POST rgb(255, 0, 0)".to_string(), "response 200".to_string()]
        );
    }

    #[tokio::test]
    async fn test_recolor_keeps_declared_content_type() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="1" height="1"/>"#.to_vec();
        let (url, server) = serve_once("200 OK", "image/svg+xml", svg.clone()).await;
        let client = client_for(url, Arc::new(NoopLogger));

        let request = RecolorRequest::new("YWJj".to_string(), TargetColor::new(0, 128, 0));
        let response = client.recolor(&request).await.unwrap();
        server.await.unwrap();

        assert_eq!(response.content_type(), Some("image/svg+xml"));
        match response.to_image().unwrap() {
            ImageRef::DataUrl(url) => {
                assert_eq!(url.mime(), "image/svg+xml");
                assert_eq!(url.to_bytes().unwrap(), svg);
            }
            other => panic!("expected inline image, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recolor_rejects_non_success_status() {
        let (url, server) =
            serve_once("500 Internal Server Error", "text/plain", b"boom".to_vec()).await;
        let logger = Arc::new(RecordingLogger::default());
        let client = client_for(url, logger.clone());

        let request = RecolorRequest::new("YWJj".to_string(), TargetColor::new(0, 0, 255));
        let err = client.recolor(&request).await.unwrap_err();
        assert!(matches!(
            err,
            EndpointError::Status(StatusCode::INTERNAL_SERVER_ERROR)
        ));
        server.await.unwrap();

        // the status is still reported to the logger
        assert_eq!(logger.events.lock().unwrap().last().unwrap(), "response 500");
    }

    #[tokio::test]
    async fn test_recolor_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{}/predict", addr)).unwrap();
        let logger = Arc::new(RecordingLogger::default());
        let client = client_for(url, logger.clone());

        let request = RecolorRequest::new("YWJj".to_string(), TargetColor::new(0, 255, 0));
        let err = client.recolor(&request).await.unwrap_err();
        assert!(matches!(err, EndpointError::Transport(_)));
        assert_eq!(logger.events.lock().unwrap().last().unwrap(), "error");
    }
}
