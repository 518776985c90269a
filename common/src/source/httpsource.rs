// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::time::Duration;

use crate::sample::Sample;
#[cfg(test)]
use crate::sample::Reading;
use crate::source::{FetchError, SampleSource, DATA_PATH};

/// Polls `GET <base>/data` on the sensor backend.
pub struct HttpSource {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let url = reqwest::Url::parse(base_url)
            .and_then(|base| base.join(DATA_PATH))
            .map_err(|e| FetchError::Transport(format!("invalid URL `{base_url}`: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client, url, timeout })
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    fn map_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl SampleSource for HttpSource {
    async fn fetch(&self) -> Result<Sample, FetchError> {
        log::debug!("-> GET {}", self.url);
        let response = self.client.get(self.url.clone()).send().await.map_err(|e| self.map_error(e))?;

        let status = response.status();
        log::debug!("<- {status}");
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.map_error(e))?;
        Ok(Sample::from_json(&body)?)
    }
}

#[cfg(test)]
async fn serve_once(response: String) -> (String, tokio::sync::oneshot::Receiver<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (request_tx, request_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let mut request: Vec<u8> = Vec::new();
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let _ = request_tx.send(String::from_utf8_lossy(&request).into_owned());
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
    });

    (base, request_rx)
}

#[cfg(test)]
fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn test_fetch_decodes_sample() {
    let (base, request) = serve_once(http_response("200 OK", r#"{"temperature": 21.5, "humidity": 60}"#)).await;
    let source = HttpSource::new(&base, Duration::from_secs(5)).unwrap();

    let sample = source.fetch().await.unwrap();
    assert_eq!(sample.temperature, Some(Reading::Number(21.5)));
    assert_eq!(sample.humidity, Some(Reading::Number(60.0)));

    let request = request.await.unwrap();
    assert!(request.starts_with("GET /data HTTP/1.1"), "{request}");
}

#[tokio::test]
async fn test_fetch_rejects_non_json_body() {
    let (base, _request) = serve_once(http_response("200 OK", "<html>oops</html>")).await;
    let source = HttpSource::new(&base, Duration::from_secs(5)).unwrap();

    assert!(matches!(source.fetch().await, Err(FetchError::Decode(_))));
}

#[tokio::test]
async fn test_fetch_reports_bad_status() {
    let (base, _request) = serve_once(http_response("503 Service Unavailable", "")).await;
    let source = HttpSource::new(&base, Duration::from_secs(5)).unwrap();

    assert!(matches!(source.fetch().await, Err(FetchError::Status(503))));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        // Accept and never answer
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let source = HttpSource::new(&base, Duration::from_millis(200)).unwrap();
    assert!(matches!(source.fetch().await, Err(FetchError::Timeout(_))));
}

#[test]
fn test_data_path_replaces_base_path() {
    let source = HttpSource::new("http://sensors.local:5000/dashboard", Duration::from_secs(1)).unwrap();
    assert_eq!(source.url().as_str(), "http://sensors.local:5000/data");

    assert!(HttpSource::new("not a url", Duration::from_secs(1)).is_err());
}
