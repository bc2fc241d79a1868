use reqwest::StatusCode;

use crate::{
    config::ClientSettings,
    error::ClientError,
    session::{GridSnapshot, SessionHandle, SimulationConfiguration},
};

use super::{
    CreatedSession, SimulationService,
    wire::{CreateSessionRequest, CreateSessionResponse, SnapshotResponse},
};

/// [`SimulationService`] over the engine's HTTP API.
#[derive(Clone, Debug)]
pub struct HttpSimulationService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSimulationService {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(settings.request_timeout);
        let client = builder.build().map_err(|e| {
            ClientError::ServiceUnavailable(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SimulationService for HttpSimulationService {
    async fn create_session(
        &self,
        config: &SimulationConfiguration,
    ) -> Result<CreatedSession, ClientError> {
        let url = format!("{}/simulations", self.base_url);
        log::debug!("POST {url}");
        let response = self
            .client
            .post(&url)
            .json(&CreateSessionRequest::from(config))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let detail = response.text().await.unwrap_or_default();
            return Err(ClientError::InvalidConfiguration(format!(
                "service rejected parameters ({status}): {detail}"
            )));
        }
        if !status.is_success() {
            return Err(ClientError::ServiceUnavailable(format!(
                "POST {url} returned {status}"
            )));
        }
        let body: CreateSessionResponse = response.json().await.map_err(transport_error)?;
        Ok(body.into())
    }

    async fn fetch_snapshot(&self, handle: &SessionHandle) -> Result<GridSnapshot, ClientError> {
        let url = handle.resolve(&self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(ClientError::SessionNotFound(handle.clone()));
        }
        if !status.is_success() {
            return Err(ClientError::ServiceUnavailable(format!(
                "GET {url} returned {status}"
            )));
        }
        let body: SnapshotResponse = response.json().await.map_err(transport_error)?;
        Ok(body.into())
    }
}

fn transport_error(e: reqwest::Error) -> ClientError {
    if e.is_decode() {
        ClientError::ServiceUnavailable(format!("malformed response: {e}"))
    } else {
        ClientError::ServiceUnavailable(e.to_string())
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::{
        io::{BufRead, BufReader, Read, Write},
        net::TcpListener,
        thread::{self, JoinHandle},
        time::Duration,
    };

    use super::*;
    use crate::session::CellStatus;

    struct Recorded {
        request_line: String,
        body: String,
    }

    /// Answer exactly one request on a loopback port with a canned response.
    fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (HttpSimulationService, JoinHandle<Recorded>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let settings = ClientSettings::default()
            .with_base_url(format!("http://{}", listener.local_addr().unwrap()))
            .with_request_timeout(Duration::from_secs(5));
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line.trim_end().is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut received = vec![0; content_length];
            reader.read_exact(&mut received).unwrap();
            let _ = write!(
                stream,
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            Recorded {
                request_line: request_line.trim_end().to_string(),
                body: String::from_utf8(received).unwrap(),
            }
        });
        (HttpSimulationService::new(&settings).unwrap(), server)
    }

    const ONE_TREE: &str = r#"{"trees": [{"id": 1, "pos": [1, 1], "status": "burning"}]}"#;

    #[test]
    fn trailing_slash_is_trimmed() {
        let settings = ClientSettings::default()
            .with_base_url("http://127.0.0.1:9000/")
            .with_request_timeout(Duration::from_secs(1));
        let service = HttpSimulationService::new(&settings).unwrap();
        assert_eq!(service.base_url(), "http://127.0.0.1:9000");
        assert_eq!(
            SessionHandle::new("/simulations/2").resolve(service.base_url()),
            "http://127.0.0.1:9000/simulations/2"
        );
    }

    #[tokio::test]
    async fn create_posts_parameters_and_reads_location() {
        let (service, server) = serve_once(
            "201 Created",
            r#"{"Location": "/simulations/7", "trees": [{"id": 1, "pos": [1, 1], "status": "green"}]}"#,
        );
        let created = service
            .create_session(&SimulationConfiguration::square(1))
            .await
            .unwrap();
        assert_eq!(created.handle.as_str(), "/simulations/7");
        assert_eq!(created.snapshot.count(CellStatus::Green), 1);

        let recorded = server.join().unwrap();
        assert_eq!(recorded.request_line, "POST /simulations HTTP/1.1");
        let body: serde_json::Value = serde_json::from_str(&recorded.body).unwrap();
        assert_eq!(body["dim"], serde_json::json!([1, 1]));
        assert_eq!(body["probability"], 50);
    }

    #[tokio::test]
    async fn rejected_parameters_are_invalid_configuration() {
        for status in ["400 Bad Request", "422 Unprocessable Entity"] {
            let (service, server) = serve_once(status, r#"{"detail": "bad dim"}"#);
            let err = service
                .create_session(&SimulationConfiguration::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ClientError::InvalidConfiguration(_)), "{status}: {err:?}");
            server.join().unwrap();
        }
    }

    #[tokio::test]
    async fn create_server_error_is_unavailable() {
        let (service, server) = serve_once("500 Internal Server Error", "{}");
        let err = service
            .create_session(&SimulationConfiguration::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ServiceUnavailable(_)));
        server.join().unwrap();
    }

    #[tokio::test]
    async fn fetch_reads_snapshot() {
        let (service, server) = serve_once("200 OK", ONE_TREE);
        let handle = SessionHandle::new("/simulations/3");
        let snapshot = service.fetch_snapshot(&handle).await.unwrap();
        assert_eq!(snapshot.burning_count(), 1);
        assert_eq!(
            server.join().unwrap().request_line,
            "GET /simulations/3 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        for status in ["404 Not Found", "410 Gone"] {
            let (service, server) = serve_once(status, "{}");
            let handle = SessionHandle::new("/simulations/3");
            let err = service.fetch_snapshot(&handle).await.unwrap_err();
            assert_eq!(err, ClientError::SessionNotFound(handle), "{status}");
            server.join().unwrap();
        }
    }

    #[tokio::test]
    async fn fetch_failures_are_unavailable() {
        for (status, body) in [
            ("503 Service Unavailable", ONE_TREE),
            ("200 OK", r#"{"trees": [{"id": 1, "pos": [1, 1], "status": "smouldering"}]}"#),
            ("200 OK", "not json"),
        ] {
            let (service, server) = serve_once(status, body);
            let err = service
                .fetch_snapshot(&SessionHandle::new("/simulations/3"))
                .await
                .unwrap_err();
            assert!(matches!(err, ClientError::ServiceUnavailable(_)), "{status} {body}: {err:?}");
            server.join().unwrap();
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_reported_as_malformed() {
        let (service, server) = serve_once("200 OK", r#"{"cells": []}"#);
        let err = service
            .fetch_snapshot(&SessionHandle::new("/simulations/3"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("malformed response"), "{err}");
        server.join().unwrap();
    }
}
