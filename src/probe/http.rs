use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::outcome::Outcome;

/// A single bounded request against a probe URL. Implementations never fail
/// and never retry: every failure mode is folded into the returned `Outcome`.
#[async_trait]
pub trait GeoProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Outcome;
}

pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// `client` comes from the auth session and carries its cookies.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl GeoProbe for HttpProbe {
    async fn probe(&self, url: &str) -> Outcome {
        match self.client.get(url).timeout(self.timeout).send().await {
            Ok(response) => {
                // the body is dropped unread
                let status = response.status().as_u16();
                tracing::debug!("Probe {} -> HTTP {}", url, status);
                Outcome::Status(status)
            }
            Err(e) => {
                let outcome = outcome_from_error(&e);
                tracing::debug!("Probe {} failed ({}): {}", url, outcome, e);
                outcome
            }
        }
    }
}

fn outcome_from_error(error: &reqwest::Error) -> Outcome {
    if error.is_timeout() {
        Outcome::Timeout
    } else if is_tls_failure(error) {
        Outcome::TlsError
    } else {
        Outcome::ConnectionError
    }
}

/// reqwest does not expose TLS failures as a kind. tokio-rustls surfaces
/// every rustls error as an `io::Error` of kind `InvalidData`, which a plain
/// TCP connect never produces; rustls' own messages are the fallback for
/// errors that were re-wrapped as text along the way.
fn is_tls_failure(error: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<io::Error>() {
            if io.kind() == io::ErrorKind::InvalidData {
                return true;
            }
        }
        let message = err.to_string();
        if RUSTLS_MESSAGES.iter().any(|m| message.contains(m)) {
            return true;
        }
        source = err.source();
    }
    false
}

const RUSTLS_MESSAGES: [&str; 3] = [
    "invalid peer certificate",
    "received fatal alert",
    "peer is incompatible",
];

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned response per connection.
    async fn serve_status(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-length: 11\r\nconnection: close\r\n\r\nnot checked",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/manifests/x/eu/widevine/dash.mpd", addr)
    }

    #[tokio::test]
    async fn returns_the_status_of_any_response() {
        let probe = HttpProbe::new(Client::new());

        let forbidden = serve_status("403 Forbidden").await;
        assert_eq!(probe.probe(&forbidden).await, Outcome::Status(403));

        let ok = serve_status("200 OK").await;
        assert_eq!(probe.probe(&ok).await, Outcome::Status(200));

        let server_error = serve_status("500 Internal Server Error").await;
        assert_eq!(probe.probe(&server_error).await, Outcome::Status(500));
    }

    #[tokio::test]
    async fn silent_server_is_a_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let probe = HttpProbe::new(Client::new()).with_timeout(Duration::from_millis(200));

        assert_eq!(probe.probe(&format!("http://{}/", addr)).await, Outcome::Timeout);
    }

    #[tokio::test]
    async fn refused_connection_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpProbe::new(Client::new()).with_timeout(Duration::from_secs(2));

        assert_eq!(
            probe.probe(&format!("http://{}/", addr)).await,
            Outcome::ConnectionError
        );
    }

    #[derive(Debug)]
    struct Wrapped(io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("client error (Connect)")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn rustls_errors_in_the_chain_are_tls_failures() {
        let handshake = Wrapped(io::Error::new(
            io::ErrorKind::InvalidData,
            "invalid peer certificate: UnknownIssuer",
        ));
        assert!(is_tls_failure(&handshake));

        let alert = Wrapped(io::Error::other("received fatal alert: HandshakeFailure"));
        assert!(is_tls_failure(&alert));
    }

    #[test]
    fn connect_errors_mentioning_tls_words_are_not_tls_failures() {
        let refused = Wrapped(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused by ssl-gateway.tls.example",
        ));
        assert!(!is_tls_failure(&refused));

        let reset = Wrapped(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset during handshake",
        ));
        assert!(!is_tls_failure(&reset));
    }
}
