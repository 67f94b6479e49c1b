//! TCP connect.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time;
use tracing::debug;

use super::error::{TransportError, TransportResult};
use crate::config::EndpointConfig;

/// Open a TCP connection to `endpoint`, giving up after `timeout`.
///
/// Nagle is disabled: messages are tiny and heartbeat timing matters.
pub async fn open(endpoint: &EndpointConfig, timeout: Duration) -> TransportResult<TcpStream> {
    let addr = endpoint.to_string();
    debug!(%addr, "connecting");

    let stream = match time::timeout(
        timeout,
        TcpStream::connect((endpoint.host(), endpoint.port())),
    )
    .await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(TransportError::Connect { addr, source }),
        Err(_) => return Err(TransportError::ConnectTimeout(addr)),
    };

    stream.set_nodelay(true)?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_open_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let endpoint = EndpointConfig::new("127.0.0.1", port).unwrap();

        let stream = open(&endpoint, Duration::from_secs(5)).await.unwrap();
        assert!(stream.nodelay().unwrap());
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_open_refused() {
        // Bind then drop to find a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let endpoint = EndpointConfig::new("127.0.0.1", port).unwrap();

        let err = open(&endpoint, Duration::from_secs(5)).await.unwrap_err();
        assert!(err.is_connect_error());
    }
}
