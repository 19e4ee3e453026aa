use std::time::Duration;

use cadence_core::JobId;
use cadence_protocol::{FramedConn, JobList, ProtocolError, Request};
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to connect to service: {0}")]
    Connect(std::io::Error),

    #[error("Failed to send message to service: {0}")]
    Send(ProtocolError),

    #[error("Failed to receive task list: {0}")]
    Receive(ProtocolError),
}

/// One request per connection, matching what the daemon expects.
pub struct Client {
    addr: String,
    max_frame_bytes: usize,
    timeout: Duration,
}

impl Client {
    pub fn new(addr: impl Into<String>, max_frame_bytes: usize, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            max_frame_bytes,
            timeout,
        }
    }

    async fn connect(&self) -> Result<FramedConn<TcpStream>, ClientError> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| {
                ClientError::Connect(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("timed out connecting to {}", self.addr),
                ))
            })?
            .map_err(ClientError::Connect)?;
        debug!(addr = %self.addr, "connected");
        Ok(cadence_protocol::framed(stream, self.max_frame_bytes))
    }

    /// Deliver a `task` or `stop` request. The daemon never replies to
    /// these, so success only means the bytes were written.
    pub async fn send(&self, request: &Request) -> Result<(), ClientError> {
        let mut conn = self.connect().await?;
        debug!(kind = request.kind(), "sending request");
        cadence_protocol::send(&mut conn, request)
            .await
            .map_err(ClientError::Send)
    }

    /// Ask for active job ids, optionally restricted to one owner.
    pub async fn list(&self, owner: Option<String>) -> Result<Vec<JobId>, ClientError> {
        let mut conn = self.connect().await?;
        cadence_protocol::send(&mut conn, &Request::list(owner))
            .await
            .map_err(ClientError::Send)?;
        let reply = tokio::time::timeout(self.timeout, cadence_protocol::recv::<_, JobList>(&mut conn))
            .await
            .map_err(|_| {
                ClientError::Receive(ProtocolError::Timeout {
                    ms: self.timeout.as_millis() as u64,
                })
            })?
            .map_err(ClientError::Receive)?;
        Ok(reply.into_ids())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn client(addr: String) -> Client {
        Client::new(addr, 1 << 20, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn send_delivers_one_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = cadence_protocol::framed(stream, 1 << 20);
            cadence_protocol::recv::<_, Request>(&mut conn).await.unwrap()
        });

        client(addr).send(&Request::stop("42")).await.unwrap();
        assert_eq!(server.await.unwrap(), Request::stop("42"));
    }

    #[tokio::test]
    async fn list_reads_the_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = cadence_protocol::framed(stream, 1 << 20);
            let req: Request = cadence_protocol::recv(&mut conn).await.unwrap();
            assert_eq!(req.owner(), Some("alice"));
            let ids = JobList(vec![JobId::from("1"), JobId::from("2")]);
            cadence_protocol::send(&mut conn, &ids).await.unwrap();
        });

        let ids = client(addr).list(Some("alice".into())).await.unwrap();
        assert_eq!(ids, vec![JobId::from("1"), JobId::from("2")]);
    }

    #[tokio::test]
    async fn unreachable_daemon_is_a_connect_error() {
        // Bind then drop to get a port with nothing behind it.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = client(addr).list(None).await.unwrap_err();
        assert!(matches!(err, ClientError::Connect(_)));
        assert!(err.to_string().starts_with("Failed to connect to service:"));
    }

    #[tokio::test]
    async fn list_without_reply_is_a_receive_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let err = client(addr).list(None).await.unwrap_err();
        assert!(matches!(err, ClientError::Receive(_)));
    }
}
