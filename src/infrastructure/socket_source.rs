// TCP socket source and acceptor
use crate::application::line_source::{text_line, ConnectionAcceptor, LineSource};
use crate::domain::error::IngestError;
use async_trait::async_trait;
use futures::StreamExt;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_stream::wrappers::TcpListenerStream;

/// Newline-delimited lines from one accepted connection.
///
/// An empty line or the peer closing the connection ends the stream.
pub struct SocketLineSource {
    peer: SocketAddr,
    reader: BufReader<TcpStream>,
    // Bytes of a line whose read was cancelled part way.
    pending: Vec<u8>,
    finished: bool,
}

impl SocketLineSource {
    pub fn new(stream: TcpStream) -> Result<Self, IngestError> {
        let peer = stream
            .peer_addr()
            .map_err(|e| IngestError::StreamInterrupted(e.to_string()))?;
        Ok(Self {
            peer,
            reader: BufReader::new(stream),
            pending: Vec::new(),
            finished: false,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl LineSource for SocketLineSource {
    async fn next_line(&mut self) -> Result<Option<String>, IngestError> {
        if self.finished {
            return Ok(None);
        }

        let read = match self.reader.read_until(b'\n', &mut self.pending).await {
            Ok(read) => read,
            Err(e) => {
                self.finished = true;
                return Err(IngestError::StreamInterrupted(format!("{}: {}", self.peer, e)));
            }
        };
        if read == 0 && self.pending.is_empty() {
            self.finished = true;
            return Ok(None);
        }

        match text_line(std::mem::take(&mut self.pending)) {
            Ok(line) if line.trim().is_empty() => {
                self.finished = true;
                Ok(None)
            }
            Ok(line) => Ok(Some(line)),
            Err(e) => Err(IngestError::MalformedSample(format!("{}: {}", self.peer, e))),
        }
    }

    fn describe(&self) -> String {
        format!("connection from {}", self.peer)
    }
}

/// Listening endpoint handing out one `SocketLineSource` per connection.
///
/// The listening socket is closed when the acceptor is dropped.
pub struct SocketAcceptor {
    local_addr: SocketAddr,
    incoming: TcpListenerStream,
}

impl SocketAcceptor {
    pub async fn bind(addr: &str) -> Result<Self, IngestError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| IngestError::SourceUnavailable(format!("cannot bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| IngestError::SourceUnavailable(format!("cannot bind {}: {}", addr, e)))?;

        Ok(Self {
            local_addr,
            incoming: TcpListenerStream::new(listener),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl ConnectionAcceptor for SocketAcceptor {
    async fn accept(&mut self) -> Option<Result<Box<dyn LineSource>, IngestError>> {
        let accepted = self.incoming.next().await?;
        let source = accepted
            .map_err(|e| IngestError::StreamInterrupted(e.to_string()))
            .and_then(SocketLineSource::new)
            .map(|source| {
                tracing::info!("Accepted connection from {}", source.peer_addr());
                Box::new(source) as Box<dyn LineSource>
            });
        Some(source)
    }

    fn describe(&self) -> String {
        self.local_addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_lines_until_empty_line() {
        let mut acceptor = SocketAcceptor::bind("127.0.0.1:0").await.unwrap();
        let addr = acceptor.local_addr();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"one\ntwo\n\nthree\n").await.unwrap();
            stream
        });

        let mut source = acceptor.accept().await.unwrap().unwrap();
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("one"));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("two"));
        assert_eq!(source.next_line().await.unwrap(), None);
        assert_eq!(source.next_line().await.unwrap(), None);
        drop(client.await.unwrap());
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let mut acceptor = SocketAcceptor::bind("127.0.0.1:0").await.unwrap();
        let addr = acceptor.local_addr();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"only\n").await.unwrap();
        });

        let mut source = acceptor.accept().await.unwrap().unwrap();
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("only"));
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_stream() {
        let mut acceptor = SocketAcceptor::bind("127.0.0.1:0").await.unwrap();
        let addr = acceptor.local_addr();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_all(b"one\n\xff\xfe\ntwo\n").await.unwrap();
        });

        let mut source = acceptor.accept().await.unwrap().unwrap();
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("one"));
        assert!(matches!(
            source.next_line().await,
            Err(IngestError::MalformedSample(_))
        ));
        assert_eq!(source.next_line().await.unwrap().as_deref(), Some("two"));
        assert_eq!(source.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_unavailable() {
        let first = SocketAcceptor::bind("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().to_string();
        let err = SocketAcceptor::bind(&taken).await.err().unwrap();
        assert!(matches!(err, IngestError::SourceUnavailable(_)));
    }
}
