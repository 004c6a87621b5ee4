// Source traits for raw line input
use crate::domain::error::IngestError;
use async_trait::async_trait;

/// A lazily read sequence of raw text lines.
///
/// Each session owns its source exclusively; dropping the source releases the
/// underlying file or connection.
#[async_trait]
pub trait LineSource: Send {
    /// Next raw line, or `Ok(None)` once the stream has ended.
    ///
    /// Must be cancel safe: the read loop races it against a stop request.
    async fn next_line(&mut self) -> Result<Option<String>, IngestError>;

    /// Human readable origin, used in log lines.
    fn describe(&self) -> String;
}

/// Hands out one inbound line stream per accepted connection.
#[async_trait]
pub trait ConnectionAcceptor: Send {
    /// Waits for the next connection; `None` once the acceptor can accept no more.
    async fn accept(&mut self) -> Option<Result<Box<dyn LineSource>, IngestError>>;

    fn describe(&self) -> String;
}

/// Text of one raw line with its `\n` or `\r\n` terminator removed.
///
/// Sources read bytes rather than `String`s so that a line which is not valid
/// UTF-8 spoils only itself instead of the rest of the stream.
pub fn text_line(mut raw: Vec<u8>) -> Result<String, std::string::FromUtf8Error> {
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    String::from_utf8(raw)
}
