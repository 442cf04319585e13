//! Single-writer output of protocol lines.
//!
//! Rounds and background rankings all report events; a dedicated task owns
//! stdout and writes one whole line per event, so lines from concurrent
//! producers never interleave.

use cardsmith_core::protocol::ThreadEvent;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::GenAiError;

/// Cloneable handle for queuing protocol events.
#[derive(Debug, Clone)]
pub struct Emitter {
    tx: mpsc::UnboundedSender<ThreadEvent>,
}

impl Emitter {
    /// Spawn the writer task over `out`.
    ///
    /// The task ends once every `Emitter` clone is dropped and the queue is
    /// drained, or on the first write error.
    pub fn spawn<W>(out: W) -> (Self, JoinHandle<std::io::Result<()>>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(write_lines(out, rx));
        (Self { tx }, handle)
    }

    /// Queue one event for output.
    pub fn emit(&self, event: ThreadEvent) -> Result<(), GenAiError> {
        self.tx.send(event).map_err(|_| GenAiError::OutputClosed)
    }
}

async fn write_lines<W>(mut out: W, mut rx: mpsc::UnboundedReceiver<ThreadEvent>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = rx.recv().await {
        let mut line = event.to_string();
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[tokio::test]
    async fn events_written_one_per_line() {
        let (writer, mut reader) = tokio::io::duplex(64 * 1024);
        let (emitter, handle) = Emitter::spawn(writer);

        let other = emitter.clone();
        emitter
            .emit(ThreadEvent::Svg { id: "a".into(), svg: "<svg/>".into() })
            .unwrap();
        other
            .emit(ThreadEvent::Score { id: "a".into(), score: 1, total: 1 })
            .unwrap();
        emitter.emit(ThreadEvent::End).unwrap();
        drop(emitter);
        drop(other);
        handle.await.unwrap().unwrap();

        let mut output = String::new();
        reader.read_to_string(&mut output).await.unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("svg,a,"));
        assert_eq!(lines[1], "score,a,1,1");
        assert_eq!(lines[2], "end");
    }

    #[tokio::test]
    async fn emit_fails_once_writer_is_gone() {
        let (writer, reader) = tokio::io::duplex(16);
        drop(reader);
        let (emitter, handle) = Emitter::spawn(writer);

        emitter.emit(ThreadEvent::End).unwrap();
        assert!(handle.await.unwrap().is_err());
        assert!(matches!(emitter.emit(ThreadEvent::End), Err(GenAiError::OutputClosed)));
    }
}
