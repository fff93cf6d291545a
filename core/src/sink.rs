// sluice/src/sink.rs

//! Serialization adapter: encode each input onto a shared byte sink.
//!
//! An `Appender` wraps a caller-supplied destination behind a single-writer
//! gate. Each `append` holds the gate for the whole write, so records from
//! concurrent pipeline invocations never interleave. The gate is a mutex guard
//! and is released when it goes out of scope, on success and on every fault.

use crate::combinators::linear::Linear;
use crate::error::SluiceError;
use crate::pipeline::scope::Stage;
use futures::future::{self, BoxFuture, FutureExt};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{event, instrument, Level};

/// A byte sink shared by many writers, admitting one at a time.
pub struct Appender<W> {
  gate: Mutex<W>,
}

impl<W> Appender<W>
where
  W: AsyncWrite + Unpin + Send,
{
  pub fn new(writer: W) -> Self {
    Self {
      gate: Mutex::new(writer),
    }
  }

  /// Writes `bytes` in full and flushes, holding the gate throughout.
  #[instrument(name = "Appender::append", skip_all, fields(bytes = bytes.len()), err(Display))]
  pub async fn append(&self, bytes: &[u8]) -> Result<(), SluiceError> {
    let mut writer = self.gate.lock().await;
    writer.write_all(bytes).await?;
    writer.flush().await?;
    event!(Level::TRACE, "Record appended.");
    Ok(())
  }

  /// Runs `f` against the destination while holding the gate.
  pub async fn with_writer<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
    let mut writer = self.gate.lock().await;
    f(&mut writer)
  }

  pub fn into_inner(self) -> W {
    self.gate.into_inner()
  }
}

impl Appender<File> {
  /// Opens (or creates) the file at `path` for appending.
  pub async fn file(path: impl AsRef<Path>) -> Result<Self, SluiceError> {
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(Self::new(file))
  }
}

impl<W> fmt::Debug for Appender<W> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Appender")
      .field("writer_type", &std::any::type_name::<W>())
      .finish_non_exhaustive()
  }
}

/// Sink combinators for asynchronous pipelines.
pub trait SinkExt<In: 'static, T: Send + 'static, E: Send + 'static>:
  Stage<In, BoxFuture<'static, Result<T, E>>>
{
  /// Encodes every input as one line of JSON and appends it to `appender`
  /// before forwarding to the continuation. An encoding or write fault
  /// propagates and the continuation is not invoked.
  fn write_json<W>(&mut self, appender: Arc<Appender<W>>)
  where
    Self: Sized,
    In: Serialize + Send,
    E: From<SluiceError>,
    W: AsyncWrite + Unpin + Send + 'static,
  {
    self.process_async(move |input: &In| -> BoxFuture<'static, Result<(), E>> {
      let mut line = match serde_json::to_vec(input) {
        Ok(line) => line,
        Err(source) => {
          let err = SluiceError::Encode {
            type_name: std::any::type_name::<In>(),
            source,
          };
          event!(Level::ERROR, error = %err, "Failed to encode pipeline input.");
          return future::ready(Err(E::from(err))).boxed();
        }
      };
      line.push(b'\n');
      let appender = Arc::clone(&appender);
      async move { appender.append(&line).await.map_err(E::from) }.boxed()
    });
  }
}

impl<In, T, E, S> SinkExt<In, T, E> for S
where
  In: 'static,
  T: Send + 'static,
  E: Send + 'static,
  S: Stage<In, BoxFuture<'static, Result<T, E>>>,
{
}
