// sluice/src/error.rs
use anyhow::Error as AnyhowError;
use std::any::Any;
use thiserror::Error;
use tracing::{event, Level};

#[derive(Debug, Error)]
pub enum SluiceError {
  #[error("Handler panicked: {message}")]
  HandlerPanicked { message: String },

  #[error("Failed to encode value of type '{type_name}'. Source: {source}")]
  Encode {
    type_name: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("Sink write failed. Source: {0}")]
  Sink(#[from] std::io::Error),

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error: {message}")]
  Configuration { message: String },
}

impl SluiceError {
  /// Builds a `HandlerPanicked` fault from a panic payload caught by `catch_unwind`.
  pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
    let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
      (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
      s.clone()
    } else {
      "non-string panic payload".to_string()
    };
    SluiceError::HandlerPanicked { message }
  }
}

impl From<AnyhowError> for SluiceError {
  fn from(err: AnyhowError) -> Self {
    SluiceError::HandlerError { source: err }
  }
}

/// Reports a fatal configuration error and aborts the current invocation.
///
/// Configuration errors are programming errors (a selector pointing past the
/// configured branches, a retry policy with no attempts). They are never
/// surfaced as faults on the pipeline's output.
#[track_caller]
pub(crate) fn fatal(message: String) -> ! {
  let err = SluiceError::Configuration { message };
  event!(Level::ERROR, error = %err, "Fatal pipeline configuration error.");
  panic!("{}", err)
}

pub type SluiceResult<T, E = SluiceError> = std::result::Result<T, E>;
