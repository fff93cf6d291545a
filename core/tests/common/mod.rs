// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use sluice::SluiceError;
use std::any::Any;
use std::sync::Arc;
use tracing::Level;

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Sluice error: {0}")]
  Sluice(String), // Store as String for Eq comparison

  #[error("Transient failure: {0}")]
  Transient(String),

  #[error("Permanent failure: {0}")]
  Permanent(String),
}

impl From<SluiceError> for TestError {
  fn from(err: SluiceError) -> Self {
    TestError::Sluice(err.to_string())
  }
}

impl TestError {
  pub fn is_transient(&self) -> bool {
    matches!(self, TestError::Transient(_))
  }
}

/// Output of a synchronous pipeline that can fault.
pub type SyncOut<T> = Result<T, TestError>;

/// Output of an asynchronous pipeline.
pub type AsyncOut<T> = BoxFuture<'static, Result<T, TestError>>;

pub fn ready<T: Send + 'static>(value: T) -> AsyncOut<T> {
  futures::future::ready(Ok(value)).boxed()
}

pub fn failed<T: Send + 'static>(err: TestError) -> AsyncOut<T> {
  futures::future::ready(Err(err)).boxed()
}

// --- Execution journal ---
/// Shared, ordered record of what ran. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct Journal {
  entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record(&self, entry: impl Into<String>) {
    let entry = entry.into();
    tracing::debug!(target: "test_journal", %entry, "recorded");
    self.entries.lock().push(entry);
  }

  pub fn entries(&self) -> Vec<String> {
    self.entries.lock().clone()
  }

  pub fn count(&self, entry: &str) -> usize {
    self.entries.lock().iter().filter(|e| e.as_str() == entry).count()
  }

  pub fn clear(&self) {
    self.entries.lock().clear();
  }
}

// --- Inputs for runtime type dispatch ---
#[derive(Clone, Debug, PartialEq)]
pub struct Circle {
  pub radius: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Square {
  pub side: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
  Circle(Circle),
  Square(Square),
  Point,
}

impl sluice::Narrow<Circle> for Shape {
  fn narrow(self) -> Result<Circle, Self> {
    match self {
      Shape::Circle(circle) => Ok(circle),
      other => Err(other),
    }
  }

  fn widen(value: Circle) -> Self {
    Shape::Circle(value)
  }
}

impl sluice::Narrow<Square> for Shape {
  fn narrow(self) -> Result<Square, Self> {
    match self {
      Shape::Square(square) => Ok(square),
      other => Err(other),
    }
  }

  fn widen(value: Square) -> Self {
    Shape::Square(value)
  }
}

pub fn boxed<T: Any + Send>(value: T) -> Box<dyn Any + Send> {
  Box::new(value)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
