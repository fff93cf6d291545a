// core/examples/middleware_stack.rs

use sluice::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

// 1. Define a custom application error type
#[derive(Debug, thiserror::Error)]
enum AppError {
  #[error("Unauthorized request for {0}")]
  Unauthorized(String),

  #[error("Backend unavailable")]
  Unavailable,

  #[error("Pipeline error: {0}")]
  Sluice(#[from] SluiceError), // Lets retry and fault capture report into AppError
}

#[derive(Clone, Debug)]
struct Request {
  path: String,
  user: Option<String>,
}

type Response = Result<String, AppError>;

fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();
  info!("--- Middleware Stack Example ---");

  // The backend fails on its first call to show retry at work.
  let calls = Arc::new(AtomicU32::new(0));
  let backend_calls = Arc::clone(&calls);
  let backend = move |request: Request| -> Response {
    if backend_calls.fetch_add(1, Ordering::SeqCst) == 0 {
      return Err(AppError::Unavailable);
    }
    Ok(format!("200 {}", request.path))
  };

  let handle = sluice::build(backend, |p| {
    // 2. Access log around everything else.
    p.process_result(
      |request: &Request, response: &String| info!(path = %request.path, %response, "served"),
      |request: &Request, err: &AppError| warn!(path = %request.path, error = %err, "failed"),
    );

    // 3. Static routes answer without reaching the backend.
    p.switch(
      |request: &Request| match request.path.as_str() {
        "/health" => Some(0),
        "/version" => Some(1),
        _ => None,
      },
      vec![
        arm(|health: &mut Scope<Request, Response>| health.run(|_| Ok("200 ok".to_string()))),
        arm(|version: &mut Scope<Request, Response>| {
          version.run(|_| Ok(format!("200 {}", env!("CARGO_PKG_VERSION"))))
        }),
      ],
    );

    // 4. Everything else needs a user.
    p.when(
      |request: &Request| request.user.is_none(),
      |anonymous| anonymous.run(|request: Request| Err(AppError::Unauthorized(request.path))),
    );

    // 5. Retry transient backend failures.
    p.retry(3, |err: &AppError| matches!(err, AppError::Unavailable));
  });

  for (path, user) in [("/health", None), ("/orders", None), ("/orders", Some("ada"))] {
    let request = Request {
      path: path.to_string(),
      user: user.map(str::to_string),
    };
    match handle(request) {
      Ok(response) => info!("response: {}", response),
      Err(err) => info!("error: {}", err),
    }
  }
  info!("backend called {} times", calls.load(Ordering::SeqCst));
}
