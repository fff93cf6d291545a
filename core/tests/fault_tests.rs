// tests/fault_tests.rs
mod common;

use common::*;
use futures::FutureExt;
use sluice::prelude::*;
use sluice::SluiceResult;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Fails with `fault` until it has been called `failures` times, then succeeds
/// with the attempt number.
fn flaky(failures: u32, fault: TestError) -> (Arc<AtomicU32>, impl Fn(i32) -> SyncOut<u32> + Send + Sync + 'static) {
  let calls = Arc::new(AtomicU32::new(0));
  let counted = Arc::clone(&calls);
  let terminal = move |_input: i32| {
    let attempt = counted.fetch_add(1, Ordering::SeqCst) + 1;
    if attempt <= failures {
      Err(fault.clone())
    } else {
      Ok(attempt)
    }
  };
  (calls, terminal)
}

#[test]
fn test_try_with_captures_downstream_panic() {
  setup_tracing();
  let pipeline = sluice::build(
    |input: i32| -> SyncOut<i32> {
      if input == 0 {
        panic!("boom at {input}");
      }
      Ok(100 / input)
    },
    |p| {
      p.try_with(|next| {
        continuation(move |input: i32| match next(input) {
          Err(TestError::Sluice(message)) if message.contains("panicked") => Ok(-1),
          other => other,
        })
      });
    },
  );

  assert_eq!(pipeline(4), Ok(25));
  assert_eq!(pipeline(0), Ok(-1));
}

#[test]
fn test_try_with_can_reraise_captured_fault() {
  setup_tracing();
  let pipeline = sluice::build(
    |_input: i32| -> SyncOut<i32> { panic!("unrecoverable") },
    |p| {
      p.try_with(|next| next);
    },
  );

  assert_eq!(
    pipeline(1),
    Err(TestError::Sluice("Handler panicked: unrecoverable".to_string()))
  );
}

#[test]
fn test_try_with_passes_ordinary_faults_through() {
  setup_tracing();
  let pipeline = sluice::build(
    |_input: i32| -> SyncOut<i32> { Err(TestError::Permanent("plain".to_string())) },
    |p| {
      p.try_with(|next| {
        continuation(move |input: i32| next(input).or_else(|fault| match fault {
          TestError::Transient(_) => Ok(0),
          other => Err(other),
        }))
      });
    },
  );

  assert_eq!(pipeline(1), Err(TestError::Permanent("plain".to_string())));
}

#[tokio::test]
async fn test_try_with_captures_panic_while_polling() {
  setup_tracing();
  let pipeline = sluice::build(
    |input: i32| -> AsyncOut<i32> {
      async move {
        tokio::task::yield_now().await;
        if input < 0 {
          panic!("negative input {input}");
        }
        Ok(input)
      }
      .boxed()
    },
    |p| {
      p.try_with(|next| next);
    },
  );

  assert_eq!(pipeline(3).await, Ok(3));
  assert_eq!(
    pipeline(-3).await,
    Err(TestError::Sluice("Handler panicked: negative input -3".to_string()))
  );
}

#[tokio::test]
async fn test_try_with_captures_panic_before_future_exists() {
  setup_tracing();
  let pipeline = sluice::build(
    |_input: i32| -> AsyncOut<i32> { panic!("eager") },
    |p| {
      p.try_with(|next| next);
    },
  );

  assert_eq!(pipeline(0).await, Err(TestError::Sluice("Handler panicked: eager".to_string())));
}

#[test]
fn test_retry_succeeds_within_attempts() {
  setup_tracing();
  let (calls, terminal) = flaky(2, TestError::Transient("flaky".to_string()));
  let pipeline = sluice::build(terminal, |p| {
    p.retry(3, TestError::is_transient);
  });

  assert_eq!(pipeline(0), Ok(3));
  assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_retry_gives_up_with_last_fault() {
  setup_tracing();
  let (calls, terminal) = flaky(5, TestError::Transient("still down".to_string()));
  let pipeline = sluice::build(terminal, |p| {
    p.retry(2, TestError::is_transient);
  });

  assert_eq!(pipeline(0), Err(TestError::Transient("still down".to_string())));
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_retry_predicate_declines() {
  setup_tracing();
  let (calls, terminal) = flaky(1, TestError::Permanent("bad request".to_string()));
  let pipeline = sluice::build(terminal, |p| {
    p.retry(5, TestError::is_transient);
  });

  assert_eq!(pipeline(0), Err(TestError::Permanent("bad request".to_string())));
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_retry_reruns_only_downstream_wrappers() {
  setup_tracing();
  let journal = Journal::new();
  let (outer, inner) = (journal.clone(), journal.clone());
  let (calls, terminal) = flaky(1, TestError::Transient("once".to_string()));

  let pipeline = sluice::build(terminal, |p| {
    p.process(move |_| outer.record("outer"));
    p.retry(3, |_fault: &TestError| true);
    p.process(move |_| inner.record("inner"));
  });

  assert_eq!(pipeline(0), Ok(2));
  assert_eq!(calls.load(Ordering::SeqCst), 2);
  assert_eq!(journal.entries(), vec!["outer", "inner", "inner"]);
}

#[test]
fn test_retry_recovers_from_panics() {
  setup_tracing();
  let calls = Arc::new(AtomicU32::new(0));
  let counted = Arc::clone(&calls);
  let pipeline = sluice::build(
    move |input: i32| -> SyncOut<i32> {
      if counted.fetch_add(1, Ordering::SeqCst) == 0 {
        panic!("first call panics");
      }
      Ok(input)
    },
    |p| {
      p.retry(2, |fault: &TestError| matches!(fault, TestError::Sluice(_)));
    },
  );

  assert_eq!(pipeline(7), Ok(7));
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_retry_with_policy_sees_attempt_numbers() {
  setup_tracing();
  let journal = Journal::new();
  let seen = journal.clone();
  let (calls, terminal) = flaky(10, TestError::Transient("down".to_string()));

  let policy = RetryPolicy::new(5).retry_when(move |_fault: &TestError, attempt: u32| {
    seen.record(format!("attempt {attempt} failed"));
    attempt < 3
  });
  assert_eq!(policy.max_attempts(), 5);

  let pipeline = sluice::build(terminal, |p| p.retry_with(policy));

  assert!(pipeline(0).is_err());
  assert_eq!(calls.load(Ordering::SeqCst), 3);
  assert_eq!(
    journal.entries(),
    vec!["attempt 1 failed", "attempt 2 failed", "attempt 3 failed"]
  );
}

#[test]
#[should_panic(expected = "at least one attempt")]
fn test_retry_policy_with_zero_attempts_is_fatal() {
  setup_tracing();
  let _policy = RetryPolicy::<TestError>::new(0);
}

#[tokio::test]
async fn test_retry_over_futures() {
  setup_tracing();
  let calls = Arc::new(AtomicU32::new(0));
  let counted = Arc::clone(&calls);
  let pipeline = sluice::build(
    move |input: String| -> AsyncOut<String> {
      let counted = Arc::clone(&counted);
      async move {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        match counted.fetch_add(1, Ordering::SeqCst) {
          0 | 1 => Err(TestError::Transient("timeout".to_string())),
          _ => Ok(input.to_uppercase()),
        }
      }
      .boxed()
    },
    |p| {
      p.retry(4, TestError::is_transient);
    },
  );

  assert_eq!(pipeline("ok".to_string()).await, Ok("OK".to_string()));
  assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_sluice_error_as_pipeline_fault_type() {
  setup_tracing();
  let pipeline = sluice::build(
    |input: &'static str| -> SluiceResult<i64> {
      let parsed = input
        .parse::<i64>()
        .map_err(|err| anyhow::anyhow!("cannot parse {input:?}: {err}"))?;
      Ok(parsed)
    },
    |p| {
      p.retry(2, |fault: &SluiceError| matches!(fault, SluiceError::HandlerPanicked { .. }));
    },
  );

  assert_eq!(pipeline("42").ok(), Some(42));
  match pipeline("forty-two") {
    Err(SluiceError::HandlerError { source }) => assert!(source.to_string().contains("cannot parse")),
    other => panic!("Expected SluiceError::HandlerError, got {:?}", other),
  }
}
