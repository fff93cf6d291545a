// core/examples/fan_out.rs

use futures::future::{select_ok, BoxFuture, FutureExt};
use serde::Serialize;
use sluice::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, thiserror::Error)]
enum LookupError {
  #[error("Replica {0} has no entry")]
  Missing(&'static str),

  #[error("No replicas configured")]
  NoReplicas,

  #[error("Pipeline error: {0}")]
  Sluice(#[from] SluiceError),
}

#[derive(Clone, Debug, Serialize)]
struct Query {
  key: String,
}

type Lookup = BoxFuture<'static, Result<String, LookupError>>;

/// A replica that answers after `latency`, or not at all for odd-length keys
/// when `partial` is set.
fn replica(
  name: &'static str,
  latency: Duration,
  partial: bool,
) -> impl Fn(Query, &Continuation<Query, Lookup>) -> Lookup + Send + Sync + 'static {
  move |query: Query, _next: &Continuation<Query, Lookup>| -> Lookup {
    async move {
      tokio::time::sleep(latency).await;
      if partial && query.key.len() % 2 == 1 {
        return Err(LookupError::Missing(name));
      }
      Ok(format!("{}={} (from {})", query.key, query.key.len(), name))
    }
    .boxed()
  }
}

#[tokio::main]
async fn main() -> Result<(), LookupError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Fan-Out Example ---");

  let audit = Arc::new(Appender::new(Vec::<u8>::new()));

  let lookup = sluice::build(
    |query: Query| -> Lookup { futures::future::ready(Ok(format!("{}=miss", query.key))).boxed() },
    |p| {
      // Every query is audited before it is fanned out.
      p.write_json(Arc::clone(&audit));

      // Hedge across replicas: the first successful answer wins.
      p.in_parallel(
        |query: Query, forks: Forks<Query, Lookup>| -> Lookup {
          if forks.is_empty() {
            return futures::future::ready(Err(LookupError::NoReplicas)).boxed();
          }
          select_ok(forks.invoke_all(query))
            .map(|outcome| outcome.map(|(answer, _still_running)| answer))
            .boxed()
        },
        |replicas| {
          replicas.use_with(replica("near", Duration::from_millis(5), true));
          replicas.use_with(replica("far", Duration::from_millis(40), false));
        },
      );
    },
  );

  for key in ["alpha", "beta"] {
    let answer = lookup(Query { key: key.to_string() }).await?;
    info!("{}", answer);
  }

  let audited = audit.with_writer(|buffer| String::from_utf8_lossy(buffer).into_owned()).await;
  info!("audit log:\n{}", audited);
  Ok(())
}
