use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::future::{BoxFuture, FutureExt};
use sluice::prelude::*;
use tokio::runtime::Runtime; // To run async code within Criterion

type BenchOut = BoxFuture<'static, Result<u64, SluiceError>>;

// --- Helpers ---
fn sync_chain(wrappers: usize) -> PipelineBuilder<u64, u64> {
  let mut builder = PipelineBuilder::<u64, u64>::new();
  for _ in 0..wrappers {
    builder.use_with(|input, next| next(input.wrapping_add(1)));
  }
  builder
}

fn async_chain(wrappers: usize, delay_micros: u64) -> PipelineBuilder<u64, BenchOut> {
  let mut builder = PipelineBuilder::<u64, BenchOut>::new();
  for _ in 0..wrappers {
    builder.process_async(move |_input: &u64| -> BoxFuture<'static, Result<(), SluiceError>> {
      async move {
        if delay_micros > 0 {
          tokio::time::sleep(std::time::Duration::from_micros(delay_micros)).await;
        }
        Ok(())
      }
      .boxed()
    });
  }
  builder
}

// --- Benchmark Functions ---

fn bench_bind(c: &mut Criterion) {
  let mut group = c.benchmark_group("Bind");
  for wrappers in [1, 10, 100].iter() {
    let builder = sync_chain(*wrappers);
    group.throughput(Throughput::Elements(*wrappers as u64));
    group.bench_with_input(BenchmarkId::from_parameter(wrappers), wrappers, |b, _| {
      b.iter(|| criterion::black_box(builder.bind(|input| input)));
    });
  }
  group.finish();
}

fn bench_invoke_sync(c: &mut Criterion) {
  let mut group = c.benchmark_group("InvokeSync");
  for wrappers in [1, 10, 100].iter() {
    let pipeline = sync_chain(*wrappers).bind(|input| input);
    group.throughput(Throughput::Elements(*wrappers as u64));
    group.bench_with_input(BenchmarkId::from_parameter(wrappers), wrappers, |b, _| {
      b.iter(|| criterion::black_box(pipeline(criterion::black_box(1))));
    });
  }
  group.finish();
}

fn bench_invoke_async(c: &mut Criterion) {
  let mut group = c.benchmark_group("InvokeAsync");
  let rt = Runtime::new().unwrap();

  for wrappers in [1, 10].iter() {
    for delay_us in [0, 10].iter() {
      let pipeline = async_chain(*wrappers, *delay_us).bind(|input| futures::future::ready(Ok(input)).boxed());
      group.throughput(Throughput::Elements(*wrappers as u64));
      group.bench_with_input(
        BenchmarkId::new(format!("{}wrappers", wrappers), delay_us),
        delay_us,
        |b, _| {
          b.to_async(&rt).iter(|| {
            let p_clone = pipeline.clone();
            async move { p_clone(1).await.unwrap() }
          });
        },
      );
    }
  }
  group.finish();
}

fn bench_switch_dispatch(c: &mut Criterion) {
  let mut group = c.benchmark_group("SwitchDispatch");
  for arms in [2, 8, 32].iter() {
    let arm_count = *arms;
    let pipeline = sluice::build(
      |input: u64| input,
      |p| {
        p.switch(
          move |input: &u64| Some(*input as usize % arm_count),
          (0..arm_count).map(|index| {
            arm(move |branch: &mut Scope<u64, u64>| branch.run(move |input| input + index as u64))
          }),
        );
      },
    );

    group.throughput(Throughput::Elements(1));
    group.bench_with_input(BenchmarkId::from_parameter(arms), arms, |b, _| {
      b.iter(|| criterion::black_box(pipeline(criterion::black_box(7))));
    });
  }
  group.finish();
}

fn bench_retry_overhead(c: &mut Criterion) {
  let mut group = c.benchmark_group("RetryOverhead");
  let plain = sync_chain(1).bind(|input| input);
  let retried = sluice::build(
    |input: u64| -> Result<u64, SluiceError> { Ok(input) },
    |p| {
      p.retry(3, |_fault: &SluiceError| true);
    },
  );

  group.bench_function("plain", |b| {
    b.iter(|| criterion::black_box(plain(criterion::black_box(1))));
  });
  group.bench_function("retry_no_fault", |b| {
    b.iter(|| criterion::black_box(retried(criterion::black_box(1))));
  });
  group.finish();
}

criterion_group!(
  benches,
  bench_bind,
  bench_invoke_sync,
  bench_invoke_async,
  bench_switch_dispatch,
  bench_retry_overhead
);
criterion_main!(benches);
