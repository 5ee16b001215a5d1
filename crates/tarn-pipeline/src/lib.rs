//! Compiler pass orchestration.
//!
//! A pass is a function from an input value to an optional output value,
//! executed against a shared context. Returning `None` signals pass failure
//! without panicking. Passes of compatible types compose, and any pass can be
//! wrapped to record its wall-clock duration for later tabular reporting.

use std::time::{Duration, Instant};
use tarn_errors::ErrorSet;
use tarn_heap::Heap;

/// The shared read/write state threaded through every pass in a compile
/// session.
pub struct PassContext {
  pub heap: Heap,
  pub error_set: ErrorSet,
  pub timer: PassTimer,
}

impl PassContext {
  pub fn new() -> PassContext {
    PassContext { heap: Heap::new(), error_set: ErrorSet::new(), timer: PassTimer::new() }
  }
}

impl Default for PassContext {
  fn default() -> Self {
    Self::new()
  }
}

pub trait Pass {
  /// The type of values this pass consumes.
  type Input;
  /// The type of values this pass produces.
  type Output;

  /// The display name of this pass, used for pass timing.
  fn name(&self) -> &'static str;

  /// Runs this pass. A failed pass returns `None` instead of panicking.
  fn run(&self, input: Self::Input, cx: &mut PassContext) -> Option<Self::Output>;

  /// A new pass feeding this pass's output into `next`.
  fn then<Next: Pass<Input = Self::Output>>(self, next: Next) -> Composed<Self, Next>
  where
    Self: Sized,
  {
    Composed { first: self, second: next }
  }

  /// A new pass that records this pass's wall-clock duration into the
  /// context's timer.
  fn timed(self) -> Timed<Self>
  where
    Self: Sized,
  {
    Timed { inner: self }
  }
}

/// Two passes run back to back; the second only runs if the first succeeds.
pub struct Composed<A, B> {
  first: A,
  second: B,
}

impl<A: Pass, B: Pass<Input = A::Output>> Pass for Composed<A, B> {
  type Input = A::Input;
  type Output = B::Output;

  fn name(&self) -> &'static str {
    self.second.name()
  }

  fn run(&self, input: Self::Input, cx: &mut PassContext) -> Option<Self::Output> {
    let intermediate = self.first.run(input, cx)?;
    self.second.run(intermediate, cx)
  }
}

pub struct Timed<P> {
  inner: P,
}

impl<P: Pass> Pass for Timed<P> {
  type Input = P::Input;
  type Output = P::Output;

  fn name(&self) -> &'static str {
    self.inner.name()
  }

  fn run(&self, input: Self::Input, cx: &mut PassContext) -> Option<Self::Output> {
    let start = Instant::now();
    let result = self.inner.run(input, cx);
    let elapsed = start.elapsed();
    cx.timer.record(self.inner.name(), elapsed);
    result
  }
}

/// A pass built from a plain function.
pub struct FnPass<I, O, F: Fn(I, &mut PassContext) -> Option<O>> {
  name: &'static str,
  function: F,
  phantom: std::marker::PhantomData<fn(I) -> O>,
}

pub fn pass_of<I, O, F: Fn(I, &mut PassContext) -> Option<O>>(
  name: &'static str,
  function: F,
) -> FnPass<I, O, F> {
  FnPass { name, function, phantom: std::marker::PhantomData }
}

impl<I, O, F: Fn(I, &mut PassContext) -> Option<O>> Pass for FnPass<I, O, F> {
  type Input = I;
  type Output = O;

  fn name(&self) -> &'static str {
    self.name
  }

  fn run(&self, input: I, cx: &mut PassContext) -> Option<O> {
    (self.function)(input, cx)
  }
}

/// Records the order passes were executed in and the time taken by each, and
/// dumps a table of the times for the whole compile session.
pub struct PassTimer {
  passes: Vec<(&'static str, Duration)>,
}

impl PassTimer {
  pub fn new() -> PassTimer {
    PassTimer { passes: Vec::new() }
  }

  pub fn record(&mut self, name: &'static str, elapsed: Duration) {
    self.passes.push((name, elapsed));
  }

  /// Measures the underlying closure and returns whatever it returns.
  pub fn measure<R, F: FnOnce() -> R>(&mut self, name: &'static str, f: F) -> R {
    let start = Instant::now();
    let result = f();
    self.record(name, start.elapsed());
    result
  }

  pub fn recorded_passes(&self) -> &Vec<(&'static str, Duration)> {
    &self.passes
  }

  /// A formatted two-column table of timings.
  pub fn dump(&self) -> String {
    let rows: Vec<(&'static str, String)> =
      self.passes.iter().map(|(name, elapsed)| (*name, format_duration(*elapsed))).collect();
    let name_width = rows.iter().map(|(n, _)| n.len()).chain([4]).max().unwrap();
    let mut table = format!("{:<name_width$} | Time\n", "Pass");
    for (name, time) in rows {
      table.push_str(&format!("{:<name_width$} | {}\n", name, time));
    }
    table
  }
}

impl Default for PassTimer {
  fn default() -> Self {
    Self::new()
  }
}

/// Formats a duration at second, millisecond, microsecond, and nanosecond
/// boundaries.
fn format_duration(elapsed: Duration) -> String {
  let nanos = elapsed.as_nanos();
  if nanos >= 1_000_000_000 {
    format!("{:.1}s", elapsed.as_secs_f64())
  } else if nanos >= 1_000_000 {
    format!("{:.1}ms", nanos as f64 / 1_000_000.0)
  } else if nanos >= 1_000 {
    format!("{:.1}µs", nanos as f64 / 1_000.0)
  } else {
    format!("{}ns", nanos)
  }
}
