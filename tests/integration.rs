use std::{
  convert::Infallible,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
  time::Duration,
};

use parking_lot::Mutex;
use rxdemand::prelude::*;

/// A value log shared between a sink closure and the test body.
#[derive(Clone)]
struct Log<T>(Arc<Mutex<Vec<T>>>);

impl<T: Clone + Send + 'static> Log<T> {
  fn new() -> Self { Log(Arc::new(Mutex::new(vec![]))) }

  fn push(&self) -> impl FnMut(T) + Send + 'static {
    let log = self.0.clone();
    move |v| log.lock().push(v)
  }

  fn get(&self) -> Vec<T> { self.0.lock().clone() }
}

fn completions<E: Send + 'static>(count: &Arc<AtomicUsize>) -> impl FnOnce(Completion<E>) + Send {
  let count = count.clone();
  move |_| {
    count.fetch_add(1, Ordering::SeqCst);
  }
}

#[rxdemand_macro::test]
fn drop_prefix_filter_challenge() {
  let log = Log::new();
  let _h = from_iter(1..=100).drop_first(50).prefix(20).filter(|v| v % 2 == 0).sink(log.push());
  assert_eq!(log.get(), (52..=70).step_by(2).collect::<Vec<_>>());
}

#[rxdemand_macro::test]
fn prepend_chains_read_outside_in() {
  let log = Log::new();
  let _h = from_iter([3, 4]).prepend_values([1, 2]).prepend_values([-1, 0]).sink(log.push());
  assert_eq!(log.get(), vec![-1, 0, 1, 2, 3, 4]);

  let log = Log::new();
  let _h = from_iter([5, 6, 7])
    .prepend_values(vec![3, 4])
    .prepend_values(1..=2)
    .prepend_values((6..11).step_by(2))
    .sink(log.push());
  assert_eq!(log.get(), vec![6, 8, 10, 1, 2, 3, 4, 5, 6, 7]);
}

#[rxdemand_macro::test]
fn prepend_a_subject_waits_for_its_completion() {
  let log = Log::new();
  let gate = PassthroughSubject::<i32>::new();
  let _h = from_iter([3, 4]).prepend(gate.clone()).sink(log.push());

  gate.send(1);
  gate.send(5);
  assert_eq!(log.get(), vec![1, 5]);
  gate.finish();
  assert_eq!(log.get(), vec![1, 5, 3, 4]);
}

#[rxdemand_macro::test]
fn append_after_a_subject_finishes() {
  let log = Log::new();
  let subject = PassthroughSubject::<i32>::new();
  let _h = subject.clone().append_values([3, 4]).append_values([5]).sink(log.push());

  subject.send(1);
  subject.send(2);
  assert_eq!(log.get(), vec![1, 2]);
  subject.finish();
  assert_eq!(log.get(), vec![1, 2, 3, 4, 5]);

  let log = Log::new();
  let _h = from_iter([1, 2]).append(from_iter([3, 4])).sink(log.push());
  assert_eq!(log.get(), vec![1, 2, 3, 4]);
}

#[rxdemand_macro::test]
fn switch_to_latest_follows_the_newest_publisher() {
  let log = Log::new();
  let done = Arc::new(AtomicUsize::new(0));
  let (p1, p2, p3) =
    (PassthroughSubject::<i32>::new(), PassthroughSubject::<i32>::new(), PassthroughSubject::<i32>::new());
  let publishers = PassthroughSubject::<PassthroughSubject<i32>>::new();
  let _h = publishers.clone().switch_to_latest().sink_completion(completions(&done), log.push());

  publishers.send(p1.clone());
  p1.send(1);
  p1.send(2);

  publishers.send(p2.clone());
  p1.send(3);
  p2.send(4);
  p2.send(5);

  publishers.send(p3.clone());
  p2.send(6);
  p3.send(7);
  p3.send(8);
  p3.send(9);

  p3.finish();
  assert_eq!(done.load(Ordering::SeqCst), 0);
  publishers.finish();
  assert_eq!(log.get(), vec![1, 2, 4, 5, 7, 8, 9]);
  assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[rxdemand_macro::test]
fn merge_completes_after_both() {
  let log = Log::new();
  let done = Arc::new(AtomicUsize::new(0));
  let (p1, p2) = (PassthroughSubject::<i32>::new(), PassthroughSubject::<i32>::new());
  let _h = p1.clone().merge(p2.clone()).sink_completion(completions(&done), log.push());

  p1.send(1);
  p1.send(2);
  p2.send(3);
  p1.send(4);
  p2.send(5);
  p1.finish();
  assert_eq!(done.load(Ordering::SeqCst), 0);
  p2.finish();
  assert_eq!(log.get(), vec![1, 2, 3, 4, 5]);
  assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[rxdemand_macro::test]
fn combine_latest_example() {
  let log = Log::new();
  let done = Arc::new(AtomicUsize::new(0));
  let p1 = PassthroughSubject::<i32>::new();
  let p2 = PassthroughSubject::<&'static str>::new();
  let _h = p1.clone().combine_latest(p2.clone()).sink_completion(completions(&done), log.push());

  p1.send(1);
  p1.send(2);
  p2.send("a");
  p2.send("b");
  p1.send(3);
  p2.send("c");
  p1.finish();
  p2.finish();
  assert_eq!(log.get(), vec![(2, "a"), (2, "b"), (3, "b"), (3, "c")]);
  assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[rxdemand_macro::test]
fn zip_example() {
  let log = Log::new();
  let done = Arc::new(AtomicUsize::new(0));
  let p1 = PassthroughSubject::<i32>::new();
  let p2 = PassthroughSubject::<&'static str>::new();
  let _h = p1.clone().zip(p2.clone()).sink_completion(completions(&done), log.push());

  p1.send(1);
  p1.send(2);
  p2.send("a");
  p2.send("b");
  p2.send("X");
  p1.send(3);
  p2.send("c");
  p2.send("d");
  p1.finish();
  p2.finish();
  assert_eq!(log.get(), vec![(1, "a"), (2, "b"), (3, "X")]);
  assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[rxdemand_macro::test]
fn current_value_subject_replays_the_latest_value() {
  let mut bag = CancelBag::new();
  let first = Log::new();
  let subject = CurrentValueSubject::<i32>::new(0);
  subject.clone().sink(first.push()).store(&mut bag);

  subject.send(1);
  subject.send(2);
  assert_eq!(subject.value(), 2);

  let second = Log::new();
  subject.clone().sink(second.push()).store(&mut bag);
  subject.send(3);
  assert_eq!(first.get(), vec![0, 1, 2, 3]);
  assert_eq!(second.get(), vec![2, 3]);

  bag.cancel_all();
  subject.send(4);
  assert_eq!(first.get(), vec![0, 1, 2, 3]);
  assert_eq!(subject.subscriber_count(), 0);
}

#[rxdemand_macro::test]
fn failed_subject_ignores_a_later_finish() {
  let failures = Log::new();
  let mut record = failures.push();
  let subject = PassthroughSubject::<i32, String>::new();
  let _h = subject.clone().sink_completion(
    move |c: Completion<String>| {
      if let Completion::Failed(err) = c {
        record(err)
      }
    },
    |_| {},
  );
  subject.fail("boom".to_string());
  subject.finish();
  subject.send(1);
  assert_eq!(failures.get(), vec!["boom".to_string()]);
  assert!(subject.is_terminated());
}

#[rxdemand_macro::test]
fn delayed_timer_ticks() {
  TestScheduler::init();
  let source = PassthroughSubject::<usize>::new();
  let emitted = Log::new();
  let delayed = Log::new();
  let _a = source.clone().sink(emitted.push());
  let _b = source.clone().delay(Duration::from_millis(1500), TestScheduler).sink(delayed.push());

  let timer = Timer::new(Duration::from_secs(1), TestScheduler).drive(source.clone());
  TestScheduler::advance_by(Duration::from_secs(3));
  assert_eq!(emitted.get(), vec![0, 1, 2]);
  assert_eq!(delayed.get(), vec![0]);

  drop(timer);
  TestScheduler::advance_by(Duration::from_secs(2));
  assert_eq!(emitted.get(), vec![0, 1, 2]);
  assert_eq!(delayed.get(), vec![0, 1, 2]);
}

#[rxdemand_macro::test]
fn thread_scheduler_delivers_from_another_thread() {
  let (tx, rx) = std::sync::mpsc::channel();
  let _h = from_iter([1, 2, 3]).delay(Duration::from_millis(5), ThreadScheduler).sink(move |v| {
    let _ = tx.send(v);
  });
  let got: Vec<i32> =
    (0..3).filter_map(|_| rx.recv_timeout(Duration::from_secs(5)).ok()).collect();
  assert_eq!(got.len(), 3);
  let mut sorted = got.clone();
  sorted.sort();
  assert_eq!(sorted, vec![1, 2, 3]);
}

#[rxdemand_macro::test]
fn subject_relays_a_publisher() {
  let log = Log::new();
  let subject = PassthroughSubject::<i32>::new();
  let done = Arc::new(AtomicUsize::new(0));
  let _h = subject.clone().sink_completion(completions(&done), log.push());

  from_iter(1..=3).subscribe(subject.clone());
  assert_eq!(log.get(), vec![1, 2, 3]);
  assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[rxdemand_macro::test]
fn boxed_pipelines_share_a_type() {
  let pipelines: Vec<BoxedPublisher<i32, Infallible>> = vec![
    from_iter(1..=3).map(|v| v * 10).boxed(),
    just(7).boxed(),
    empty().boxed(),
  ];
  let log = Log::new();
  for pipeline in pipelines {
    let _h = pipeline.sink(log.push());
  }
  assert_eq!(log.get(), vec![10, 20, 30, 7]);
}

// ==================== Demand ====================

/// Requests one value at a time from inside `on_value`.
struct OneByOne {
  subscription: Option<SubscriptionRef>,
  seen: Arc<AtomicUsize>,
}

impl Subscriber<u32, Infallible> for OneByOne {
  fn on_subscribe(&mut self, subscription: SubscriptionRef) {
    subscription.request(Demand::max(1));
    self.subscription = Some(subscription);
  }

  fn on_value(&mut self, _: u32) -> Demand {
    self.seen.fetch_add(1, Ordering::SeqCst);
    if let Some(subscription) = &self.subscription {
      subscription.request(Demand::max(1));
    }
    Demand::NONE
  }

  fn on_completion(&mut self, _: Completion<Infallible>) { self.subscription = None; }
}

#[rxdemand_macro::test]
fn reentrant_requests_do_not_grow_the_stack() {
  let seen = Arc::new(AtomicUsize::new(0));
  from_iter(0..200_000u32)
    .map(|v| v + 1)
    .subscribe(OneByOne { subscription: None, seen: seen.clone() });
  assert_eq!(seen.load(Ordering::SeqCst), 200_000);
}

#[rxdemand_macro::test]
fn handle_events_sees_prefix_cancel_upstream() {
  let requested = Arc::new(AtomicUsize::new(0));
  let cancelled = Arc::new(AtomicUsize::new(0));
  let (r, c) = (requested.clone(), cancelled.clone());
  let log = Log::new();
  let _h = from_iter(1..=4)
    .handle_events(
      EventHooks::new()
        .on_request(move |d: Demand| {
          r.fetch_add(d.count().unwrap_or(usize::MAX), Ordering::SeqCst);
        })
        .on_cancel(move || {
          c.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .log_events("prefix")
    .prefix(2)
    .sink(log.push());
  assert_eq!(log.get(), vec![1, 2]);
  assert_eq!(requested.load(Ordering::SeqCst), 2);
  assert_eq!(cancelled.load(Ordering::SeqCst), 1);
}

#[rxdemand_macro::test]
fn one_shared_photo_stream_feeds_several_pipelines() {
  let photos = PassthroughSubject::<u32>::new();
  let new_photos = photos.clone().prefix_while(|count| *count < 6).share();

  let collected = Log::new();
  let titles = Log::new();
  let done = Arc::new(AtomicUsize::new(0));
  let _collage = new_photos.clone().sink(collected.push());
  let _title = new_photos.clone().map(|n| format!("{n} photos")).sink(titles.push());
  let _updates = new_photos.ignore_output().sink_completion(completions(&done), |_| {});
  assert_eq!(photos.subscriber_count(), 1);

  for n in [1, 2, 6, 7] {
    photos.send(n);
  }
  assert_eq!(collected.get(), vec![1, 2]);
  assert_eq!(titles.get(), vec!["1 photos".to_string(), "2 photos".to_string()]);
  assert_eq!(done.load(Ordering::SeqCst), 1);
  assert_eq!(photos.subscriber_count(), 0);
}
