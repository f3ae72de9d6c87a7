//! Prelude module for convenient imports

// Core protocol
pub use crate::{
  demand::Demand,
  error::{Completion, ProtocolViolation},
  publisher::{Publisher, PublisherExt},
  subscriber::{BoxedSubscriber, Sink, Subscriber},
  subscription::{AnyCancellable, CancelBag, Cancellable, Subscription, SubscriptionRef},
};
// Leaf publishers
pub use crate::publisher::{
  empty, fail, from_iter, just, BoxedPublisher, Empty, Fail, FromIter, Just,
};
// Subjects
pub use crate::subject::{CurrentValueSubject, PassthroughSubject, Subject};
// Operators that are built directly rather than through `PublisherExt`
pub use crate::ops::{
  handle_events::{EventHandler, EventHooks},
  log_events::EventLogger,
  merge::Merge,
};
// Schedulers
#[cfg(all(feature = "futures-scheduler", not(target_arch = "wasm32")))]
pub use crate::scheduler::ThreadPoolScheduler;
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::scheduler::{ImmediateScheduler, Scheduler, TaskHandle, TestScheduler, ThreadScheduler};
// Adapters
pub use crate::adapter::Timer;
