//! # rxdemand: demand-driven reactive streams
//!
//! Publishers, subscribers and subjects with explicit backpressure. A
//! subscriber receives no more values than it has requested through its
//! [`Subscription`], and every subscription ends with exactly one terminal
//! [`Completion`], or with nothing at all once cancelled.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxdemand::prelude::*;
//!
//! let _handle = from_iter(1..=100)
//!   .drop_first(50)
//!   .prefix(20)
//!   .filter(|v| v % 2 == 0)
//!   .sink(|v| println!("{v}"));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Demand`] | How many more values a subscriber accepts |
//! | [`Publisher`] | Produces values under demand; operators come from [`PublisherExt`] |
//! | [`Subscriber`] | Receives the subscription, values and one completion |
//! | [`Subscription`] | Requests demand and cancels |
//! | [`PassthroughSubject`] / [`CurrentValueSubject`] | Publishers fed by `send` |
//! | [`Scheduler`] | Runs delayed work for `delay` and [`Timer`] |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `ThreadPoolScheduler` on a shared
//!   `futures` thread pool
//! - **`timer`** (default): async sleeps for the thread-pool scheduler
//! - **`tokio-scheduler`**: `TokioScheduler`
//!
//! [`Demand`]: demand::Demand
//! [`Completion`]: error::Completion
//! [`Publisher`]: publisher::Publisher
//! [`PublisherExt`]: publisher::PublisherExt
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`PassthroughSubject`]: subject::PassthroughSubject
//! [`CurrentValueSubject`]: subject::CurrentValueSubject
//! [`Scheduler`]: scheduler::Scheduler
//! [`Timer`]: adapter::Timer

pub mod adapter;
pub mod demand;
pub mod error;
pub mod ops;
pub mod prelude;
pub mod publisher;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

#[cfg(test)]
mod test_support;

pub use prelude::*;
