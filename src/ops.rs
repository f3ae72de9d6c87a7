//! Operators.
//!
//! Single-source operators that keep the 1:1 relation between requests and
//! deliveries (`map`, `filter`, `drop_first`, ...) wrap the downstream
//! subscriber and pass the upstream subscription through, possibly wrapped.
//! Operators that own state across several upstreams (`merge`, `zip`,
//! `combine_latest`, `switch_to_latest`, `concat`, `delay`) deliver through
//! their own outlet and forward demand to each upstream. `share` multicasts
//! one upstream subscription through a subject.

pub mod combine_latest;
pub mod concat;
pub mod delay;
pub mod drop_first;
pub mod filter;
pub mod handle_events;
pub mod ignore_output;
pub mod log_events;
pub mod map;
pub mod map_err;
pub mod merge;
pub mod prefix;
pub mod prefix_while;
pub mod share;
pub mod switch_to_latest;
pub mod zip;

/// Turn the nested pairs of a two-level zip or combine into a triple.
pub(crate) fn flatten3<A, B, C>(((a, b), c): ((A, B), C)) -> (A, B, C) { (a, b, c) }
