//! Resumable generators built as jump-back state machines.
//!
//! A generator records how far it got, hands a single value back to its caller and, the next
//! time it is called, jumps straight back to just after the point where it left off. This crate
//! provides two ways of building one:
//!
//! - [Generator]: the jump table written out by hand. A [Body] is a step function keyed by an
//!   enum of its yield sites, with everything that has to survive a suspension held in its
//!   typed [Body::Locals].
//! - [Coro]: the jump table built by the compiler from an `async` block whose only await point
//!   is [Handle::yield_value].
//!
//! Both report each call as an [Advance], so running out of values is never confused with
//! producing a value that happens to look like an end marker.
//!
//! ```
//! use jumpback::{Advance, doubled};
//!
//! let mut g = doubled(3);
//!
//! assert_eq!(g.advance(), Advance::Yielded(0));
//! assert_eq!(g.advance(), Advance::Yielded(2));
//! assert_eq!(g.advance(), Advance::Yielded(4));
//! assert_eq!(g.advance(), Advance::Exhausted);
//! assert!(g.is_exhausted());
//! ```
#![warn(
    clippy::complexity,
    clippy::correctness,
    clippy::style,
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    rustdoc::all,
    clippy::undocumented_unsafe_blocks
)]

pub mod body;
pub mod coro;
pub mod doubling;
pub mod generator;

pub use body::{Body, Entry, Step};
pub use coro::{Coro, CoroError, Handle};
pub use doubling::{Counter, Doubled, doubled};
pub use generator::{Advance, Generator, GeneratorState, Position, advance};
