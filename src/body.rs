//! The logic of a generator written as an explicit step function.
//!
//! A generator body is "written once" with one or more yield sites. Rather than jumping into
//! the middle of a loop (which safe Rust has no way of expressing) the loop is defunctionalized:
//! each yield site becomes a variant of [Body::Resume], and [Body::step] maps the site it is
//! re-entered at onto an internal control label before running its own `loop { match .. }`.
//!
//! ```
//! use jumpback::{Body, Entry, Generator, Step};
//!
//! /// Yields `n` then `-n` for every `n` in `1..=3`.
//! struct PlusMinus;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! enum Site {
//!     Plus,
//!     Minus,
//! }
//!
//! impl Body for PlusMinus {
//!     type Yield = i32;
//!     type Locals = i32;
//!     type Resume = Site;
//!
//!     fn step(&self, entry: Entry<Site>, n: &mut i32) -> Step<Site, i32> {
//!         match entry {
//!             Entry::Start => *n = 1,
//!             Entry::Resume(Site::Plus) => return Step::Yield(Site::Minus, -*n),
//!             Entry::Resume(Site::Minus) => *n += 1,
//!         }
//!
//!         if *n <= 3 { Step::Yield(Site::Plus, *n) } else { Step::Done }
//!     }
//! }
//!
//! let values: Vec<i32> = Generator::new(PlusMinus, 0).collect();
//! assert_eq!(values, [1, -1, 2, -2, 3, -3]);
//! ```
use std::fmt;

/// Where a call to [Body::step] enters the generator's logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<R> {
    /// Run the body from the top.
    Start,
    /// Continue directly after the yield site `R`.
    Resume(R),
}

/// The outcome of running a [Body] up to its next suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<R, Y> {
    /// The body reached the yield site `R` producing `Y`.
    Yield(R, Y),
    /// The body ran past its last yield site.
    Done,
}

/// The logic of a generator as a resumable step function.
///
/// Implementations must keep every piece of context that survives a yield inside
/// [Body::Locals] or the returned [Body::Resume] marker: nothing else is retained between
/// calls to [Body::step].
pub trait Body {
    /// The values produced at each yield site
    type Yield;
    /// Iteration state that survives across suspension (loop counters and the like)
    type Locals;
    /// One value for each yield site in the body
    type Resume: Copy + fmt::Debug;

    /// Run the body from `entry` until the next yield site or until it completes.
    fn step(&self, entry: Entry<Self::Resume>, locals: &mut Self::Locals)
    -> Step<Self::Resume, Self::Yield>;
}

impl<B: Body + ?Sized> Body for &B {
    type Yield = B::Yield;
    type Locals = B::Locals;
    type Resume = B::Resume;

    fn step(
        &self,
        entry: Entry<Self::Resume>,
        locals: &mut Self::Locals,
    ) -> Step<Self::Resume, Self::Yield> {
        (**self).step(entry, locals)
    }
}
