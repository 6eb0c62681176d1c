//! The canonical example generator: doubled integers.
//!
//! Written as a plain loop this is
//!
//! ```text
//! n = 0
//! while n < limit {
//!     yield n * 2
//!     n += 1
//! }
//! ```
//!
//! The single yield site sits in the middle of the loop body, so resuming has to land on the
//! increment and carry on with the same loop rather than starting it again.
use crate::{
    body::{Body, Entry, Step},
    generator::Generator,
};

/// The number of values produced by [Doubled::default].
pub const DEFAULT_LIMIT: i32 = 10;

/// Yields `2 * n` for every `n` in `0..limit`.
///
/// Values are widened to `i64` so that doubling never overflows, whatever the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Doubled {
    limit: i32,
}

impl Default for Doubled {
    fn default() -> Self {
        Self::up_to(DEFAULT_LIMIT)
    }
}

impl Doubled {
    /// Doubled values of `0..limit`. A limit of zero or less produces nothing.
    pub fn up_to(limit: i32) -> Self {
        Self { limit }
    }

    /// The exclusive upper bound of the loop counter.
    pub fn limit(&self) -> i32 {
        self.limit
    }
}

/// The loop counter for [Doubled].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    /// The current value of the loop variable.
    pub n: i32,
}

/// The only yield site in [Doubled].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AfterYield;

// Control points inside the loop that execution can be transferred to.
enum Label {
    Init,
    Test,
    Increment,
}

impl Body for Doubled {
    type Yield = i64;
    type Locals = Counter;
    type Resume = AfterYield;

    fn step(&self, entry: Entry<AfterYield>, c: &mut Counter) -> Step<AfterYield, i64> {
        let mut label = match entry {
            Entry::Start => Label::Init,
            Entry::Resume(AfterYield) => Label::Increment,
        };

        loop {
            label = match label {
                Label::Init => {
                    c.n = 0;
                    Label::Test
                }
                Label::Test if c.n < self.limit => {
                    return Step::Yield(AfterYield, i64::from(c.n) * 2);
                }
                Label::Test => return Step::Done,
                Label::Increment => {
                    c.n += 1;
                    Label::Test
                }
            };
        }
    }
}

/// A generator producing doubled values of `0..limit`.
pub fn doubled(limit: i32) -> Generator<Doubled> {
    Generator::from_body(Doubled::up_to(limit))
}
