//! Suspended execution state and the [advance] operation that resumes it.
use crate::body::{Body, Entry, Step};
use std::{fmt, iter::FusedIterator};
use tracing::trace;

/// Where a generator will continue from on its next call to [advance].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<R> {
    /// The body has not been entered yet.
    NotStarted,
    /// The body is suspended at the yield site `R`.
    Suspended(R),
    /// The body has run past its last yield site. This is terminal.
    Exhausted,
}

impl<R> Position<R> {
    /// Returns true once the body has run to completion.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl<R: fmt::Debug> fmt::Display for Position<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Suspended(r) => write!(f, "suspended at {r:?}"),
            Self::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// The result of a single call to [advance].
///
/// Exhaustion is its own variant so that no produced value is ever mistaken for the end of the
/// sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance<Y> {
    /// The generator produced a value and is now suspended.
    Yielded(Y),
    /// The generator has no further values.
    Exhausted,
}

impl<Y> Advance<Y> {
    /// Returns true if no value was produced.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Convert into an [Option], mapping exhaustion to `None`.
    pub fn into_option(self) -> Option<Y> {
        match self {
            Self::Yielded(y) => Some(y),
            Self::Exhausted => None,
        }
    }
}

impl<Y> From<Advance<Y>> for Option<Y> {
    fn from(adv: Advance<Y>) -> Self {
        adv.into_option()
    }
}

/// The suspended execution context of one generator: a resume position plus the iteration
/// state that has to survive between calls.
///
/// The position can be inspected but never set from outside of this crate, so a state can
/// only ever be resumed from a marker that its body actually produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorState<R, L> {
    position: Position<R>,
    locals: L,
}

impl<R, L: Default> Default for GeneratorState<R, L> {
    fn default() -> Self {
        Self::new(L::default())
    }
}

impl<R, L> GeneratorState<R, L> {
    /// Create a new, not yet started, state that owns `locals`.
    pub fn new(locals: L) -> Self {
        Self {
            position: Position::NotStarted,
            locals,
        }
    }

    /// The current resume position.
    pub fn position(&self) -> &Position<R> {
        &self.position
    }

    /// Returns true once [advance] has been called at least once.
    pub fn is_started(&self) -> bool {
        !matches!(self.position, Position::NotStarted)
    }

    /// Returns true once the body has run past its last yield site.
    pub fn is_exhausted(&self) -> bool {
        self.position.is_exhausted()
    }

    /// The iteration state as last left by the body.
    pub fn locals(&self) -> &L {
        &self.locals
    }

    /// Discard the position and recover the iteration state.
    pub fn into_locals(self) -> L {
        self.locals
    }
}

/// Resume `body` from the position recorded in `state` and run it to its next yield site.
///
/// Once the body completes the state is marked as exhausted and every further call returns
/// [Advance::Exhausted] without touching the body or the iteration state.
///
/// A state must always be driven by the body instance that started it. The resume marker and
/// locals only make sense to that body: resuming them with another value of the same type (a
/// different slice or limit, say) runs that body from the middle of a loop it never entered.
/// [Generator] keeps the two together so that this cannot happen by accident.
pub fn advance<B: Body>(
    body: &B,
    state: &mut GeneratorState<B::Resume, B::Locals>,
) -> Advance<B::Yield> {
    let entry = match state.position {
        Position::NotStarted => Entry::Start,
        Position::Suspended(r) => Entry::Resume(r),
        Position::Exhausted => {
            trace!("advance called on an exhausted generator");
            return Advance::Exhausted;
        }
    };

    match body.step(entry, &mut state.locals) {
        Step::Yield(r, y) => {
            trace!(from = ?entry, to = ?r, "generator suspended");
            state.position = Position::Suspended(r);
            Advance::Yielded(y)
        }

        Step::Done => {
            trace!(from = ?entry, "generator exhausted");
            state.position = Position::Exhausted;
            Advance::Exhausted
        }
    }
}

/// A [Body] bundled together with its own [GeneratorState].
#[derive(Debug, Clone)]
pub struct Generator<B: Body> {
    body: B,
    state: GeneratorState<B::Resume, B::Locals>,
}

impl<B: Body> Generator<B> {
    /// Create a generator that runs `body` using `locals` as its iteration state.
    pub fn new(body: B, locals: B::Locals) -> Self {
        Self {
            body,
            state: GeneratorState::new(locals),
        }
    }

    /// Create a generator whose iteration state starts out as its default value.
    pub fn from_body(body: B) -> Self
    where
        B::Locals: Default,
    {
        Self::new(body, B::Locals::default())
    }

    /// Run to the next yield site. See [advance].
    pub fn advance(&mut self) -> Advance<B::Yield> {
        advance(&self.body, &mut self.state)
    }

    /// The body this generator is running.
    pub fn body(&self) -> &B {
        &self.body
    }

    /// The current suspended state.
    pub fn state(&self) -> &GeneratorState<B::Resume, B::Locals> {
        &self.state
    }

    /// Returns true once the body has run past its last yield site.
    pub fn is_exhausted(&self) -> bool {
        self.state.is_exhausted()
    }

    /// Split this generator back into its body and state.
    pub fn into_parts(self) -> (B, GeneratorState<B::Resume, B::Locals>) {
        (self.body, self.state)
    }
}

impl<B: Body> Iterator for Generator<B> {
    type Item = B::Yield;

    fn next(&mut self) -> Option<B::Yield> {
        self.advance().into_option()
    }
}

impl<B: Body> FusedIterator for Generator<B> {}
