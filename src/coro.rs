//! Generators whose jump table is built by the compiler.
//!
//! An `async` block is already a resumable state machine: every `.await` is a suspension point
//! and polling the future jumps straight back to the last one, inside whatever loops surround
//! it. [Coro] drives such a future by hand so that the only thing it can ever suspend on is
//! [Handle::yield_value], turning it into a generator with the same contract as
//! [Generator][crate::Generator].
//!
//! ```
//! use jumpback::{Advance, Coro, Handle};
//!
//! let mut coro = Coro::from(async |handle: Handle<i32>| {
//!     for n in 0..3 {
//!         handle.yield_value(n * 2).await;
//!     }
//! });
//!
//! assert_eq!(coro.resume(), Ok(Advance::Yielded(0)));
//! assert_eq!(coro.resume(), Ok(Advance::Yielded(2)));
//! assert_eq!(coro.resume(), Ok(Advance::Yielded(4)));
//! assert_eq!(coro.resume(), Ok(Advance::Exhausted));
//! ```
use crate::generator::Advance;
use std::{
    any::TypeId,
    fmt,
    future::Future,
    iter::FusedIterator,
    marker::PhantomData,
    pin::Pin,
    ptr,
    task::{Context, Poll, RawWaker, RawWakerVTable, Waker},
};
use tracing::{trace, warn};

/// Errors surfaced while resuming a [Coro].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CoroError {
    /// The body suspended on something other than a single [Handle::yield_value].
    #[error("coroutine awaited a future other than Handle::yield_value")]
    ForeignAwait,
}

// The waker handed to the body carries a pointer to one of these. The TypeId comes first so that
// a yield can check it is writing into a slot of the right type before touching anything else.
#[repr(C)]
struct Slot<Y> {
    #[allow(dead_code)] // only read through a type erased pointer
    ty: TypeId,
    y: Option<Y>,
    // set when a second yield lands in the same resume
    poisoned: bool,
}

impl<Y: 'static> Slot<Y> {
    fn new() -> Self {
        Self {
            ty: TypeId::of::<Y>(),
            y: None,
            poisoned: false,
        }
    }
}

// A static rather than a const so that it has a single address that yields can check for. Only
// the waker borrowed inside of Coro::resume uses it: clones get NOOP_VTABLE and a null pointer so
// that nothing which outlives the poll can reach the slot.
static WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(clone_callback, |_| {}, |_| {}, |_| {});
static NOOP_VTABLE: RawWakerVTable = RawWakerVTable::new(clone_callback, |_| {}, |_| {}, |_| {});

unsafe fn clone_callback(_: *const ()) -> RawWaker {
    RawWaker::new(ptr::null(), &NOOP_VTABLE)
}

/// A generator backed by a future that only ever awaits [Handle::yield_value].
pub struct Coro<Y, F>
where
    Y: Unpin + 'static,
    F: Future<Output = ()>,
{
    slot: Slot<Y>,
    // None once the body has completed
    fut: Option<Pin<Box<F>>>,
    started: bool,
}

impl<Y, F> fmt::Debug for Coro<Y, F>
where
    Y: Unpin + 'static,
    F: Future<Output = ()>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coro")
            .field("started", &self.started)
            .field("exhausted", &self.is_exhausted())
            .finish()
    }
}

impl<G, Y, F> From<G> for Coro<Y, F>
where
    G: FnOnce(Handle<Y>) -> F,
    Y: Unpin + 'static,
    F: Future<Output = ()>,
{
    fn from(g: G) -> Self {
        Coro {
            slot: Slot::new(),
            fut: Some(Box::pin((g)(Handle { _y: PhantomData }))),
            started: false,
        }
    }
}

impl<Y, F> Coro<Y, F>
where
    Y: Unpin + 'static,
    F: Future<Output = ()>,
{
    /// Returns true once [resume][Coro::resume] has been called at least once.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns true once the body has completed (or been abandoned after an error).
    pub fn is_exhausted(&self) -> bool {
        self.fut.is_none()
    }

    /// Run the body to its next yield point.
    ///
    /// After the body completes every further call returns [Advance::Exhausted] without polling
    /// anything. If the body suspends on anything other than [Handle::yield_value] this returns
    /// [CoroError::ForeignAwait] and the coroutine is treated as exhausted from then on.
    pub fn resume(&mut self) -> Result<Advance<Y>, CoroError> {
        let Some(fut) = self.fut.as_mut() else {
            trace!("resume called on an exhausted coroutine");
            return Ok(Advance::Exhausted);
        };
        self.started = true;

        let slot: *mut Slot<Y> = &mut self.slot;
        // SAFETY: the vtable never dereferences the data pointer and clones do not carry it. It is
        // only read back by Yield::poll through this borrowed waker, inside of the poll call below
        // while `slot` is still valid.
        let waker = unsafe { Waker::from_raw(RawWaker::new(slot as *const (), &WAKER_VTABLE)) };
        let mut ctx = Context::from_waker(&waker);

        let res = fut.as_mut().poll(&mut ctx);
        if self.slot.poisoned {
            self.slot.y = None;
            self.fut = None;
            return Err(CoroError::ForeignAwait);
        }

        match res {
            Poll::Ready(()) => {
                trace!("coroutine exhausted");
                self.fut = None;
                Ok(Advance::Exhausted)
            }

            Poll::Pending => match self.slot.y.take() {
                Some(y) => {
                    trace!("coroutine suspended");
                    Ok(Advance::Yielded(y))
                }
                None => {
                    self.fut = None;
                    Err(CoroError::ForeignAwait)
                }
            },
        }
    }
}

impl<Y, F> Iterator for Coro<Y, F>
where
    Y: Unpin + 'static,
    F: Future<Output = ()>,
{
    type Item = Y;

    fn next(&mut self) -> Option<Y> {
        match self.resume() {
            Ok(adv) => adv.into_option(),
            Err(e) => {
                warn!(%e, "abandoning coroutine");
                None
            }
        }
    }
}

impl<Y, F> FusedIterator for Coro<Y, F>
where
    Y: Unpin + 'static,
    F: Future<Output = ()>,
{
}

/// A yield handle passed to the body of a [Coro].
///
/// The only way to obtain a [Handle] is by constructing a [Coro] from a closure or function
/// that accepts one.
pub struct Handle<Y> {
    _y: PhantomData<fn(Y)>,
}

impl<Y> fmt::Debug for Handle<Y> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").finish()
    }
}

impl<Y> Clone for Handle<Y> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Y> Copy for Handle<Y> {}

impl<Y> Handle<Y>
where
    Y: Unpin + 'static,
{
    /// Suspend the body, handing `y` to the caller of [Coro::resume].
    ///
    /// # Panics
    /// Panics if the returned future is polled by anything other than the [Coro] that
    /// created this handle.
    pub async fn yield_value(&self, y: Y) {
        Yield { y: Some(y) }.await
    }
}

struct Yield<Y> {
    y: Option<Y>,
}

impl<Y> Future for Yield<Y>
where
    Y: Unpin + 'static,
{
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<()> {
        let Some(y) = self.y.take() else {
            return Poll::Ready(());
        };

        assert!(
            ptr::eq(ctx.waker().vtable(), &WAKER_VTABLE),
            "Handle::yield_value polled outside of Coro::resume"
        );
        let slot = ctx.waker().data() as *mut () as *mut Slot<Y>;

        // SAFETY: only the waker borrowed by Coro::resume carries WAKER_VTABLE, so its data
        // points to a live Slot that nothing else is accessing for the duration of this poll.
        // Slot is repr(C) so the TypeId is at the front regardless of Y, and it is checked before
        // the rest of the slot is touched.
        unsafe {
            assert_eq!(
                *(slot as *const TypeId),
                TypeId::of::<Y>(),
                "Handle::yield_value polled by a Coro of a different type"
            );
            if (*slot).y.is_some() {
                (*slot).poisoned = true;
            } else {
                (*slot).y = Some(y);
            }
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        future::{pending, poll_fn},
        pin::pin,
        sync::{Arc, Mutex},
    };

    // Polls both futures every time, like a join combinator.
    struct Both<A, B>(Pin<Box<A>>, Pin<Box<B>>);

    impl<A, B> Future for Both<A, B>
    where
        A: Future<Output = ()>,
        B: Future<Output = ()>,
    {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<()> {
            let a = self.0.as_mut().poll(ctx);
            let b = self.1.as_mut().poll(ctx);

            if a.is_ready() && b.is_ready() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        }
    }

    #[test]
    fn resume_yields_then_exhausts() {
        let mut coro = Coro::from(async |handle: Handle<&'static str>| {
            handle.yield_value("ping").await;
            handle.yield_value("pong").await;
        });

        assert!(!coro.is_started());
        assert_eq!(coro.resume(), Ok(Advance::Yielded("ping")));
        assert!(coro.is_started());
        assert_eq!(coro.resume(), Ok(Advance::Yielded("pong")));
        assert_eq!(coro.resume(), Ok(Advance::Exhausted));
        assert!(coro.is_exhausted());
    }

    #[test]
    fn empty_body_exhausts_on_first_resume() {
        let mut coro = Coro::from(async |_: Handle<u8>| {});

        assert_eq!(coro.resume(), Ok(Advance::Exhausted));
        assert_eq!(coro.resume(), Ok(Advance::Exhausted));
    }

    #[test]
    fn foreign_await_is_an_error() {
        let mut coro = Coro::from(async |handle: Handle<u8>| {
            handle.yield_value(1).await;
            pending::<()>().await;
        });

        assert_eq!(coro.resume(), Ok(Advance::Yielded(1)));
        assert_eq!(coro.resume(), Err(CoroError::ForeignAwait));
        assert!(coro.is_exhausted());
        assert_eq!(coro.resume(), Ok(Advance::Exhausted));
    }

    #[test]
    fn iteration_stops_on_error() {
        let coro = Coro::from(async |handle: Handle<u8>| {
            handle.yield_value(1).await;
            pending::<()>().await;
            handle.yield_value(2).await;
        });

        assert_eq!(coro.collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn concurrent_yields_are_an_error() {
        let mut coro = Coro::from(async |handle: Handle<u8>| {
            Both(Box::pin(handle.yield_value(1)), Box::pin(handle.yield_value(2))).await;
        });

        assert_eq!(coro.resume(), Err(CoroError::ForeignAwait));
        assert!(coro.is_exhausted());
        assert_eq!(coro.resume(), Ok(Advance::Exhausted));
    }

    #[test]
    fn cloned_wakers_do_not_carry_the_slot() {
        let mut coro = Coro::from(async |handle: Handle<u8>| {
            let cloned = poll_fn(|ctx| Poll::Ready(ctx.waker().clone())).await;
            assert!(!ptr::eq(cloned.vtable(), &WAKER_VTABLE));
            assert!(cloned.data().is_null());
            handle.yield_value(1).await;
        });

        assert_eq!(coro.resume(), Ok(Advance::Yielded(1)));
    }

    #[test]
    #[should_panic(expected = "Handle::yield_value polled outside of Coro::resume")]
    fn stashed_waker_cannot_reach_a_dropped_coro() {
        let stash: Arc<Mutex<Option<(Waker, Handle<u32>)>>> = Default::default();
        let s = stash.clone();

        let mut coro = Coro::from(async move |handle: Handle<u32>| {
            let waker = poll_fn(|ctx| Poll::Ready(ctx.waker().clone())).await;
            *s.lock().unwrap() = Some((waker, handle));
            handle.yield_value(1).await;
        });
        assert_eq!(coro.resume(), Ok(Advance::Yielded(1)));
        drop(coro);

        let (waker, handle) = stash.lock().unwrap().take().unwrap();
        let mut ctx = Context::from_waker(&waker);
        let mut fut = pin!(handle.yield_value(0xdead_beef));
        let _ = fut.as_mut().poll(&mut ctx);
    }

    #[test]
    fn error_message() {
        assert_eq!(
            CoroError::ForeignAwait.to_string(),
            "coroutine awaited a future other than Handle::yield_value"
        );
    }
}
