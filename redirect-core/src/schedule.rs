//! Cancellable timers.
//!
//! A sleep is a future; dropping it before it fires cancels the timer. The
//! browser scheduler lives in the web crate, [`VirtualScheduler`] drives
//! tests without wall-clock waits.
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

pub trait Scheduler {
    /// Future that completes once `delay` has elapsed.
    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()>;
}

#[derive(Default)]
struct VirtualClock {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<u64, PendingTimer>,
}

struct PendingTimer {
    deadline: Duration,
    waker: Option<Waker>,
}

/// Manually advanced clock.
///
/// Timers fire only when [`advance`](Self::advance) or
/// [`advance_to_next`](Self::advance_to_next) moves time past their deadline.
#[derive(Clone, Default)]
pub struct VirtualScheduler {
    clock: Rc<RefCell<VirtualClock>>,
}

impl VirtualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    /// Timers armed and neither fired nor dropped.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.clock.borrow().timers.len()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.clock
            .borrow()
            .timers
            .values()
            .map(|timer| timer.deadline)
            .min()
    }

    /// Move time forward and wake every timer that is now due.
    pub fn advance(&self, by: Duration) {
        let wakers: Vec<Waker> = {
            let mut clock = self.clock.borrow_mut();
            clock.now += by;
            let now = clock.now;
            clock
                .timers
                .values_mut()
                .filter(|timer| timer.deadline <= now)
                .filter_map(|timer| timer.waker.take())
                .collect()
        };
        for waker in wakers {
            waker.wake();
        }
    }

    /// Jump to the earliest pending deadline. Returns `false` when no timer
    /// is pending.
    pub fn advance_to_next(&self) -> bool {
        let Some(deadline) = self.next_deadline() else {
            return false;
        };
        let now = self.now();
        self.advance(deadline.saturating_sub(now));
        true
    }
}

impl Scheduler for VirtualScheduler {
    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
        let id = {
            let mut clock = self.clock.borrow_mut();
            let id = clock.next_id;
            clock.next_id += 1;
            let deadline = clock.now + delay;
            clock.timers.insert(
                id,
                PendingTimer {
                    deadline,
                    waker: None,
                },
            );
            id
        };
        Box::pin(VirtualSleep {
            clock: Rc::clone(&self.clock),
            id,
            done: false,
        })
    }
}

struct VirtualSleep {
    clock: Rc<RefCell<VirtualClock>>,
    id: u64,
    done: bool,
}

impl Future for VirtualSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(());
        }
        let mut clock = this.clock.borrow_mut();
        let now = clock.now;
        let due = clock
            .timers
            .get(&this.id)
            .is_none_or(|timer| timer.deadline <= now);
        if due {
            clock.timers.remove(&this.id);
            this.done = true;
            return Poll::Ready(());
        }
        if let Some(timer) = clock.timers.get_mut(&this.id) {
            timer.waker = Some(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl Drop for VirtualSleep {
    fn drop(&mut self) {
        if !self.done {
            self.clock.borrow_mut().timers.remove(&self.id);
        }
    }
}
