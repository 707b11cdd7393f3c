use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gloo_timers::future::TimeoutFuture;
use redirect_core::{MAX_TIMER_MS, Scheduler};
use std::time::Duration;

/// `setTimeout`-backed scheduler. Dropping a pending sleep clears its timeout.
///
/// Delays beyond [`MAX_TIMER_MS`] are clamped rather than wrapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
    fn sleep(&self, delay: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = u32::try_from(delay.as_millis().min(u128::from(MAX_TIMER_MS)))
            .unwrap_or(u32::MAX >> 1);
        TimeoutFuture::new(millis).boxed_local()
    }
}
