//! Asynchronous timer abstraction providing every bounded wait of the
//! controller (queue timeouts, settings lock, dispatcher idle poll).
use futures_util::future::{select, Either};
use futures_util::pin_mut;

/// Timer trait abstraction; shared by every task using the controller.
pub trait BusTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms(&self, millis: u32) -> impl core::future::Future<Output = ()> + '_;
}

/// Race `future` against a `millis` delay.
///
/// Returns `None` when the delay elapsed first; the future is dropped then.
/// The future is polled first, so a ready result wins even with a zero delay.
pub async fn with_timeout<T, F>(timer: &T, millis: u32, future: F) -> Option<F::Output>
where
    T: BusTimer,
    F: core::future::Future,
{
    let delay = timer.delay_ms(millis);
    pin_mut!(future);
    pin_mut!(delay);

    match select(future, delay).await {
        Either::Left((output, _)) => Some(output),
        Either::Right(_) => None,
    }
}

#[cfg(feature = "embassy-time")]
/// [`BusTimer`] backed by the embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTimer;

#[cfg(feature = "embassy-time")]
impl BusTimer for EmbassyTimer {
    async fn delay_ms(&self, millis: u32) {
        embassy_time::Timer::after_millis(millis as u64).await;
    }
}
