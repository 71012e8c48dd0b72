use std::future::Future;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;

/// A fixed-interval recurring task. The tick runs once immediately,
/// then again each interval; the next interval is armed only after the
/// prior tick settles, so two ticks of the same repeater never overlap.
///
/// Dropping the handle closes the stop channel, which tears the loop
/// down after the in-flight tick. [`Repeater::cancel`] does the same
/// but also waits for the loop to finish.
pub struct Repeater {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

impl Repeater {
    pub fn spawn<F, Fut>(name: &'static str, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (stop, stopped): (Sender<()>, Receiver<()>) = async_channel::bounded(1);

        let handle = tokio::spawn(async move {
            loop {
                tick().await;

                tokio::select! {
                    _ = stopped.recv() => {
                        tracing::info!(name, "repeater stopped");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        Self { stop, handle }
    }

    #[tracing::instrument(skip(self))]
    pub async fn cancel(self) {
        let _ = self.stop.send(()).await;
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_immediately_then_on_interval() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let repeater = Repeater::spawn("test", Duration::from_secs(3), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);

        repeater.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_repeater_stops_ticking() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();

        let repeater = Repeater::spawn("test", Duration::from_secs(1), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        repeater.cancel().await;

        let after_cancel = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_never_overlap() {
        let busy = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));

        let repeater = {
            let busy = busy.clone();
            let overlapped = overlapped.clone();

            // each tick outlasts the interval
            Repeater::spawn("test", Duration::from_millis(10), move || {
                let busy = busy.clone();
                let overlapped = overlapped.clone();
                async move {
                    if busy.swap(true, Ordering::SeqCst) {
                        overlapped.store(true, Ordering::SeqCst);
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    busy.store(false, Ordering::SeqCst);
                }
            })
        };

        tokio::time::sleep(Duration::from_secs(10)).await;
        repeater.cancel().await;

        assert!(!overlapped.load(Ordering::SeqCst));
    }
}
