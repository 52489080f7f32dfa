//! Discount polling and the active-code feed.

use std::sync::Arc;
use std::time::Duration;

use jiff::civil;
use rustc_hash::FxHashSet;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use samagri::discounts::DiscountRate;

use crate::api::DiscountsApi;
use crate::notify::{Notice, Notices};

/// An announced discount code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountCode {
    /// The code itself, as quoted at checkout.
    pub code: String,

    /// The fractional rate the code grants.
    pub rate: DiscountRate,

    /// The last day the code is valid, when the backend announces one.
    pub expires_on: Option<civil::Date>,
}

/// Read side of the discount watcher: the code currently in effect.
#[derive(Debug, Clone)]
pub struct DiscountFeed {
    rx: watch::Receiver<Option<DiscountCode>>,
}

impl DiscountFeed {
    /// A feed pinned to one value, for tests and offline sessions.
    #[must_use]
    pub fn fixed(code: Option<DiscountCode>) -> Self {
        let (_, rx) = watch::channel(code);

        DiscountFeed { rx }
    }

    /// The active discount code, if any.
    #[must_use]
    pub fn active(&self) -> Option<DiscountCode> {
        self.rx.borrow().clone()
    }

    /// The rate to apply right now. Zero when no code is active.
    #[must_use]
    pub fn current_rate(&self) -> DiscountRate {
        self.rx.borrow().as_ref().map_or(DiscountRate::ZERO, |code| code.rate)
    }

    /// Wait until the feed publishes its next value.
    ///
    /// # Errors
    ///
    /// Returns an error once the watcher behind the feed is gone.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

/// Background poller that keeps the discount feed fresh.
///
/// Each code seen for the first time in this process produces exactly one
/// [`Notice::DiscountAnnounced`]. The seen set is not persisted, so a new
/// session may announce an ongoing code again.
#[derive(Debug)]
pub struct DiscountWatcher {
    task: JoinHandle<()>,
}

impl DiscountWatcher {
    /// How often the backend is asked for active codes unless configured
    /// otherwise.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

    /// Spawn the poller on the current runtime and hand back its feed.
    ///
    /// The first poll happens immediately; later polls follow every
    /// `poll_interval`, with missed ticks delayed rather than bunched.
    #[must_use]
    pub fn spawn(
        api: Arc<dyn DiscountsApi>,
        poll_interval: Duration,
        notices: Notices,
    ) -> (Self, DiscountFeed) {
        let (tx, rx) = watch::channel(None);

        let task = tokio::spawn(poll(api, poll_interval, notices, tx));

        (DiscountWatcher { task }, DiscountFeed { rx })
    }

    /// Stop polling, abandoning any in-flight fetch.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn poll(
    api: Arc<dyn DiscountsApi>,
    every: Duration,
    notices: Notices,
    tx: watch::Sender<Option<DiscountCode>>,
) {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut ticks = time::interval(every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;

        let codes = match api.active_discounts().await {
            Ok(codes) => codes,
            Err(error) => {
                // A failed poll keeps the previous code in effect.
                debug!(%error, "discount poll failed");
                continue;
            }
        };

        for code in &codes {
            if seen.insert(code.code.clone()) {
                info!(code = %code.code, "discount code announced");

                notices.publish(Notice::DiscountAnnounced {
                    code: code.code.clone(),
                    rate: code.rate,
                });
            }
        }

        tx.send_replace(codes.into_iter().next());
    }
}
