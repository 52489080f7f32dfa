//! User-facing notices.

use tokio::sync::broadcast;

use samagri::catalog::ItemRef;
use samagri::discounts::DiscountRate;

/// Capacity of the notice channel. Slow subscribers lose oldest notices
/// first rather than blocking publishers.
const NOTICE_CAPACITY: usize = 64;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A discount code became available.
    DiscountAnnounced {
        /// The code to quote at checkout.
        code: String,

        /// The fractional rate the code grants.
        rate: DiscountRate,
    },

    /// A quantity increase was capped at the available stock.
    StockLimited {
        /// The affected cart line.
        item: ItemRef,

        /// The stock ceiling that was hit.
        available: u32,
    },

    /// A backend mirror write failed. Local state is unaffected.
    SyncFailed {
        /// Which mirror operation failed.
        operation: &'static str,

        /// Failure description for logs and support.
        reason: String,
    },
}

impl Notice {
    /// The display message for this notice.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Notice::DiscountAnnounced { code, rate } => {
                format!("\u{1f389}{code} ({}% OFF)", rate.as_percent())
            }
            Notice::StockLimited { .. } => "Cannot add more than available stock.".to_owned(),
            Notice::SyncFailed { .. } => "Failed to sync cart with server".to_owned(),
        }
    }
}

/// Fan-out channel for notices.
///
/// Publishing never blocks and succeeds whether or not anyone is listening.
#[derive(Debug, Clone)]
pub struct Notices {
    tx: broadcast::Sender<Notice>,
}

impl Notices {
    /// Create a notice channel.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);

        Notices { tx }
    }

    /// Subscribe to notices published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, notice: Notice) {
        _ = self.tx.send(notice);
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn notice_messages_read_like_toasts() -> TestResult {
        let announced = Notice::DiscountAnnounced {
            code: "BAISAKHI10".to_owned(),
            rate: DiscountRate::new(dec!(0.1))?,
        };

        assert_eq!(announced.message(), "\u{1f389}BAISAKHI10 (10% OFF)");

        let limited = Notice::StockLimited {
            item: ItemRef::Product(42),
            available: 10,
        };

        assert_eq!(limited.message(), "Cannot add more than available stock.");

        Ok(())
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let notices = Notices::new();

        notices.publish(Notice::SyncFailed {
            operation: "upsert",
            reason: "backend down".to_owned(),
        });

        let mut inbox = notices.subscribe();

        notices.publish(Notice::StockLimited {
            item: ItemRef::Bundle(9),
            available: 3,
        });

        let received = inbox.recv().await.expect("should receive the notice");

        assert!(
            matches!(received, Notice::StockLimited { available: 3, .. }),
            "subscribers should only see notices published after subscribing"
        );
    }
}
