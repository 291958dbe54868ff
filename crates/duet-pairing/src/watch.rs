//! First-match-wins merge of the two own-couple subscriptions.

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use duet_domain::{Couple, CoupleId};
use duet_store::{Document, Subscription};

use crate::domain::types::couple_from_doc;

/// A lazy, infinite, restartable sequence of "current couple state or
/// none".
///
/// The store cannot express `userA == uid OR userB == uid` natively, so two
/// parallel subscriptions feed a single channel; whichever side holds a
/// match wins. Dropping the handle (or calling [`CoupleWatch::stop`]) tears
/// both store subscriptions down.
pub struct CoupleWatch {
    rx: mpsc::Receiver<Option<(CoupleId, Couple)>>,
    _stop: oneshot::Sender<()>,
}

impl CoupleWatch {
    pub(crate) fn merge(mut side_a: Subscription, mut side_b: Subscription) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut latest_a: Vec<Document> = Vec::new();
            let mut latest_b: Vec<Document> = Vec::new();
            let mut seen_a = false;
            let mut seen_b = false;
            let mut emitted: Option<Option<(CoupleId, Couple)>> = None;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    snapshot = side_a.next() => match snapshot {
                        Some(docs) => {
                            latest_a = docs;
                            seen_a = true;
                        }
                        None => break,
                    },
                    snapshot = side_b.next() => match snapshot {
                        Some(docs) => {
                            latest_b = docs;
                            seen_b = true;
                        }
                        None => break,
                    },
                }
                // The first state is meaningless until both sides have
                // reported their initial snapshot.
                if !(seen_a && seen_b) {
                    continue;
                }
                let current = latest_a
                    .iter()
                    .chain(latest_b.iter())
                    .find_map(|doc| {
                        couple_from_doc(doc)
                            .ok()
                            .map(|couple| (CoupleId::from_raw(doc.id.clone()), couple))
                    });
                if emitted.as_ref() != Some(&current) {
                    emitted = Some(current.clone());
                    if tx.send(current).await.is_err() {
                        break;
                    }
                }
            }
            debug!("own-couple watch ended");
            // side_a/side_b drop here, cancelling the store listeners.
        });

        Self { rx, _stop: stop_tx }
    }

    /// Wait for the next state. Outer `None` once the watch has ended.
    pub async fn next(&mut self) -> Option<Option<(CoupleId, Couple)>> {
        self.rx.recv().await
    }

    /// Explicit teardown of both underlying subscriptions.
    pub fn stop(self) {
        drop(self);
    }
}
