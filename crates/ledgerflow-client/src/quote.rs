//! Debounced quote pipeline: converts a rapidly-changing input into a
//! rate-limited stream of remote quote queries. Every new input restarts
//! the quiet-period timer; a superseded input never produces a query, and
//! a newer input arriving while a query is in flight discards that
//! query's result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ledgerflow_primitives::ledger::RemoteLedger;
use ledgerflow_primitives::quote::{QuoteQuery, QuoteResult};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
struct SequencedQuery {
    sequence: u64,
    query: QuoteQuery,
}

#[derive(Debug)]
pub struct QuotePipeline {
    input_tx: mpsc::UnboundedSender<SequencedQuery>,
    latest_rx: watch::Receiver<Option<QuoteResult>>,
    next_sequence: AtomicU64,
    cancel: CancellationToken,
}

impl QuotePipeline {
    /// Spawns the pipeline's background task. It runs until the pipeline
    /// is dropped or `shutdown` is called.
    pub fn spawn(ledger: Arc<dyn RemoteLedger>, quiet_period: Duration) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (latest_tx, latest_rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        tokio::spawn(run(ledger, quiet_period, input_rx, latest_tx, cancel.clone()));

        Self {
            input_tx,
            latest_rx,
            next_sequence: AtomicU64::new(1),
            cancel,
        }
    }

    /// Feeds a new input value. Returns the sequence number assigned to
    /// it; results published for a lower sequence are stale.
    pub fn observe(&self, query: QuoteQuery) -> u64 {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        // A send failure means the task is shut down; observing after
        // shutdown is a silent no-op.
        let _ = self.input_tx.send(SequencedQuery { sequence, query });
        sequence
    }

    /// Most recent quote, if any input has survived its quiet period and
    /// its query completed.
    #[must_use]
    pub fn latest_quote(&self) -> Option<QuoteResult> {
        *self.latest_rx.borrow()
    }

    /// Watch handle for consumers that want to react to new quotes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<QuoteResult>> {
        self.latest_rx.clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for QuotePipeline {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    ledger: Arc<dyn RemoteLedger>,
    quiet_period: Duration,
    mut input_rx: mpsc::UnboundedReceiver<SequencedQuery>,
    latest_tx: watch::Sender<Option<QuoteResult>>,
    cancel: CancellationToken,
) {
    'outer: loop {
        // Wait for the first input of a burst.
        let mut current = tokio::select! {
            () = cancel.cancelled() => break 'outer,
            maybe = input_rx.recv() => match maybe {
                Some(v) => v,
                None => break 'outer,
            },
        };

        'debounce: loop {
            // Quiet-period timer, restarted by every newer input.
            tokio::select! {
                () = cancel.cancelled() => break 'outer,
                maybe = input_rx.recv() => match maybe {
                    Some(v) => { current = v; continue 'debounce; }
                    None => break 'outer,
                },
                () = tokio::time::sleep(quiet_period) => {}
            }

            // Quiet period elapsed: issue the one query for this burst.
            // A newer input arriving mid-flight supersedes the query; its
            // result is never published.
            tokio::select! {
                () = cancel.cancelled() => break 'outer,
                maybe = input_rx.recv() => match maybe {
                    Some(v) => {
                        tracing::debug!(superseded = current.sequence, by = v.sequence, "in-flight quote superseded");
                        current = v;
                        continue 'debounce;
                    }
                    None => break 'outer,
                },
                result = ledger.read_quote(current.query) => {
                    match result {
                        Ok(amount_out) => {
                            let quote = QuoteResult {
                                sequence: current.sequence,
                                query: current.query,
                                amount_out,
                            };
                            tracing::debug!(sequence = quote.sequence, %amount_out, "quote published");
                            let _ = latest_tx.send(Some(quote));
                        }
                        Err(e) => tracing::warn!(error = %e, "quote query failed"),
                    }
                    continue 'outer;
                }
            }
        }
    }
}
