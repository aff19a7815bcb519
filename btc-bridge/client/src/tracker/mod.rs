//! Correlation of an L1 deposit with the priority operation it produced on L2.

mod clock;
pub use clock::{Clock, TokioClock};

use std::time::Duration;

use alloy_primitives::{Address, B256};
use btc_bridge_types::BOOTLOADER_FORMAL_ADDRESS;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace};

use crate::{
    error::{TrackerError, TrackerStage},
    provider::L2Rpc,
    types::L2ToL1LogEntry,
};

/// Default delay between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Status of a priority operation as reported by the L2 node. Ordered by
/// progress; `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriorityOpStatus {
    NotFound,
    Processing,
    Committed,
    Finalized,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerState {
    Pending,
    Found,
    Committed,
    Finalized,
    Abandoned,
}

/// Inclusion proof of the priority operation's log in its L1 batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationProof {
    pub l1_batch_number: u64,
    /// Position of the log leaf in the batch tree.
    pub l2_message_index: u32,
    pub l2_tx_number_in_block: u16,
    pub proof: Vec<B256>,
    pub root: B256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityOpRecord {
    pub l1_tx: B256,
    pub destination: Option<Address>,
    pub l2_tx_hash: Option<B256>,
    /// Hash of the log leaf that correlates the deposit with its L2 transaction.
    pub l2_message_hash: Option<B256>,
    pub status: PriorityOpStatus,
    pub log_index: u64,
    pub proof: Option<ConfirmationProof>,
    pub state: TrackerState,
}

impl PriorityOpRecord {
    fn new(l1_tx: B256) -> Self {
        Self {
            l1_tx,
            destination: None,
            l2_tx_hash: None,
            l2_message_hash: None,
            status: PriorityOpStatus::NotFound,
            log_index: 0,
            proof: None,
            state: TrackerState::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Tracks one priority operation from the L1 receipt to finality.
///
/// The tracker owns its [`PriorityOpRecord`]. Status only moves forward: a
/// response reporting less progress than already observed is stale and is
/// dropped. Polling has no retry limit, callers bound it with the
/// [`CancellationToken`] handed to the waiting methods. An RPC call in flight
/// is never interrupted, cancellation is seen before the next call or during
/// the delay.
pub struct PriorityOpTracker<P, C = TokioClock> {
    l2: P,
    clock: C,
    config: TrackerConfig,
    record: PriorityOpRecord,
}

impl<P: L2Rpc> PriorityOpTracker<P, TokioClock> {
    pub fn new(l2: P, l1_tx: B256, config: TrackerConfig) -> Self {
        Self {
            l2,
            clock: TokioClock,
            config,
            record: PriorityOpRecord::new(l1_tx),
        }
    }
}

impl<P: L2Rpc, C: Clock> PriorityOpTracker<P, C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> PriorityOpTracker<P, C2> {
        PriorityOpTracker {
            l2: self.l2,
            clock,
            config: self.config,
            record: self.record,
        }
    }

    /// Destination decoded from the deposit's marker output.
    pub fn with_destination(mut self, destination: Address) -> Self {
        self.record.destination = Some(destination);
        self
    }

    /// Selects among several priority operation logs of the same receipt, in
    /// emission order.
    pub fn with_log_index(mut self, log_index: u64) -> Self {
        self.record.log_index = log_index;
        self
    }

    pub fn record(&self) -> &PriorityOpRecord {
        &self.record
    }

    pub fn into_record(self) -> PriorityOpRecord {
        self.record
    }

    fn abandon(&mut self, reason: &str) {
        info!(l1_tx = %self.record.l1_tx, reason, "Abandoning priority operation");
        self.record.state = TrackerState::Abandoned;
    }

    /// Finds the priority operation log in the receipt and derives the
    /// correlation key from it.
    pub async fn locate(&mut self) -> Result<B256, TrackerError> {
        let l1_tx = self.record.l1_tx;
        let receipt = self
            .l2
            .transaction_receipt(l1_tx)
            .await
            .map_err(TrackerError::network(TrackerStage::Locate))?;
        let Some(receipt) = receipt else {
            self.abandon("receipt not found");
            return Err(TrackerError::ReceiptNotFound { l1_tx });
        };

        let (_, log) = priority_op_log(&receipt.l2_to_l1_logs, self.record.log_index)?;

        let l2_tx_hash = log.key;
        let l2_message_hash = log.leaf().hash();
        self.record.l2_tx_hash = Some(l2_tx_hash);
        self.record.l2_message_hash = Some(l2_message_hash);
        self.record.state = TrackerState::Found;
        info!(%l1_tx, %l2_tx_hash, %l2_message_hash, "Located priority operation");
        Ok(l2_tx_hash)
    }

    /// Applies one polled status. Statuses behind the current one are stale
    /// and ignored.
    pub fn observe(&mut self, status: PriorityOpStatus) -> Result<(), TrackerError> {
        let l2_tx_hash = self.record.l2_tx_hash.ok_or(TrackerError::NotLocated)?;
        let current = self.record.status;
        trace!(%l2_tx_hash, ?status, "Polled priority operation status");

        if current == PriorityOpStatus::Finalized {
            if status != current {
                debug!(%l2_tx_hash, ?status, "Ignoring status of a finalized operation");
            }
            return Ok(());
        }
        if status == PriorityOpStatus::Failed {
            self.record.status = status;
            self.abandon("priority operation failed");
            return Err(TrackerError::PriorityOpFailed { l2_tx_hash });
        }
        if status < current {
            debug!(%l2_tx_hash, ?status, ?current, "Ignoring stale status");
            return Ok(());
        }
        if status == current {
            return Ok(());
        }

        info!(%l2_tx_hash, from = ?current, to = ?status, "Priority operation status changed");
        self.record.status = status;
        match status {
            PriorityOpStatus::Processing | PriorityOpStatus::Committed => {
                self.record.state = TrackerState::Committed
            }
            PriorityOpStatus::Finalized => self.record.state = TrackerState::Finalized,
            PriorityOpStatus::NotFound | PriorityOpStatus::Failed => {}
        }
        Ok(())
    }

    /// Polls until the L2 node knows the operation.
    pub async fn wait_committed(&mut self, cancel: &CancellationToken) -> Result<(), TrackerError> {
        self.poll_until(TrackerStage::Commit, cancel, |status| {
            status > PriorityOpStatus::NotFound
        })
        .await
    }

    /// Polls until the operation is part of a finalized batch.
    pub async fn wait_finalized(&mut self, cancel: &CancellationToken) -> Result<(), TrackerError> {
        self.poll_until(TrackerStage::Finalize, cancel, |status| {
            status == PriorityOpStatus::Finalized
        })
        .await
    }

    async fn poll_until(
        &mut self,
        stage: TrackerStage,
        cancel: &CancellationToken,
        done: impl Fn(PriorityOpStatus) -> bool,
    ) -> Result<(), TrackerError> {
        let l2_tx_hash = self.record.l2_tx_hash.ok_or(TrackerError::NotLocated)?;
        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(stage));
            }

            let status = self
                .l2
                .priority_op_status(l2_tx_hash)
                .await
                .map_err(TrackerError::network(stage))?;
            self.observe(status)?;
            if done(self.record.status) {
                return Ok(());
            }

            let cancelled = tokio::select! {
                _ = cancel.cancelled() => true,
                _ = self.clock.sleep(self.config.poll_interval) => false,
            };
            if cancelled {
                return Err(self.cancelled(stage));
            }
        }
    }

    fn cancelled(&mut self, stage: TrackerStage) -> TrackerError {
        self.abandon("cancelled");
        TrackerError::Cancelled { stage }
    }

    /// Fetches the inclusion proof of the `log_index`-th priority operation
    /// log of the operation's transaction. The proof is requested at that
    /// log's position among all logs of the receipt.
    pub async fn confirm(&mut self, log_index: u64) -> Result<ConfirmationProof, TrackerError> {
        if self.record.l2_tx_hash.is_none() {
            return Err(TrackerError::NotLocated);
        }
        let l1_tx = self.record.l1_tx;
        let network = TrackerError::network;

        let receipt = self
            .l2
            .transaction_receipt(l1_tx)
            .await
            .map_err(network(TrackerStage::Confirm))?
            .filter(|receipt| receipt.block_number.is_some())
            .ok_or(TrackerError::LogNotMined { l1_tx })?;

        let (position, _) = priority_op_log(&receipt.l2_to_l1_logs, log_index)?;
        let tx_hash = receipt.transaction_hash;
        let log_index = position;
        let unavailable = TrackerError::ProofUnavailable { tx_hash, log_index };
        let proof = self
            .l2
            .l2_to_l1_log_proof(tx_hash, log_index)
            .await
            .map_err(network(TrackerStage::Confirm))?
            .filter(|proof| !proof.proof.is_empty())
            .ok_or(unavailable)?;
        let l1_batch_number = receipt
            .l1_batch_number
            .ok_or(TrackerError::ProofUnavailable { tx_hash, log_index })?;

        let confirmation = ConfirmationProof {
            l1_batch_number: l1_batch_number.saturating_to(),
            l2_message_index: proof.id,
            l2_tx_number_in_block: receipt
                .l1_batch_tx_index
                .map_or(0, |index| index.saturating_to()),
            proof: proof.proof,
            root: proof.root,
        };
        info!(
            %tx_hash,
            l1_batch_number = confirmation.l1_batch_number,
            l2_message_index = confirmation.l2_message_index,
            "Fetched inclusion proof"
        );
        self.record.proof = Some(confirmation.clone());
        Ok(confirmation)
    }

    /// Runs the whole lifecycle and releases the finalized record.
    #[instrument(skip_all, fields(l1_tx = %self.record.l1_tx))]
    pub async fn track(
        mut self,
        cancel: CancellationToken,
    ) -> Result<PriorityOpRecord, TrackerError> {
        self.locate().await?;
        self.wait_committed(&cancel).await?;
        self.wait_finalized(&cancel).await?;
        self.confirm(self.record.log_index).await?;
        Ok(self.record)
    }
}

/// The `index`-th log sent by the bootloader, with its position in `logs`.
fn priority_op_log(
    logs: &[L2ToL1LogEntry],
    index: u64,
) -> Result<(u64, &L2ToL1LogEntry), TrackerError> {
    let eligible: Vec<_> = logs
        .iter()
        .enumerate()
        .filter(|(_, log)| log.sender == BOOTLOADER_FORMAL_ADDRESS)
        .collect();
    usize::try_from(index)
        .ok()
        .and_then(|i| eligible.get(i))
        .map(|&(position, log)| (position as u64, log))
        .ok_or(TrackerError::NoMatchingLog {
            index,
            eligible: eligible.len(),
        })
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
    };

    use alloy_primitives::{b256, Bytes, U64};
    use async_trait::async_trait;

    use super::*;
    use crate::{
        error::RpcError,
        types::{L2ToL1LogEntry, L2ToL1LogProof, TransactionReceipt},
    };

    const L1_TX: B256 = b256!("1111111111111111111111111111111111111111111111111111111111111111");
    const L2_TX: B256 = b256!("2222222222222222222222222222222222222222222222222222222222222222");
    const SECOND_L2_TX: B256 =
        b256!("3333333333333333333333333333333333333333333333333333333333333333");

    fn log(sender: Address, key: B256) -> L2ToL1LogEntry {
        L2ToL1LogEntry {
            block_number: Some(U64::from(10)),
            l1_batch_number: Some(U64::from(4)),
            transaction_hash: L1_TX,
            transaction_index: U64::from(0),
            tx_index_in_l1_batch: Some(U64::from(3)),
            shard_id: U64::ZERO,
            is_service: true,
            sender,
            key,
            value: B256::with_last_byte(1),
            log_index: U64::ZERO,
        }
    }

    fn receipt() -> TransactionReceipt {
        TransactionReceipt {
            transaction_hash: L1_TX,
            block_number: Some(U64::from(10)),
            l1_batch_number: Some(U64::from(4)),
            l1_batch_tx_index: Some(U64::from(3)),
            l2_to_l1_logs: vec![
                log(Address::with_last_byte(0x42), B256::ZERO),
                log(BOOTLOADER_FORMAL_ADDRESS, L2_TX),
                log(BOOTLOADER_FORMAL_ADDRESS, SECOND_L2_TX),
            ],
        }
    }

    #[derive(Default)]
    struct MockL2 {
        receipt: Option<TransactionReceipt>,
        statuses: Mutex<VecDeque<PriorityOpStatus>>,
        proof: Option<L2ToL1LogProof>,
        fail_status: bool,
        status_calls: AtomicUsize,
        proof_requests: Mutex<Vec<u64>>,
    }

    impl MockL2 {
        fn with_statuses(statuses: impl IntoIterator<Item = PriorityOpStatus>) -> Self {
            Self {
                receipt: Some(receipt()),
                statuses: Mutex::new(statuses.into_iter().collect()),
                proof: Some(L2ToL1LogProof {
                    proof: vec![B256::with_last_byte(7), B256::with_last_byte(8)],
                    id: 5,
                    root: B256::with_last_byte(9),
                }),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl L2Rpc for MockL2 {
        async fn send_raw_transaction(&self, _raw: Bytes) -> Result<B256, RpcError> {
            Err(RpcError::invalid_response("eth_sendRawTransaction", "unsupported"))
        }

        async fn transaction_receipt(
            &self,
            _tx_hash: B256,
        ) -> Result<Option<TransactionReceipt>, RpcError> {
            Ok(self.receipt.clone())
        }

        async fn priority_op_status(
            &self,
            _l2_tx_hash: B256,
        ) -> Result<PriorityOpStatus, RpcError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_status {
                return Err(RpcError::invalid_response("zks_getTransactionDetails", "boom"));
            }
            let mut statuses = self.statuses.lock().unwrap();
            Ok(statuses.pop_front().unwrap_or(PriorityOpStatus::NotFound))
        }

        async fn l2_to_l1_log_proof(
            &self,
            _tx_hash: B256,
            log_index: u64,
        ) -> Result<Option<L2ToL1LogProof>, RpcError> {
            self.proof_requests.lock().unwrap().push(log_index);
            Ok(self.proof.clone())
        }
    }

    /// Counts sleeps instead of waiting. Cancels `token` once `cancel_after`
    /// sleeps happened.
    #[derive(Default)]
    struct FakeClock {
        sleeps: Arc<AtomicUsize>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    #[async_trait]
    impl Clock for FakeClock {
        async fn sleep(&self, _duration: Duration) {
            let sleeps = self.sleeps.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((limit, token)) = &self.cancel_after {
                if sleeps >= *limit {
                    token.cancel();
                }
            }
            tokio::task::yield_now().await;
        }
    }

    /// Never wakes up on its own.
    struct StuckClock;

    #[async_trait]
    impl Clock for StuckClock {
        async fn sleep(&self, _duration: Duration) {
            std::future::pending::<()>().await;
        }
    }

    fn tracker(l2: MockL2) -> PriorityOpTracker<Arc<MockL2>, FakeClock> {
        PriorityOpTracker::new(Arc::new(l2), L1_TX, TrackerConfig::default())
            .with_clock(FakeClock::default())
    }

    #[tokio::test]
    async fn test_status_never_regresses() -> eyre::Result<()> {
        use PriorityOpStatus::*;

        let l2 = Arc::new(MockL2::with_statuses([
            NotFound, NotFound, Committed, NotFound, Finalized,
        ]));
        let sleeps = Arc::new(AtomicUsize::new(0));
        let mut tracker = PriorityOpTracker::new(l2.clone(), L1_TX, TrackerConfig::default())
            .with_clock(FakeClock {
                sleeps: sleeps.clone(),
                cancel_after: None,
            });
        let cancel = CancellationToken::new();

        tracker.locate().await?;
        assert_eq!(tracker.record().state, TrackerState::Found);

        tracker.wait_committed(&cancel).await?;
        assert_eq!(tracker.record().status, Committed);
        assert_eq!(tracker.record().state, TrackerState::Committed);

        tracker.wait_finalized(&cancel).await?;
        assert_eq!(tracker.record().status, Finalized);
        assert_eq!(tracker.record().state, TrackerState::Finalized);
        assert_eq!(l2.status_calls.load(Ordering::SeqCst), 5);
        assert_eq!(sleeps.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[test]
    fn test_observe_ignores_stale_statuses() -> eyre::Result<()> {
        let mut tracker = tracker(MockL2::default());
        assert!(matches!(
            tracker.observe(PriorityOpStatus::Committed),
            Err(TrackerError::NotLocated)
        ));

        tracker.record.l2_tx_hash = Some(L2_TX);
        tracker.observe(PriorityOpStatus::Committed)?;
        tracker.observe(PriorityOpStatus::NotFound)?;
        tracker.observe(PriorityOpStatus::Processing)?;
        assert_eq!(tracker.record().status, PriorityOpStatus::Committed);
        assert_eq!(tracker.record().state, TrackerState::Committed);

        assert!(matches!(
            tracker.observe(PriorityOpStatus::Failed),
            Err(TrackerError::PriorityOpFailed { l2_tx_hash }) if l2_tx_hash == L2_TX
        ));
        assert_eq!(tracker.record().state, TrackerState::Abandoned);
        Ok(())
    }

    #[test]
    fn test_finalized_is_terminal() -> eyre::Result<()> {
        let mut tracker = tracker(MockL2::default());
        tracker.record.l2_tx_hash = Some(L2_TX);
        tracker.observe(PriorityOpStatus::Finalized)?;

        tracker.observe(PriorityOpStatus::Failed)?;
        tracker.observe(PriorityOpStatus::Committed)?;
        assert_eq!(tracker.record().status, PriorityOpStatus::Finalized);
        assert_eq!(tracker.record().state, TrackerState::Finalized);
        Ok(())
    }

    #[tokio::test]
    async fn test_locate_selects_log_by_index() -> eyre::Result<()> {
        let mut first = tracker(MockL2::with_statuses([]));
        assert_eq!(first.locate().await?, L2_TX);
        let leaf = log(BOOTLOADER_FORMAL_ADDRESS, L2_TX).leaf();
        assert_eq!(first.record().l2_message_hash, Some(leaf.hash()));

        let mut second = tracker(MockL2::with_statuses([])).with_log_index(1);
        assert_eq!(second.locate().await?, SECOND_L2_TX);

        let mut missing = tracker(MockL2::with_statuses([])).with_log_index(2);
        assert!(matches!(
            missing.locate().await,
            Err(TrackerError::NoMatchingLog { index: 2, eligible: 2 })
        ));
        assert_eq!(missing.record().state, TrackerState::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_receipt_abandons() {
        let mut tracker = tracker(MockL2::default());
        assert!(matches!(
            tracker.locate().await,
            Err(TrackerError::ReceiptNotFound { l1_tx }) if l1_tx == L1_TX
        ));
        assert_eq!(tracker.record().state, TrackerState::Abandoned);
    }

    #[tokio::test]
    async fn test_cancel_between_polls() -> eyre::Result<()> {
        let l2 = Arc::new(MockL2::with_statuses([]));
        let cancel = CancellationToken::new();
        let sleeps = Arc::new(AtomicUsize::new(0));
        let mut tracker = PriorityOpTracker::new(l2.clone(), L1_TX, TrackerConfig::default())
            .with_clock(FakeClock {
                sleeps: sleeps.clone(),
                cancel_after: Some((3, cancel.clone())),
            });

        tracker.locate().await?;
        assert!(matches!(
            tracker.wait_committed(&cancel).await,
            Err(TrackerError::Cancelled {
                stage: TrackerStage::Commit
            })
        ));
        assert_eq!(tracker.record().state, TrackerState::Abandoned);
        // no call after the cancelling sleep
        assert_eq!(l2.status_calls.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_interrupts_delay() -> eyre::Result<()> {
        let cancel = CancellationToken::new();
        let mut tracker = PriorityOpTracker::new(
            Arc::new(MockL2::with_statuses([])),
            L1_TX,
            TrackerConfig::default(),
        )
        .with_clock(StuckClock);
        tracker.locate().await?;

        let token = cancel.clone();
        tokio::spawn(async move { token.cancel() });
        assert!(matches!(
            tracker.wait_committed(&cancel).await,
            Err(TrackerError::Cancelled { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_network_error_is_not_retried() -> eyre::Result<()> {
        let l2 = Arc::new(MockL2 {
            fail_status: true,
            ..MockL2::with_statuses([])
        });
        let mut tracker = PriorityOpTracker::new(l2.clone(), L1_TX, TrackerConfig::default())
            .with_clock(FakeClock::default());
        tracker.locate().await?;

        assert!(matches!(
            tracker.wait_committed(&CancellationToken::new()).await,
            Err(TrackerError::Network {
                stage: TrackerStage::Commit,
                ..
            })
        ));
        assert_eq!(l2.status_calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm() -> eyre::Result<()> {
        let mut unlocated = tracker(MockL2::with_statuses([]));
        assert!(matches!(unlocated.confirm(0).await, Err(TrackerError::NotLocated)));

        let l2 = Arc::new(MockL2::with_statuses([]));
        let mut tracker = PriorityOpTracker::new(l2.clone(), L1_TX, TrackerConfig::default())
            .with_clock(FakeClock::default());
        tracker.locate().await?;
        let proof = tracker.confirm(0).await?;
        assert_eq!(proof.l1_batch_number, 4);
        assert_eq!(proof.l2_message_index, 5);
        assert_eq!(proof.l2_tx_number_in_block, 3);
        assert_eq!(proof.proof.len(), 2);
        assert_eq!(tracker.record().proof.as_ref(), Some(&proof));
        // the foreign log at position 0 is skipped
        assert_eq!(*l2.proof_requests.lock().unwrap(), vec![1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_uses_receipt_position() -> eyre::Result<()> {
        let mut interleaved = receipt();
        interleaved.l2_to_l1_logs = vec![
            log(BOOTLOADER_FORMAL_ADDRESS, L2_TX),
            log(Address::with_last_byte(0x42), B256::ZERO),
            log(Address::with_last_byte(0x43), B256::ZERO),
            log(BOOTLOADER_FORMAL_ADDRESS, SECOND_L2_TX),
        ];
        let l2 = Arc::new(MockL2 {
            receipt: Some(interleaved),
            ..MockL2::with_statuses([])
        });
        let mut tracker = PriorityOpTracker::new(l2.clone(), L1_TX, TrackerConfig::default())
            .with_clock(FakeClock::default())
            .with_log_index(1);

        assert_eq!(tracker.locate().await?, SECOND_L2_TX);
        tracker.confirm(1).await?;
        assert_eq!(*l2.proof_requests.lock().unwrap(), vec![3]);

        assert!(matches!(
            tracker.confirm(2).await,
            Err(TrackerError::NoMatchingLog { index: 2, eligible: 2 })
        ));
        assert_eq!(l2.proof_requests.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_errors() -> eyre::Result<()> {
        let mut no_proof = tracker(MockL2 {
            proof: None,
            ..MockL2::with_statuses([])
        });
        no_proof.locate().await?;
        assert!(matches!(
            no_proof.confirm(1).await,
            Err(TrackerError::ProofUnavailable { tx_hash, log_index: 2 }) if tx_hash == L1_TX
        ));

        let mut pending = receipt();
        pending.block_number = None;
        let mut not_mined = tracker(MockL2 {
            receipt: Some(pending),
            ..MockL2::with_statuses([])
        });
        not_mined.locate().await?;
        assert!(matches!(
            not_mined.confirm(0).await,
            Err(TrackerError::LogNotMined { l1_tx }) if l1_tx == L1_TX
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_track_to_finality() -> eyre::Result<()> {
        use PriorityOpStatus::*;

        let record = tracker(MockL2::with_statuses([NotFound, Processing, Committed, Finalized]))
            .with_destination(Address::with_last_byte(1))
            .track(CancellationToken::new())
            .await?;
        assert_eq!(record.state, TrackerState::Finalized);
        assert_eq!(record.status, Finalized);
        assert_eq!(record.l2_tx_hash, Some(L2_TX));
        assert!(record.proof.is_some());

        let failed = tracker(MockL2::with_statuses([Processing, Failed]))
            .track(CancellationToken::new())
            .await;
        assert!(matches!(failed, Err(TrackerError::PriorityOpFailed { .. })));
        Ok(())
    }
}
