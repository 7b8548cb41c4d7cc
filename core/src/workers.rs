//! Worker directory and selection
//!
//! The directory is an external collaborator: it reports which workers are
//! eligible and carries key shares to them. Delivery is fire-and-forget from
//! the registry's point of view; acknowledgement and retry belong to the
//! transport behind the directory.

use std::collections::HashSet;
use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::crypto::KeyShare;
use crate::error::{RegistryError, Result};
use crate::models::{DataId, WorkerId};

/// A key share addressed to one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareDelivery {
    /// Recipient
    pub worker_id: WorkerId,

    /// Reservation the share belongs to
    pub data_id: DataId,

    /// The share itself
    pub share: KeyShare,
}

/// Source of eligible workers and sink for their key shares
#[cfg_attr(test, mockall::automock)]
pub trait WorkerDirectory: Send + Sync {
    /// Workers currently eligible to hold shares, in a stable order
    fn eligible_workers(&self) -> Vec<WorkerId>;

    /// Hand a share to the transport. Must not block on acknowledgement.
    fn dispatch_share(&self, delivery: ShareDelivery) -> Result<()>;
}

/// Round-robin selection of `n` distinct workers.
///
/// Duplicates in `eligible` are ignored. Returns the chosen workers and the
/// cursor to use for the next selection.
pub fn select_workers(eligible: &[WorkerId], n: u32, cursor: usize) -> Result<(Vec<WorkerId>, usize)> {
    let mut seen = HashSet::with_capacity(eligible.len());
    let distinct: Vec<WorkerId> = eligible.iter().copied().filter(|w| seen.insert(*w)).collect();

    if distinct.len() < n as usize {
        return Err(RegistryError::WorkerUnavailable { required: n, available: distinct.len() });
    }

    if n == 0 {
        return Ok((Vec::new(), cursor));
    }

    let start = cursor % distinct.len();
    let selected = (0..n as usize)
        .map(|offset| distinct[(start + offset) % distinct.len()])
        .collect();

    Ok((selected, (start + n as usize) % distinct.len()))
}

/// Fixed worker set whose deliveries are queued on an unbounded channel
#[derive(Debug)]
pub struct ChannelWorkerDirectory {
    workers: Vec<WorkerId>,
    sender: UnboundedSender<ShareDelivery>,
}

impl ChannelWorkerDirectory {
    /// Create a directory and the receiving end of its delivery queue
    pub fn new(workers: Vec<WorkerId>) -> (Self, UnboundedReceiver<ShareDelivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (ChannelWorkerDirectory { workers, sender }, receiver)
    }
}

impl WorkerDirectory for ChannelWorkerDirectory {
    fn eligible_workers(&self) -> Vec<WorkerId> {
        self.workers.clone()
    }

    fn dispatch_share(&self, delivery: ShareDelivery) -> Result<()> {
        debug!("Queueing share {} of {} for {}", delivery.share.index, delivery.data_id, delivery.worker_id);
        self.sender
            .send(delivery)
            .map_err(|e| RegistryError::StateError(format!("share queue closed: {}", e)))
    }
}
