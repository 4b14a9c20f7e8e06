// src/store.rs
//
// The work-order collection. One shared value, every mutation funneled
// through a named operation so the read paths only ever see snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::work_order::{OrderId, WorkOrder};

/// Monotonic id source. Ids are unique for the lifetime of the process and
/// never reused, even after rows are removed or the collection is replaced.
#[derive(Debug, Default)]
pub struct IdSequence(AtomicU64);

impl IdSequence {
    pub fn next(&self) -> OrderId {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// How a candidate batch merges into the existing collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// New rows land in front. Used by the bulk paste path.
    Prepend,
    /// New rows land at the back. Used by the manual add path.
    Append,
    /// The batch replaces the whole collection. Used by spreadsheet imports.
    Replace,
}

#[derive(Clone, Default)]
pub struct WorkOrderStore {
    orders: Arc<Mutex<Vec<WorkOrder>>>,
    ids: Arc<IdSequence>,
}

impl WorkOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &IdSequence {
        &self.ids
    }

    /// Append a single composed order.
    pub fn add(&self, order: WorkOrder) {
        info!("Added work order {} ({})", order.id, order.activity);
        self.merge_batch(vec![order], MergeMode::Append);
    }

    /// Merge a candidate batch according to the ingestion source's mode.
    pub fn merge_batch(&self, batch: Vec<WorkOrder>, mode: MergeMode) {
        let mut orders = self.orders.lock().unwrap();
        info!(
            "Merging batch of {} into {} existing rows ({:?})",
            batch.len(),
            orders.len(),
            mode
        );
        match mode {
            MergeMode::Replace => *orders = batch,
            MergeMode::Append => orders.extend(batch),
            MergeMode::Prepend => {
                let mut merged = batch;
                merged.append(&mut orders);
                *orders = merged;
            }
        }
    }

    /// Remove one order. Returns false when the id is unknown.
    pub fn remove(&self, id: OrderId) -> bool {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|order| order.id != id);
        let removed = orders.len() < before;
        if removed {
            info!("Removed work order {}", id);
        }
        removed
    }

    /// Empty the collection, returning how many rows were dropped.
    pub fn clear(&self) -> usize {
        let mut orders = self.orders.lock().unwrap();
        let removed = orders.len();
        orders.clear();
        info!("Cleared {} work orders", removed);
        removed
    }

    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    /// Point-in-time copy for the read paths. Aggregation always works on a
    /// snapshot, never on the live guard.
    pub fn snapshot(&self) -> Vec<WorkOrder> {
        self.orders.lock().unwrap().clone()
    }
}
