use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, unbounded};
use strata_world::ModBatch;

/// Producer half of the modification queue. Generation sends whole batches
/// so a structure is always applied together and in order.
#[derive(Clone)]
pub struct ModSender {
    tx: Sender<ModBatch>,
    pending: Arc<AtomicUsize>,
}

/// Consumer half; batches come out in the order they were sent.
#[derive(Clone)]
pub struct ModReceiver {
    rx: Receiver<ModBatch>,
    pending: Arc<AtomicUsize>,
}

pub fn mod_channel() -> (ModSender, ModReceiver) {
    let (tx, rx) = unbounded::<ModBatch>();
    let pending = Arc::new(AtomicUsize::new(0));
    (
        ModSender {
            tx,
            pending: pending.clone(),
        },
        ModReceiver { rx, pending },
    )
}

impl ModSender {
    pub fn send(&self, batch: ModBatch) {
        if batch.is_empty() {
            return;
        }
        self.pending.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(batch).is_err() {
            self.pending.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }
}

impl ModReceiver {
    pub fn try_next(&self) -> Option<ModBatch> {
        let batch = self.rx.try_recv().ok()?;
        self.pending.fetch_sub(1, Ordering::Relaxed);
        Some(batch)
    }

    /// Everything queued right now; batches sent meanwhile wait for the next call.
    pub fn drain(&self) -> Vec<ModBatch> {
        let mut out = Vec::new();
        while let Some(batch) = self.try_next() {
            out.push(batch);
        }
        out
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
