//! Blueprint compile queues
//!
//! Two ordered, duplicate-free queues: blueprints generating components and
//! everything else. Components compile first because actors embed their
//! components by value and need the final component layout.

use parking_lot::Mutex;
use std::fmt;
use usharp_core::BlueprintRef;

/// Which queue a blueprint belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueKind {
    /// Blueprints whose class derives from the component base class
    Components,
    /// Every other blueprint
    Classes,
}

impl QueueKind {
    /// Drain order
    pub const ORDER: [QueueKind; 2] = [QueueKind::Components, QueueKind::Classes];

    pub fn other(self) -> QueueKind {
        match self {
            QueueKind::Components => QueueKind::Classes,
            QueueKind::Classes => QueueKind::Components,
        }
    }
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueKind::Components => write!(f, "components"),
            QueueKind::Classes => write!(f, "classes"),
        }
    }
}

/// Insertion-ordered set of blueprints awaiting compilation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileQueue {
    entries: Vec<BlueprintRef>,
}

impl CompileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `blueprint` unless already queued. Returns whether it was added.
    pub fn push(&mut self, blueprint: BlueprintRef) -> bool {
        if self.entries.contains(&blueprint) {
            return false;
        }
        self.entries.push(blueprint);
        true
    }

    /// Remove `blueprint` if queued. Returns whether it was present.
    pub fn remove(&mut self, blueprint: BlueprintRef) -> bool {
        let before = self.entries.len();
        self.entries.retain(|queued| *queued != blueprint);
        self.entries.len() != before
    }

    pub fn contains(&self, blueprint: BlueprintRef) -> bool {
        self.entries.contains(&blueprint)
    }

    /// Empty the queue, returning its entries in insertion order
    pub fn take(&mut self) -> Vec<BlueprintRef> {
        std::mem::take(&mut self.entries)
    }

    pub fn as_slice(&self) -> &[BlueprintRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The component and class queues, shared by the synchronizer and scheduler.
///
/// Each operation locks briefly; no lock is held while compiling, so a
/// compile that generates new types can queue them.
#[derive(Debug, Default)]
pub struct CompileQueues {
    components: Mutex<CompileQueue>,
    classes: Mutex<CompileQueue>,
}

impl CompileQueues {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, kind: QueueKind) -> &Mutex<CompileQueue> {
        match kind {
            QueueKind::Components => &self.components,
            QueueKind::Classes => &self.classes,
        }
    }

    /// Queue `blueprint` in `kind`, keeping it out of the other queue.
    ///
    /// A blueprint already waiting in the other queue (its class was
    /// reparented across the component boundary) moves to the end of `kind`.
    /// Returns whether `kind` changed.
    pub fn enqueue(&self, kind: QueueKind, blueprint: BlueprintRef) -> bool {
        if self.queue(kind.other()).lock().remove(blueprint) {
            log::debug!(
                "Blueprint {:?} moved from the {} queue to the {} queue",
                blueprint,
                kind.other(),
                kind
            );
        }
        self.queue(kind).lock().push(blueprint)
    }

    /// Empty one queue, returning its entries in insertion order
    pub fn take(&self, kind: QueueKind) -> Vec<BlueprintRef> {
        self.queue(kind).lock().take()
    }

    /// Copy of one queue's entries
    pub fn snapshot(&self, kind: QueueKind) -> Vec<BlueprintRef> {
        self.queue(kind).lock().as_slice().to_vec()
    }

    pub fn contains(&self, kind: QueueKind, blueprint: BlueprintRef) -> bool {
        self.queue(kind).lock().contains(blueprint)
    }

    /// Queue holding `blueprint`, if any
    pub fn find(&self, blueprint: BlueprintRef) -> Option<QueueKind> {
        QueueKind::ORDER
            .into_iter()
            .find(|kind| self.contains(*kind, blueprint))
    }

    pub fn len(&self, kind: QueueKind) -> usize {
        self.queue(kind).lock().len()
    }

    /// Total queued across both queues
    pub fn total_len(&self) -> usize {
        self.len(QueueKind::Components) + self.len(QueueKind::Classes)
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(index: u32) -> BlueprintRef {
        BlueprintRef::new(index, 0)
    }

    #[test]
    fn test_push_is_idempotent_and_ordered() {
        let mut queue = CompileQueue::new();
        assert!(queue.push(bp(2)));
        assert!(queue.push(bp(1)));
        assert!(!queue.push(bp(2)));

        assert_eq!(queue.as_slice(), &[bp(2), bp(1)]);
        assert_eq!(queue.take(), vec![bp(2), bp(1)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_reclassified_blueprint_moves_queues() {
        let queues = CompileQueues::new();
        queues.enqueue(QueueKind::Classes, bp(1));
        queues.enqueue(QueueKind::Classes, bp(2));

        assert!(queues.enqueue(QueueKind::Components, bp(1)));
        assert_eq!(queues.snapshot(QueueKind::Classes), vec![bp(2)]);
        assert_eq!(queues.snapshot(QueueKind::Components), vec![bp(1)]);
        assert_eq!(queues.find(bp(1)), Some(QueueKind::Components));
        assert_eq!(queues.total_len(), 2);
    }

    #[test]
    fn test_take_empties_only_one_queue() {
        let queues = CompileQueues::new();
        queues.enqueue(QueueKind::Components, bp(1));
        queues.enqueue(QueueKind::Classes, bp(2));

        assert_eq!(queues.take(QueueKind::Components), vec![bp(1)]);
        assert_eq!(queues.len(QueueKind::Components), 0);
        assert_eq!(queues.len(QueueKind::Classes), 1);
        assert!(!queues.is_empty());
    }
}
