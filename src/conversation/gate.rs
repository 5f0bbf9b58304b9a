//! One-request-at-a-time gate for a conversation.
//!
//! A transcript may have at most one outstanding backend call. Every
//! user-initiated operation takes the gate with `try_acquire` and holds the
//! guard until it has committed its transcript change; a second caller is
//! turned away instead of queued. Dropping the guard reopens the gate on every
//! path, including unwinding.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// What the conversation is busy with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Reading an uploaded file.
    Ingestion,
    /// Waiting for the structured card answer.
    CardGeneration,
    /// Reading a follow-up answer stream.
    FollowUpStream,
    /// Revealing the next card.
    Reveal,
    /// Building the appointment summary.
    Summary,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ingestion => write!(f, "Document ingestion"),
            Self::CardGeneration => write!(f, "Card generation"),
            Self::FollowUpStream => write!(f, "Follow-up stream"),
            Self::Reveal => write!(f, "Card reveal"),
            Self::Summary => write!(f, "Appointment summary"),
        }
    }
}

/// Snapshot of the running operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveOperation {
    pub kind: OperationKind,
    pub started_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════
// RequestGate
// ═══════════════════════════════════════════════════════════

pub struct RequestGate {
    lock: Mutex<()>,
    current_op: Mutex<Option<ActiveOperation>>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            current_op: Mutex::new(None),
        }
    }

    /// Take the gate without blocking. `None` while another operation holds it.
    pub fn try_acquire(&self, kind: OperationKind) -> Option<GateGuard<'_>> {
        // The lock guards no data, so poisoning is ignored.
        let guard = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return None,
        };
        self.set_current_op(kind);
        Some(GateGuard {
            _guard: guard,
            gate: self,
        })
    }

    /// `None` when idle.
    pub fn current_operation(&self) -> Option<ActiveOperation> {
        self.current_op.lock().ok()?.clone()
    }

    pub fn is_busy(&self) -> bool {
        matches!(
            self.lock.try_lock(),
            Err(std::sync::TryLockError::WouldBlock)
        )
    }

    // ── Internal ────────────────────────────────────────────

    fn set_current_op(&self, kind: OperationKind) {
        if let Ok(mut current) = self.current_op.lock() {
            *current = Some(ActiveOperation {
                kind,
                started_at: Utc::now(),
            });
        }
    }

    fn clear_current_op(&self) {
        if let Ok(mut current) = self.current_op.lock() {
            *current = None;
        }
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// GateGuard
// ═══════════════════════════════════════════════════════════

/// Exclusive hold on the gate. Dropping it clears the current operation and reopens the gate.
pub struct GateGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    gate: &'a RequestGate,
}

impl GateGuard<'_> {
    /// Record that the held operation moved on to its next phase.
    pub fn transition(&self, kind: OperationKind) {
        self.gate.set_current_op(kind);
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.clear_current_op();
    }
}
