//! Save progress notifications.
//!
//! The orchestrator publishes a progress event at each stage transition
//! and exactly one terminal event per save attempt. Consumers subscribe
//! through a broadcast channel; a UI that falls behind loses old events
//! rather than blocking the pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::save::{SaveOutcome, SaveStage};

/// An event emitted by the save pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SaveEvent {
    /// The pipeline entered a stage.
    StageEntered { stage: SaveStage },
    /// Terminal: the save attempt finished.
    Completed { outcome: SaveOutcome },
}

/// Event bus for broadcasting save events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SaveEvent>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: SaveEvent) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::SaveFailure;

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(SaveEvent::StageEntered {
            stage: SaveStage::CollectingStrokes,
        });

        let event = rx.try_recv().expect("receive event");
        assert!(matches!(
            event,
            SaveEvent::StageEntered {
                stage: SaveStage::CollectingStrokes
            }
        ));
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_event_bus_without_subscribers() {
        let bus = EventBus::new(16);
        // No receiver; emit must not error or panic.
        bus.emit(SaveEvent::Completed {
            outcome: SaveOutcome::Failed {
                reason: SaveFailure::NoStrokes,
            },
        });
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_event_json_roundtrip() {
        let event = SaveEvent::Completed {
            outcome: SaveOutcome::Failed {
                reason: SaveFailure::LocationClaimed,
            },
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let parsed: SaveEvent = serde_json::from_str(&json).expect("parse");
        assert!(matches!(
            parsed,
            SaveEvent::Completed {
                outcome: SaveOutcome::Failed {
                    reason: SaveFailure::LocationClaimed
                }
            }
        ));
    }
}
