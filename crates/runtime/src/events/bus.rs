//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use survival_core::EffectTransition;

use super::types::{ProgressionEvent, SessionEvent, VitalsEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Stat depletion and restoration
    Vitals,
    /// Buff and debuff transitions
    Effects,
    /// Level-ups, ability unlocks and admin changes
    Progression,
    /// Session lifecycle and saves
    Session,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Vitals, Topic::Effects, Topic::Progression, Topic::Session];

    const fn index(self) -> usize {
        match self {
            Topic::Vitals => 0,
            Topic::Effects => 1,
            Topic::Progression => 2,
            Topic::Session => 3,
        }
    }
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Vitals(VitalsEvent),
    Effect(EffectTransition),
    Progression(ProgressionEvent),
    Session(SessionEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Vitals(_) => Topic::Vitals,
            Event::Effect(_) => Topic::Effects,
            Event::Progression(_) => Topic::Progression,
            Event::Session(_) => Topic::Session,
        }
    }
}

/// Topic-based event bus
///
/// One broadcast channel per topic, created up front, so consumers only
/// receive the events they subscribed to. Publishing is best-effort: events
/// with no subscriber are dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<[broadcast::Sender<Event>; 4]>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channel = || broadcast::channel(capacity.max(1)).0;
        Self {
            channels: Arc::new([channel(), channel(), channel(), channel()]),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();
        if self.channels[topic.index()].send(event).is_err() {
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels[topic.index()].subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels[topic.index()].receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl From<VitalsEvent> for Event {
    fn from(event: VitalsEvent) -> Self {
        Event::Vitals(event)
    }
}

impl From<EffectTransition> for Event {
    fn from(transition: EffectTransition) -> Self {
        Event::Effect(transition)
    }
}

impl From<ProgressionEvent> for Event {
    fn from(event: ProgressionEvent) -> Self {
        Event::Progression(event)
    }
}

impl From<SessionEvent> for Event {
    fn from(event: SessionEvent) -> Self {
        Event::Session(event)
    }
}
