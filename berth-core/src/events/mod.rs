//! Event bus for berth system events.
//!
//! Network and service lifecycle changes are published here so that
//! subscribers (logging, API streams) can follow them.
//!
//! ```ignore
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe(vec!["network.*".to_string()]);
//!
//! bus.publish(Event::new(EventType::NetworkCreated, "3f2a...", "front"));
//!
//! while let Some(event) = rx.recv().await {
//!     println!("{} {}", event.event_type, event.resource_id);
//! }
//! ```

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tracing::debug;

/// Maximum number of events buffered in the broadcast channel.
const EVENT_BUFFER_SIZE: usize = 256;

/// Event types for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    NetworkCreated,
    NetworkDestroyed,
    ServiceCreated,
    ServiceUpdated,
}

impl EventType {
    /// Event type string (e.g., "network.create").
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NetworkCreated => "network.create",
            EventType::NetworkDestroyed => "network.destroy",
            EventType::ServiceCreated => "service.create",
            EventType::ServiceUpdated => "service.update",
        }
    }

    /// Resource type (e.g., "network").
    pub fn resource_type(&self) -> &'static str {
        self.as_str().split('.').next().unwrap_or_default()
    }

    /// Action (e.g., "create").
    pub fn action(&self) -> &'static str {
        self.as_str().split('.').nth(1).unwrap_or_default()
    }
}

/// A system event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub event_type: String,
    pub resource_type: String,
    pub resource_id: String,
    pub action: String,
    /// Attributes such as the resource name or driver
    pub attributes: HashMap<String, String>,
}

impl Event {
    /// Create an event carrying the resource name.
    pub fn new(event_type: EventType, resource_id: &str, name: &str) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), name.to_string());

        Self {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as i64,
            event_type: event_type.as_str().to_string(),
            resource_type: event_type.resource_type().to_string(),
            resource_id: resource_id.to_string(),
            action: event_type.action().to_string(),
            attributes,
        }
    }

    /// Add an attribute to the event.
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }
}

/// Event bus for publishing and subscribing to system events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: Event) {
        debug!(event_type = %event.event_type, resource_id = %event.resource_id, "Publishing event");
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribe to events matching any of `filters`.
    ///
    /// A filter is an exact type (`"network.create"`) or a resource wildcard
    /// (`"network.*"`). An empty list receives everything.
    pub fn subscribe(&self, filters: Vec<String>) -> EventSubscriber {
        EventSubscriber { receiver: self.sender.subscribe(), filters }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event subscriber with optional filtering.
pub struct EventSubscriber {
    receiver: broadcast::Receiver<Event>,
    filters: Vec<String>,
}

impl EventSubscriber {
    /// Receive the next matching event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    debug!("Event subscriber lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, event: &Event) -> bool {
        self.filters.is_empty()
            || self.filters.iter().any(|filter| match filter.strip_suffix(".*") {
                Some(resource) => event.resource_type == resource,
                None => *filter == event.event_type,
            })
    }
}
