//! Payload sum type for context entries.
//!
//! Each context category carries its own payload shape as a closed tagged
//! variant, so adding a category forces every dispatch site to be revisited
//! by the compiler. The buffer never interprets payload contents; it only
//! serializes them for size estimation and rendering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::entry::Category;

/// Content of a context entry, one variant per category.
///
/// Map-shaped variants hold arbitrary JSON key/value readings; the buffer
/// treats them as opaque.
///
/// # Examples
///
/// ```
/// use cwm_rs::core::Payload;
///
/// let payload = Payload::Conversation {
///     role: "operator".to_string(),
///     message: "hold position".to_string(),
/// };
/// assert_eq!(payload.category().label(), "conversation");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// Sensor readings (GPS, battery, altitude, ...), usually compressed.
    Sensor(Map<String, Value>),

    /// A named event with optional detail fields.
    Event {
        /// Event name, e.g. `obstacle_detected`.
        name: String,
        /// Event detail fields.
        data: Map<String, Value>,
    },

    /// Mission status update.
    Mission(Map<String, Value>),

    /// One conversation turn.
    Conversation {
        /// Speaker role, e.g. `operator` or `assistant`.
        role: String,
        /// Message text.
        message: String,
    },

    /// Platform state snapshot.
    System(Map<String, Value>),

    /// Environmental data (weather, terrain, airspace).
    Environmental(Map<String, Value>),
}

impl Payload {
    /// Returns the category this payload shape belongs to.
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::Sensor(_) => Category::SensorData,
            Self::Event { .. } => Category::Event,
            Self::Mission(_) => Category::MissionUpdate,
            Self::Conversation { .. } => Category::Conversation,
            Self::System(_) => Category::SystemState,
            Self::Environmental(_) => Category::Environmental,
        }
    }

    /// Renders the payload as a plain JSON value for serialization and
    /// display, without the enum tag.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Sensor(map)
            | Self::Mission(map)
            | Self::System(map)
            | Self::Environmental(map) => Value::Object(map.clone()),
            Self::Event { name, data } => {
                let mut obj = Map::new();
                obj.insert("event".to_string(), Value::String(name.clone()));
                obj.insert("data".to_string(), Value::Object(data.clone()));
                Value::Object(obj)
            }
            Self::Conversation { role, message } => {
                let mut obj = Map::new();
                obj.insert("role".to_string(), Value::String(role.clone()));
                obj.insert("message".to_string(), Value::String(message.clone()));
                Value::Object(obj)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("battery".to_string(), json!(75));
        map
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            Payload::Sensor(sample_map()).category(),
            Category::SensorData
        );
        assert_eq!(
            Payload::Event {
                name: "obstacle_detected".to_string(),
                data: Map::new(),
            }
            .category(),
            Category::Event
        );
        assert_eq!(
            Payload::Mission(sample_map()).category(),
            Category::MissionUpdate
        );
        assert_eq!(
            Payload::Conversation {
                role: "operator".to_string(),
                message: "status?".to_string(),
            }
            .category(),
            Category::Conversation
        );
        assert_eq!(
            Payload::System(sample_map()).category(),
            Category::SystemState
        );
        assert_eq!(
            Payload::Environmental(sample_map()).category(),
            Category::Environmental
        );
    }

    #[test]
    fn test_to_value_event_shape() {
        let mut data = Map::new();
        data.insert("distance".to_string(), json!(150));
        let payload = Payload::Event {
            name: "obstacle_detected".to_string(),
            data,
        };
        let value = payload.to_value();
        assert_eq!(value["event"], json!("obstacle_detected"));
        assert_eq!(value["data"]["distance"], json!(150));
    }

    #[test]
    fn test_to_value_conversation_shape() {
        let payload = Payload::Conversation {
            role: "assistant".to_string(),
            message: "returning to base".to_string(),
        };
        let value = payload.to_value();
        assert_eq!(value["role"], json!("assistant"));
        assert_eq!(value["message"], json!("returning to base"));
    }

    #[test]
    fn test_payload_serialization_roundtrip() {
        let payload = Payload::Sensor(sample_map());
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"type\":\"sensor\""));

        let back: Payload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
