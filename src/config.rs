//! Configuration for decoding limits and stream splitting.
//!
//! Both structs deserialize from JSON with every field optional, so an
//! embedding service can ship partial overrides:
//!
//! ```
//! use hawkwire::config::StreamConfig;
//!
//! let config: StreamConfig = serde_json::from_str(r#"{"initial_credit": 8}"#).unwrap();
//! assert_eq!(config.initial_credit, 8);
//! assert!(config.buffer_initial_message);
//! ```

use serde::Deserialize;

/// Default maximum declared payload size (1 GB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1_073_741_824;

/// Default maximum size of a reassembled initial message (16 MB).
pub const DEFAULT_MAX_INITIAL_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Default credit granted to an event stream before the consumer asks for more.
pub const DEFAULT_INITIAL_CREDIT: usize = 16;

/// Limits applied while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest envelope, blob or collection a decoder will accept.
    pub max_payload_size: usize,
}

impl CodecConfig {
    /// Load from a JSON object; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
        }
    }
}

/// Settings for splitting the first message off a chunked stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Reassemble the first message before delivering it (`true`), or hand
    /// over the first chunk as-is (`false`).
    pub buffer_initial_message: bool,
    /// Largest initial message the buffering policy will accumulate.
    pub max_initial_message_size: usize,
    /// Elements the producer may emit before the consumer requests more.
    pub initial_credit: usize,
}

impl StreamConfig {
    /// Load from a JSON object; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_initial_message: true,
            max_initial_message_size: DEFAULT_MAX_INITIAL_MESSAGE_SIZE,
            initial_credit: DEFAULT_INITIAL_CREDIT,
        }
    }
}
