//! NoteBridge configuration and builder.

use std::num::NonZeroUsize;
use std::sync::Arc;

use notepoll_core::DEFAULT_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ingest::IngestEngine;
use crate::state::SharedState;

#[cfg(feature = "midi-io")]
use crate::io::{MidiInputManager, MidiOutputManager};

use super::{NoteBridge, NoteBridgeInner};

/// Fixed for the lifetime of a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Capacity of the note event queue.
    pub event_capacity: usize,
    /// Capacity of the raw packet trace.
    pub raw_capacity: usize,
    /// Client name reported to the MIDI backend.
    pub client_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_QUEUE_CAPACITY,
            raw_capacity: DEFAULT_QUEUE_CAPACITY,
            client_name: "notepoll".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Returns the event and raw capacities once both are known to be non-zero.
    pub fn validate(&self) -> Result<(NonZeroUsize, NonZeroUsize)> {
        let event = NonZeroUsize::new(self.event_capacity).ok_or_else(|| {
            Error::InvalidConfig("event_capacity must be at least 1".to_string())
        })?;
        let raw = NonZeroUsize::new(self.raw_capacity)
            .ok_or_else(|| Error::InvalidConfig("raw_capacity must be at least 1".to_string()))?;
        if self.client_name.is_empty() {
            return Err(Error::InvalidConfig(
                "client_name must not be empty".to_string(),
            ));
        }
        Ok((event, raw))
    }
}

#[derive(Debug, Default)]
pub struct NoteBridgeBuilder {
    pub(super) config: BridgeConfig,
    #[cfg(feature = "midi-io")]
    pub(super) enable_io: bool,
}

impl NoteBridgeBuilder {
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn raw_capacity(mut self, capacity: usize) -> Self {
        self.config.raw_capacity = capacity;
        self
    }

    /// Set both queue capacities.
    pub fn queue_capacity(self, capacity: usize) -> Self {
        self.event_capacity(capacity).raw_capacity(capacity)
    }

    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the device input and output threads.
    #[cfg(feature = "midi-io")]
    pub fn io(mut self) -> Self {
        self.enable_io = true;
        self
    }

    pub fn build(self) -> Result<NoteBridge> {
        let (event_capacity, raw_capacity) = self.config.validate()?;
        let shared = Arc::new(SharedState::new(event_capacity, raw_capacity));

        #[cfg(feature = "midi-io")]
        let (input_manager, output_manager) = if self.enable_io {
            let input = MidiInputManager::new(&self.config.client_name)?;
            let output = MidiOutputManager::new(&self.config.client_name)?;
            (Some(input), Some(output))
        } else {
            (None, None)
        };

        tracing::debug!(
            "Built note bridge: event capacity {}, raw capacity {}",
            event_capacity,
            raw_capacity
        );

        Ok(NoteBridge {
            inner: Arc::new(NoteBridgeInner {
                config: self.config,
                engine: IngestEngine::new(Arc::clone(&shared)),
                shared,
                #[cfg(feature = "midi-io")]
                input_manager,
                #[cfg(feature = "midi-io")]
                output_manager,
            }),
        })
    }
}
