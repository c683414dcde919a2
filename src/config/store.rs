//! Decision store configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Where decisions and team hierarchies are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local maps; contents are lost on restart.
    #[default]
    Memory,
    Postgres,
}

/// Store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Changes buffered per subscriber before it starts skipping.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,
}

impl StoreConfig {
    pub const MAX_NOTIFICATION_CAPACITY: usize = 65_536;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=Self::MAX_NOTIFICATION_CAPACITY).contains(&self.notification_capacity) {
            return Err(ValidationError::InvalidNotificationCapacity(
                self.notification_capacity,
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            notification_capacity: default_notification_capacity(),
        }
    }
}

fn default_notification_capacity() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_memory_backend() {
        let config = StoreConfig::default();
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.notification_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn capacity_must_be_in_range() {
        for capacity in [0, StoreConfig::MAX_NOTIFICATION_CAPACITY + 1] {
            let config = StoreConfig {
                notification_capacity: capacity,
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ValidationError::InvalidNotificationCapacity(capacity))
            );
        }
    }
}
