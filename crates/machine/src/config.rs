//! Machine configuration.

use tracing::warn;

/// Environment variable overriding [`MachineConfig::name`].
pub const ENV_MACHINE_NAME: &str = "VENDO_MACHINE_NAME";
/// Environment variable overriding [`MachineConfig::low_stock_threshold`].
pub const ENV_LOW_STOCK_THRESHOLD: &str = "VENDO_LOW_STOCK_THRESHOLD";

/// Vending machine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Name for logging
    pub name: String,
    /// Items with fewer units than this are reported by `low_stock()`
    pub low_stock_threshold: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "vending-machine".to_string(),
            low_stock_threshold: 3,
        }
    }
}

impl MachineConfig {
    /// Defaults overridden by `VENDO_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(name) = lookup(ENV_MACHINE_NAME).filter(|n| !n.trim().is_empty()) {
            config.name = name.trim().to_string();
        }

        if let Some(raw) = lookup(ENV_LOW_STOCK_THRESHOLD) {
            match raw.trim().parse::<u32>() {
                Ok(threshold) => config.low_stock_threshold = threshold,
                Err(e) => warn!(
                    var = ENV_LOW_STOCK_THRESHOLD,
                    value = %raw,
                    error = %e,
                    "ignoring invalid low stock threshold"
                ),
            }
        }

        config
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_low_stock_threshold(mut self, threshold: u32) -> Self {
        self.low_stock_threshold = threshold;
        self
    }
}
