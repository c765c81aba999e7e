use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Default number of inbox events dispatched per [`crate::Bridge::pump`].
pub const DEFAULT_PUMP_BUDGET: usize = 256;

/// Runtime knobs for a bridge session, loadable from TOML.
///
/// ```toml
/// pump_budget = 64
/// eager_refresh = true
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Upper bound on events drained from the engine inbox per pump.
    pub pump_budget: usize,
    /// Refresh affected mirrors during dispatch instead of only marking
    /// them stale.
    pub eager_refresh: bool,
    /// Write unknown tags to the status surface (they are always logged).
    pub report_unknown: bool,
    /// Write malformed payloads to the status surface.
    pub report_malformed: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pump_budget: DEFAULT_PUMP_BUDGET,
            eager_refresh: false,
            report_unknown: true,
            report_malformed: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(input: &str) -> BridgeResult<Self> {
        let config: BridgeConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> BridgeResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| BridgeError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.pump_budget == 0 {
            return Err(BridgeError::InvalidConfig("pump_budget must be positive"));
        }
        Ok(())
    }
}
