//! kd-tree build configuration.

use serde::{Deserialize, Serialize};

/// Hard ceiling on tree depth. Deeper trees only duplicate straddling
/// triangles further without narrowing the search.
pub const MAX_KD_DEPTH: u8 = 64;

/// How a kd-tree node picks its split plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Midpoint of the longest axis of the node's box.
    Median,
    /// Cheapest plane under the Surface Area Heuristic.
    #[default]
    Sah,
}

/// kd-tree build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdTreeConfig {
    /// Split plane selection
    pub strategy: SplitStrategy,
    /// Depth at which a leaf is forced regardless of cost
    pub max_depth: u8,
}

impl Default for KdTreeConfig {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::Sah,
            max_depth: 25,
        }
    }
}

impl KdTreeConfig {
    pub fn new(use_sah: bool, max_depth: u8) -> Self {
        Self {
            strategy: if use_sah {
                SplitStrategy::Sah
            } else {
                SplitStrategy::Median
            },
            max_depth,
        }
    }

    /// Copy of this config with `max_depth` capped at [`MAX_KD_DEPTH`].
    pub fn validated(self) -> Self {
        if self.max_depth > MAX_KD_DEPTH {
            log::warn!(
                "kd-tree max_depth {} exceeds {}, clamping",
                self.max_depth,
                MAX_KD_DEPTH
            );
        }
        Self {
            max_depth: self.max_depth.min(MAX_KD_DEPTH),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KdTreeConfig::default();
        assert_eq!(config.strategy, SplitStrategy::Sah);
        assert_eq!(config.max_depth, 25);
    }

    #[test]
    fn test_new_from_flag() {
        assert_eq!(KdTreeConfig::new(false, 8).strategy, SplitStrategy::Median);
        assert_eq!(KdTreeConfig::new(true, 8).strategy, SplitStrategy::Sah);
    }

    #[test]
    fn test_validated_clamps_depth() {
        let config = KdTreeConfig::new(true, 200).validated();
        assert_eq!(config.max_depth, MAX_KD_DEPTH);

        let config = KdTreeConfig::new(true, 12).validated();
        assert_eq!(config.max_depth, 12);
    }

    #[test]
    fn test_config_from_json() {
        let config: KdTreeConfig =
            serde_json::from_str(r#"{ "strategy": "median", "max_depth": 10 }"#).unwrap();
        assert_eq!(config, KdTreeConfig::new(false, 10));

        // Missing fields fall back to defaults
        let config: KdTreeConfig = serde_json::from_str(r#"{ "max_depth": 3 }"#).unwrap();
        assert_eq!(config.strategy, SplitStrategy::Sah);
        assert_eq!(config.max_depth, 3);
    }

    #[test]
    fn test_config_to_json() {
        let json = serde_json::to_string(&KdTreeConfig::default()).unwrap();
        assert_eq!(json, r#"{"strategy":"sah","max_depth":25}"#);
    }
}
