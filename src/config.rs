use crate::ir::Direction;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutAlgorithm {
    #[default]
    Metro,
    /// Accepted for compatibility; laid out with [`LayoutAlgorithm::Metro`].
    Dagre,
    /// Accepted for compatibility; laid out with [`LayoutAlgorithm::Metro`].
    CoseBilkent,
    /// Accepted for compatibility; laid out with [`LayoutAlgorithm::Metro`].
    Klay,
}

impl LayoutAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "metro" => Some(Self::Metro),
            "dagre" => Some(Self::Dagre),
            "cose-bilkent" | "cose_bilkent" | "cosebilkent" => Some(Self::CoseBilkent),
            "klay" => Some(Self::Klay),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metro => "metro",
            Self::Dagre => "dagre",
            Self::CoseBilkent => "cose-bilkent",
            Self::Klay => "klay",
        }
    }

    /// True for names that have no strategy of their own.
    pub fn is_alias(self) -> bool {
        !matches!(self, Self::Metro)
    }
}

/// How the topological order becomes ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMode {
    /// Rank is the node's index in the order: one node per rank.
    #[default]
    Sequential,
    /// Rank is the longest-path layer along the order; siblings share a rank.
    Layered,
}

impl RankMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sequential" => Some(Self::Sequential),
            "layered" => Some(Self::Layered),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("nodeSeparation must be a positive finite number, got {0}")]
    NodeSeparation(f64),
    #[error("optimizationCooling must be in (0, 1], got {0}")]
    Cooling(f64),
    #[error("directionBias must be in [0, 1], got {0}")]
    DirectionBias(f64),
    #[error("{field} must be a finite non-negative number, got {value}")]
    NonNegative { field: &'static str, value: f64 },
    #[error("padding must be finite, got {0}")]
    Padding(f64),
    #[error("unknown preferredDirection `{0}` (expected horizontal or vertical)")]
    UnknownDirection(String),
    #[error("unknown layoutAlgorithm `{0}` (expected metro, dagre, cose-bilkent or klay)")]
    UnknownAlgorithm(String),
    #[error("unknown rankMode `{0}` (expected sequential or layered)")]
    UnknownRankMode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Soft minimum distance between nodes, enforced by the energy function.
    pub node_separation: f64,
    /// Distance between consecutive ranks along the primary axis.
    pub rank_separation: f64,
    /// Spacing budget for parallel edges. Informational only.
    pub edge_separation: f64,
    /// Margin added around the layout during normalization.
    pub padding: f64,
    pub optimization_iterations: usize,
    pub optimization_temperature: f64,
    /// Multiplicative temperature decay per iteration, in (0, 1].
    pub optimization_cooling: f64,
    pub preferred_direction: Direction,
    /// Pull of edge control points toward the preferred axis, in [0, 1].
    pub direction_bias: f64,
    pub layout_algorithm: LayoutAlgorithm,
    pub rank_mode: RankMode,
    /// Barycenter sweeps over the rank groups.
    pub crossing_passes: usize,
    /// Seed for the refinement stage. `None` draws from OS entropy.
    pub random_seed: Option<u64>,
    /// Fail on dangling edges and algorithm aliases instead of degrading.
    pub strict: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_separation: 50.0,
            rank_separation: 100.0,
            edge_separation: 10.0,
            padding: 20.0,
            optimization_iterations: 50,
            optimization_temperature: 1.0,
            optimization_cooling: 0.95,
            preferred_direction: Direction::Horizontal,
            direction_bias: 0.5,
            layout_algorithm: LayoutAlgorithm::Metro,
            rank_mode: RankMode::Sequential,
            crossing_passes: 1,
            random_seed: None,
            strict: false,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.node_separation.is_finite() && self.node_separation > 0.0) {
            return Err(ConfigError::NodeSeparation(self.node_separation));
        }
        if !(self.optimization_cooling > 0.0 && self.optimization_cooling <= 1.0) {
            return Err(ConfigError::Cooling(self.optimization_cooling));
        }
        if !(0.0..=1.0).contains(&self.direction_bias) {
            return Err(ConfigError::DirectionBias(self.direction_bias));
        }
        for (field, value) in [
            ("rankSeparation", self.rank_separation),
            ("edgeSeparation", self.edge_separation),
            ("optimizationTemperature", self.optimization_temperature),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NonNegative { field, value });
            }
        }
        if !self.padding.is_finite() {
            return Err(ConfigError::Padding(self.padding));
        }
        Ok(())
    }

    pub fn is_horizontal(&self) -> bool {
        self.preferred_direction.is_horizontal()
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_separation: Option<f64>,
    rank_separation: Option<f64>,
    edge_separation: Option<f64>,
    padding: Option<f64>,
    optimization_iterations: Option<usize>,
    optimization_temperature: Option<f64>,
    optimization_cooling: Option<f64>,
    preferred_direction: Option<String>,
    direction_bias: Option<f64>,
    layout_algorithm: Option<String>,
    rank_mode: Option<String>,
    crossing_passes: Option<usize>,
    random_seed: Option<u64>,
    strict: Option<bool>,
}

impl ConfigFile {
    fn apply(self, config: &mut LayoutConfig) -> Result<(), ConfigError> {
        if let Some(v) = self.node_separation {
            config.node_separation = v;
        }
        if let Some(v) = self.rank_separation {
            config.rank_separation = v;
        }
        if let Some(v) = self.edge_separation {
            config.edge_separation = v;
        }
        if let Some(v) = self.padding {
            config.padding = v;
        }
        if let Some(v) = self.optimization_iterations {
            config.optimization_iterations = v;
        }
        if let Some(v) = self.optimization_temperature {
            config.optimization_temperature = v;
        }
        if let Some(v) = self.optimization_cooling {
            config.optimization_cooling = v;
        }
        if let Some(v) = self.preferred_direction {
            config.preferred_direction =
                Direction::from_token(&v).ok_or(ConfigError::UnknownDirection(v))?;
        }
        if let Some(v) = self.direction_bias {
            config.direction_bias = v;
        }
        if let Some(v) = self.layout_algorithm {
            config.layout_algorithm =
                LayoutAlgorithm::from_name(&v).ok_or(ConfigError::UnknownAlgorithm(v))?;
        }
        if let Some(v) = self.rank_mode {
            config.rank_mode = RankMode::from_name(&v).ok_or(ConfigError::UnknownRankMode(v))?;
        }
        if let Some(v) = self.crossing_passes {
            config.crossing_passes = v;
        }
        if self.random_seed.is_some() {
            config.random_seed = self.random_seed;
        }
        if let Some(v) = self.strict {
            config.strict = v;
        }
        Ok(())
    }
}

/// Parses config file contents over the defaults. JSON5 is accepted when
/// `json5` is set (comments, trailing commas, unquoted keys).
pub fn parse_config(contents: &str, json5: bool) -> anyhow::Result<LayoutConfig> {
    let parsed: ConfigFile = if json5 {
        let value: serde_json::Value = json5::from_str(contents)?;
        serde_json::from_value(value)?
    } else {
        serde_json::from_str(contents)?
    };
    let mut config = LayoutConfig::default();
    parsed.apply(&mut config)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let Some(path) = path else {
        return Ok(LayoutConfig::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let is_json5 = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json5"))
        .unwrap_or(false);
    parse_config(&contents, is_json5)
}
