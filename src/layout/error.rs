use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("invalid layout configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("node `{node_id}` has a non-finite {field}")]
    NonFinite { node_id: String, field: &'static str },
    #[error("edge #{index} ({from} -> {to}) references unknown node `{missing}`")]
    DanglingEdge {
        index: usize,
        from: String,
        to: String,
        missing: String,
    },
    #[error("layout algorithm `{0}` has no strategy of its own (strict mode)")]
    UnsupportedAlgorithm(&'static str),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
