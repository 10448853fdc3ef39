#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{LayoutAlgorithm, LayoutConfig, RankMode, load_config};
pub use ir::{Direction, Edge, Graph, Line, Node, Point};
pub use layout::{LayoutEngine, LayoutError, LayoutResult, compute_layout};
