//! Staged parameter search.
//!
//! ```text
//! Dimension tree ──> SearchGrid::construct ──> positions      (dimension.rs, grid.rs)
//!                                                  │
//!            project onto stages 0..=i, dedup      │          (position.rs)
//!                                                  v
//! fn0 ──> stage 0 units ──> stage 1 units ──> ... ──> evaluate (driver.rs)
//!           └─────────── run_bounded worker pool ───────┘     (pool.rs)
//! ```
//!
//! A [`Search`] owns its dimensions and, after a successful
//! [`run`](Search::run), one [`Evaluation`] per grid position. Timings and
//! clone counts per stage are kept in [`SearchMetrics`].

#[path = "search/dimension.rs"]
mod dimension;
#[path = "search/driver.rs"]
mod driver;
#[path = "search/grid.rs"]
mod grid;
#[path = "search/metrics.rs"]
mod metrics;
#[path = "search/pool.rs"]
mod pool;
#[path = "search/position.rs"]
mod position;

pub use dimension::{DIMENSION, Dimension, DimensionKind, ENUMERATED};
pub use driver::{Evaluation, Instance, ParameterSearchable, Search, SharedInstance};
pub use grid::SearchGrid;
pub use metrics::{SearchMetrics, StageMetrics};
pub use position::{DimensionKey, Position};
