//! Core per-block ASTC compression pipeline: partition search, color
//! direction analysis, endpoint packing/unpacking, summed-area per-pixel
//! statistics, and the shared vector/matrix math kernel they all sit on.
//!
//! File I/O, CLI parsing, multi-threaded block tiling, and the final
//! 128-bit bit-packing of a block's trits/quints are out of scope (see
//! `SPEC_FULL.md` / `DESIGN.md`); this crate exposes the pure functions an
//! encoder driver composes around those collaborators.

pub mod block;
pub mod directions;
pub mod endpoints;
pub mod error;
pub mod error_eval;
pub mod math;
pub mod partition_search;
pub mod tables;
pub mod variance;

pub use block::{ColorLine, DecodeMode, EncoderConfig, ErrorWeightBlock, ImageBlock, ProcessedLine};
pub use directions::DirectionMethod;
pub use endpoints::{unpack_color_endpoints, Endpoint, EndpointFormat};
pub use error::CoreError;
pub use partition_search::{find_best_partitionings, PartitionSearchResult};
pub use tables::{try_partition_table, Footprint};
pub use variance::{compute_averages_and_variances, Image, StatsConfig, Statistics};
