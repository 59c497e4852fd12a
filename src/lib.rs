//! Aggregation pipeline behind the Rx overview dashboard.
//!
//! Weekly rows are optionally re-keyed through a mapping sheet, summed per
//! time bucket (and per segment), reshaped into pivot or grouped form and
//! restricted to a window over the ordered buckets. [`session::Session`]
//! ties it together for the three dashboard views.

pub mod aggregate;
pub mod bucket;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod mapping;
pub mod output;
pub mod overview;
pub mod percent;
pub mod pipeline;
pub mod pivot;
pub mod session;
pub mod types;
pub mod util;

pub use error::{PipelineError, Result};
