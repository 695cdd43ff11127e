//! Operators: stages that wrap one or more upstream streams in a new downstream.

pub mod chunk;
pub mod combine;
pub mod fan_out;
pub mod filter;
pub mod rate;
pub mod stats;
pub mod timeout;
pub mod transform;
pub mod value;

pub use chunk::chunk;
pub use combine::{combine_latest_to_array, combine_latest_to_object, merged, sync_to_array};
pub use fan_out::{split, split_labelled, switcher, Case};
pub use filter::{drop, field, filter, get_path};
pub use rate::{debounce, throttle};
pub use stats::{average, max, min, rank, sum, tally, tally_items};
pub use timeout::{timeout_ping, timeout_value, Fallback};
pub use transform::{tap, transform, try_transform};
pub use value::{annotate, compute_with_previous, with_value, Annotated};
