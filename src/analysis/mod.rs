mod engine;
mod relaxed;
mod scratch;

pub use engine::SearchEngine;
pub use relaxed::{
    ppm_error,
    within_tolerance,
};
pub use scratch::{
    ScratchGuard,
    ScratchPool,
};
