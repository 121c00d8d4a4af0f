mod analytics;
mod dataset;

pub use analytics::*;
pub use dataset::*;
