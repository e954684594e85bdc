mod drivers;
mod resolution;
mod summary;

pub use drivers::{DEFAULT_TOP_DRIVERS, Driver, RiskDrivers, top_drivers};
pub use resolution::weighted_median_resolution;
pub use summary::AggregateSummary;
