pub mod clock;
pub mod error;
pub mod snapshot;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{PerfError, Result};
pub use snapshot::PerfSnapshot;
