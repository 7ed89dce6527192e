pub mod clock;
pub mod probe;
pub mod proxy;

pub use clock::{clock_at, Clock, FixedClock, SystemClock};
pub use probe::{probe_targets, ProbeStatus, PROBE_TIMEOUT};
pub use proxy::{UpstreamProxy, UpstreamRequest};
