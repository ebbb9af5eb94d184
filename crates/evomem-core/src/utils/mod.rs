//! Shared utilities.

mod clock;
mod fingerprint;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fingerprint::{fingerprint, full_fingerprint};
