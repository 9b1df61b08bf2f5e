//! Rate limiting logic and state management.

mod clock;
mod decision;
mod key;
mod limiter;
pub mod quota;
mod record;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use decision::{QuotaSnapshot, RateLimitDecision};
pub use key::{RecordKey, ANONYMOUS_CALLER};
pub use limiter::{Enforcement, RateLimiter};
pub use quota::{QuotaTable, RateLimitConfig};
pub use record::RateLimitRecord;
pub use sweeper::spawn_sweeper;
