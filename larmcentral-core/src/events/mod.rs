//! Event plumbing: typed intake events, the lock-free intake bus, and the
//! ordered notification fan-out.

pub mod bus;
pub mod intake;
pub mod notify;

pub use bus::{EventBus, EventError};
pub use intake::{DispatchEvent, EventKind};
pub use notify::{HandoverSummary, Notification, NotificationBus, NotificationKind};
