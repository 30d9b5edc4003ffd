//! User notifications

pub mod dispatcher;
pub mod policy;

pub use dispatcher::{NotificationDispatcher, SendOptions};
pub use policy::MutePolicy;
