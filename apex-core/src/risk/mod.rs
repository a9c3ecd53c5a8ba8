pub mod engine;
pub mod user;

pub use engine::{required_hold, RequiredHold, RiskEngine};
pub use user::{PositionRecord, UserProfile, UserStatus};
