mod alert;
mod catalog;
mod order;
mod payout;
mod revenue;
mod user;
mod webhook_log;

pub use alert::*;
pub use catalog::*;
pub use order::*;
pub use payout::*;
pub use revenue::*;
pub use user::*;
pub use webhook_log::*;
