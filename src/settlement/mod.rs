//! Settlement of captured charges into the ledger.
//!
//! `commission` and `referral` are pure: they turn resolved catalog and user
//! records into planned writes. `ledger` reads those records and applies the
//! planned writes inside one SQLite transaction.

mod commission;
mod ledger;
mod referral;

pub use commission::*;
pub use ledger::*;
pub use referral::*;
