//! Records returned by the directory API.
//!
//! Each record is a plain data type decoded from the API's JSON. Derived values
//! (URLs, tags, totals) are methods computed from the stored fields.

mod guild;
mod stats;
mod upvote;
mod user;

pub use guild::Guild;
pub use stats::Stats;
pub use upvote::Upvote;
pub use user::User;

/// Public site origin used for page URLs.
pub(crate) const SITE_URL: &str = "https://serverlist.space";
