//! # servers-space - a client for the serverlist.space directory API
//!
//! Typed, async access to the directory's guild listings, users, upvotes and
//! statistics. Built on `reqwest`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use servers_space::{Client, ClientOptionsUpdate, FetchOptions, MultiFetchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), servers_space::Error> {
//!     let client = Client::with_options(ClientOptionsUpdate::new().cache(true))?;
//!
//!     // A page of guilds, keyed by id
//!     let guilds = client.fetch_guilds(MultiFetchOptions::new().page(2)).await?;
//!     for guild in guilds.iter().filter_map(|g| g.record()) {
//!         println!("{} ({} members)", guild, guild.member_count);
//!     }
//!
//!     // One user, as the raw JSON the API sent
//!     let user = client
//!         .fetch_user("235593018332282884", FetchOptions::new().raw(true))
//!         .await?;
//!     println!("{}", user.raw().unwrap());
//!
//!     // Everything fetched with caching on is kept
//!     println!("{} guilds cached", client.cache().guilds().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Options
//!
//! Each call resolves its options from three layers: library defaults, the
//! client's [`ClientOptions`], and the options passed to the call. A call only
//! overrides what it sets. See [`options`].
//!
//! ## Error Handling
//!
//! Failures are never retried and never swallowed:
//!
//! ```no_run
//! use servers_space::{Client, Error, FetchOptions};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::new()?;
//! match client.fetch_stats(FetchOptions::new()).await {
//!     Ok(stats) => println!("{:?}", stats),
//!     Err(Error::RateLimited(limit)) => {
//!         eprintln!("{limit}; try again in {:?}", limit.delay());
//!     }
//!     Err(Error::RequestFailed { status, message }) => {
//!         eprintln!("API said no ({status}): {message}");
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
pub mod classify;
mod client;
mod error;
pub mod mapper;
pub mod metadata;
pub mod models;
pub mod options;
pub mod rate_limit;
mod response;
mod store;

pub use cache::{Cache, StatsHistory};
pub use client::{Client, ClientBuilder, API_ORIGIN};
pub use error::{Error, Result, UsageError};
pub use mapper::{Collection, Mapped};
pub use models::{Guild, Stats, Upvote, User};
pub use options::{ClientOptions, ClientOptionsUpdate, FetchOptions, MultiFetchOptions};
pub use response::Payload;
pub use store::Store;
