use crate::mapper::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Site-wide statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Guilds listed on the site.
    #[serde(rename = "servers")]
    pub guilds: u64,

    /// Users listed on the site.
    pub users: u64,

    /// Tags available to choose from.
    pub tags: u64,

    /// The payload this snapshot was decoded from.
    #[serde(skip)]
    pub raw: Value,
}

impl Stats {
    /// Guilds and users listed on the site, combined.
    pub fn guild_user_total(&self) -> u64 {
        self.guilds + self.users
    }
}

impl Record for Stats {
    type Context = ();

    fn from_payload(payload: Value, _: &()) -> serde_json::Result<Self> {
        let mut stats: Stats = serde_json::from_value(payload.clone())?;
        stats.raw = payload;
        Ok(stats)
    }
}
