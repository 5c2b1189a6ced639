use super::User;
use crate::mapper::{PageRecord, Record};
use crate::store::Store;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A guild (server) listed on serverlist.space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guild {
    /// The guild's Discord ID.
    pub id: String,

    /// The guild's name on Discord.
    pub name: String,

    /// The amount of members in the guild.
    #[serde(default)]
    pub member_count: u64,

    /// All tags the guild represents.
    #[serde(default)]
    pub tags: Vec<String>,

    /// When the guild was established on Discord.
    #[serde(rename = "created_at", default)]
    pub created_timestamp: i64,

    /// When the listing was last updated on serverlist.space.
    #[serde(rename = "updated_at", default)]
    pub last_update_timestamp: i64,

    /// Whether the guild is listed publicly. Usually false once the invite has expired.
    #[serde(default)]
    pub public: bool,

    /// Whether the guild complies with showing emojis on the site.
    #[serde(default)]
    pub compliance: bool,

    /// Whether the guild's icon is child friendly.
    #[serde(rename = "icon_child_friendly", default)]
    pub child_friendly_icon: bool,

    /// The guild's Discord icon.
    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub short_description: Option<String>,

    #[serde(default)]
    pub full_description: Option<String>,

    #[serde(rename = "vanity", default)]
    pub vanity_code: Option<String>,

    /// Primary owner first, then secondary owners.
    #[serde(default)]
    pub owners: Vec<User>,

    /// The payload this guild was decoded from.
    #[serde(skip)]
    pub raw: Value,
}

impl Guild {
    /// The guild's main owner on the site. Not always the Discord owner.
    pub fn owner(&self) -> Option<&User> {
        self.owners.first()
    }

    /// Owners other than the main one, in listing order.
    pub fn secondary_owners(&self) -> &[User] {
        self.owners.get(1..).unwrap_or_default()
    }

    /// The owners keyed by user id, primary owner first.
    pub fn owners_map(&self) -> Store<String, User> {
        self.owners
            .iter()
            .map(|user| (user.id.clone(), user.clone()))
            .collect()
    }

    /// The guild's page on serverlist.space.
    pub fn page_url(&self) -> String {
        format!("{}/server/{}", super::SITE_URL, self.id)
    }

    /// The guild's vanity URL, if it has a vanity code.
    pub fn vanity_url(&self) -> Option<String> {
        self.vanity_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .map(|code| format!("{}/server/{}", super::SITE_URL, code))
    }
}

impl fmt::Display for Guild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Record for Guild {
    type Context = ();

    fn from_payload(payload: Value, _: &()) -> serde_json::Result<Self> {
        let mut guild: Guild = serde_json::from_value(payload.clone())?;
        if let Some(Value::Array(owners)) = payload.get("owners") {
            for (owner, raw) in guild.owners.iter_mut().zip(owners) {
                owner.raw = raw.clone();
            }
        }
        guild.raw = payload;
        Ok(guild)
    }
}

impl PageRecord for Guild {
    fn key(&self) -> &str {
        &self.id
    }

    fn payload_key(payload: &Value) -> Option<&str> {
        payload.get("id")?.as_str()
    }
}
