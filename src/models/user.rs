use crate::mapper::{PageRecord, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A user logged onto serverlist.space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's Discord ID.
    pub id: String,

    /// The user's Discord username.
    pub username: String,

    /// The user's 4 digits.
    pub discriminator: String,

    /// The user's avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,

    /// The user's description on serverlist.space.
    #[serde(rename = "short_description", default)]
    pub description: Option<String>,

    /// The payload this user was decoded from.
    #[serde(skip)]
    pub raw: Value,
}

impl User {
    /// The user's Discord tag, `username#discriminator`.
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// The user's page on serverlist.space.
    pub fn page_url(&self) -> String {
        format!("{}/user/{}", super::SITE_URL, self.id)
    }
}

/// Formats as a Discord user mention.
impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<@{}>", self.id)
    }
}

impl Record for User {
    type Context = ();

    fn from_payload(payload: Value, _: &()) -> serde_json::Result<Self> {
        let mut user: User = serde_json::from_value(payload.clone())?;
        user.raw = payload;
        Ok(user)
    }
}

impl PageRecord for User {
    fn key(&self) -> &str {
        &self.id
    }

    fn payload_key(payload: &Value) -> Option<&str> {
        payload.get("id")?.as_str()
    }
}
