use super::User;
use crate::mapper::{PageRecord, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// An upvote from the `/servers/{id}/upvotes` endpoint.
///
/// The payload does not name the guild; the id the upvotes were fetched for is
/// attached when the record is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upvote {
    pub guild_id: String,

    /// When the upvote took place.
    pub timestamp: i64,

    /// The user that upvoted.
    pub user: User,

    /// The payload this upvote was decoded from.
    #[serde(skip)]
    pub raw: Value,
}

#[derive(Deserialize)]
struct UpvotePayload {
    #[serde(default)]
    timestamp: i64,
    user: User,
}

impl Upvote {
    /// The upvoting user's id, which keys upvotes within a page.
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

/// Formats as a Discord mention of the upvoting user.
impl fmt::Display for Upvote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<@{}>", self.user.id)
    }
}

impl Record for Upvote {
    type Context = str;

    fn from_payload(payload: Value, guild_id: &str) -> serde_json::Result<Self> {
        let UpvotePayload { timestamp, mut user } = serde_json::from_value(payload.clone())?;
        if let Some(raw) = payload.get("user") {
            user.raw = raw.clone();
        }
        Ok(Upvote {
            guild_id: guild_id.to_string(),
            timestamp,
            user,
            raw: payload,
        })
    }
}

impl PageRecord for Upvote {
    fn key(&self) -> &str {
        self.id()
    }

    fn payload_key(payload: &Value) -> Option<&str> {
        payload.get("user")?.get("id")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upvote_threads_guild_id() {
        let payload = json!({
            "timestamp": 1546300800000i64,
            "user": { "id": "77", "username": "voter", "discriminator": "1234" }
        });
        assert_eq!(Upvote::payload_key(&payload), Some("77"));

        let upvote = Upvote::from_payload(payload.clone(), "2001").unwrap();
        assert_eq!(upvote.raw, payload);
        assert_eq!(upvote.user.raw, payload["user"]);
        assert_eq!(upvote.guild_id, "2001");
        assert_eq!(upvote.id(), "77");
        assert_eq!(upvote.user.tag(), "voter#1234");
        assert_eq!(upvote.to_string(), "<@77>");
    }

    #[test]
    fn test_upvote_requires_user() {
        assert!(Upvote::from_payload(json!({ "timestamp": 1 }), "2001").is_err());
    }
}
