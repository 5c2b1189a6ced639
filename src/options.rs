//! Option layers and their resolution.
//!
//! Options for a call come from three layers: library defaults, the client's
//! [`ClientOptions`], and the per-call [`FetchOptions`] / [`MultiFetchOptions`].
//! Each layer only overrides the fields it sets. Resolution never mutates a
//! layer; it returns a new value.
//!
//! The per-call base layer is derived from the client options every time
//! ([`ClientOptions::fetch_defaults`]), so editing the client's `version`,
//! `guild_token` or `cache` is immediately visible to calls that leave those
//! fields unset.
//!
//! Options can also be read from untyped JSON with the `from_json`
//! constructors, which check every field's type before anything is merged.
//!
//! ```
//! use servers_space::options::{ClientOptions, ClientOptionsUpdate, MultiFetchOptions, Resolve};
//!
//! let client = ClientOptions::default().resolve(&ClientOptionsUpdate::new().version(2));
//! let call = client.multi_fetch_defaults().resolve(&MultiFetchOptions::new().page(3));
//!
//! assert_eq!(call.version, 2);
//! assert_eq!(call.page, 3);
//! assert!(call.mapify);
//! ```

use crate::{error::UsageError, Result};
use serde_json::{Map, Value};

/// API version used when none is configured.
pub const DEFAULT_VERSION: u64 = 1;

/// How many statistics snapshots the cache keeps by default.
pub const DEFAULT_STATS_LIMIT: usize = 10;

/// Layers a set of overrides on top of a complete option set.
pub trait Resolve: Sized {
    type Overrides;

    /// Returns `self` with every field the overrides set replaced.
    fn resolve(&self, overrides: &Self::Overrides) -> Self;
}

/// Client-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// The guild's API token from the site. Required for upvotes.
    pub guild_token: Option<String>,

    /// The guild used when a call names no guild.
    pub guild_id: Option<String>,

    /// Whether fetched guilds, users and statistics are cached.
    pub cache: bool,

    /// The API version requests go to.
    pub version: u64,

    /// Capacity of the statistics history.
    pub stats_limit: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            guild_token: None,
            guild_id: None,
            cache: false,
            version: DEFAULT_VERSION,
            stats_limit: DEFAULT_STATS_LIMIT,
        }
    }
}

impl ClientOptions {
    /// The base layer for single-record calls.
    pub fn fetch_defaults(&self) -> EffectiveFetchOptions {
        EffectiveFetchOptions {
            cache: self.cache,
            raw: false,
            version: self.version,
            guild_token: self.guild_token.clone(),
        }
    }

    /// The base layer for paged calls.
    pub fn multi_fetch_defaults(&self) -> EffectiveMultiFetchOptions {
        let EffectiveFetchOptions {
            cache,
            raw,
            version,
            guild_token,
        } = self.fetch_defaults();
        EffectiveMultiFetchOptions {
            cache,
            raw,
            version,
            guild_token,
            mapify: true,
            page: 1,
            reverse: false,
            sort_by: None,
        }
    }
}

impl Resolve for ClientOptions {
    type Overrides = ClientOptionsUpdate;

    fn resolve(&self, update: &ClientOptionsUpdate) -> Self {
        Self {
            guild_token: pick_nullable(&update.guild_token, &self.guild_token),
            guild_id: pick_nullable(&update.guild_id, &self.guild_id),
            cache: update.cache.unwrap_or(self.cache),
            version: update.version.unwrap_or(self.version),
            stats_limit: update.stats_limit.unwrap_or(self.stats_limit),
        }
    }
}

/// A partial [`ClientOptions`]; unset fields keep their current value.
///
/// Nullable fields are `Option<Option<String>>`: `None` leaves the field alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptionsUpdate {
    pub guild_token: Option<Option<String>>,
    pub guild_id: Option<Option<String>>,
    pub cache: Option<bool>,
    pub version: Option<u64>,
    pub stats_limit: Option<usize>,
}

impl ClientOptionsUpdate {
    /// Creates an update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the guild token.
    pub fn guild_token(mut self, token: impl Into<String>) -> Self {
        self.guild_token = Some(Some(token.into()));
        self
    }

    /// Removes the guild token.
    pub fn clear_guild_token(mut self) -> Self {
        self.guild_token = Some(None);
        self
    }

    /// Sets the default guild id.
    pub fn guild_id(mut self, id: impl Into<String>) -> Self {
        self.guild_id = Some(Some(id.into()));
        self
    }

    /// Removes the default guild id.
    pub fn clear_guild_id(mut self) -> Self {
        self.guild_id = Some(None);
        self
    }

    /// Turns caching on or off.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the API version.
    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the capacity of the statistics history.
    pub fn stats_limit(mut self, limit: usize) -> Self {
        self.stats_limit = Some(limit);
        self
    }

    /// Reads an update from JSON using the API's key names
    /// (`guildToken`, `guildID`, `cache`, `version`, `statsLimit`).
    ///
    /// # Errors
    ///
    /// Returns [`UsageError`] if `value` is not an object or any key has the wrong type.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = JsonOptions::new(value)?;
        Ok(Self {
            guild_token: object.nullable_string("guildToken")?,
            guild_id: object.nullable_string("guildID")?,
            cache: object.boolean("cache")?,
            version: object.integer("version")?,
            stats_limit: object
                .integer("statsLimit")?
                .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX)),
        })
    }
}

/// Resolved options for one single-record call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveFetchOptions {
    pub cache: bool,
    pub raw: bool,
    pub version: u64,
    pub guild_token: Option<String>,
}

impl Resolve for EffectiveFetchOptions {
    type Overrides = FetchOptions;

    fn resolve(&self, overrides: &FetchOptions) -> Self {
        Self {
            cache: overrides.cache.unwrap_or(self.cache),
            raw: overrides.raw.unwrap_or(self.raw),
            version: overrides.version.unwrap_or(self.version),
            guild_token: pick_nullable(&overrides.guild_token, &self.guild_token),
        }
    }
}

/// Per-call options for single-record fetches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Cache the fetched record. Falls back to [`ClientOptions::cache`].
    pub cache: Option<bool>,

    /// Return the payload untouched instead of a record.
    pub raw: Option<bool>,

    /// API version for this call. Falls back to [`ClientOptions::version`].
    pub version: Option<u64>,

    /// Guild token for this call. Falls back to [`ClientOptions::guild_token`].
    pub guild_token: Option<Option<String>>,
}

impl FetchOptions {
    /// Creates options that override nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches the fetched record, or not.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the payload untouched instead of a record.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Sends this call to another API version.
    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Uses `token` for this call only.
    pub fn guild_token(mut self, token: impl Into<String>) -> Self {
        self.guild_token = Some(Some(token.into()));
        self
    }

    /// Reads options from JSON (`cache`, `raw`, `version`, `guildToken`).
    ///
    /// # Errors
    ///
    /// Returns [`UsageError`] if `value` is not an object or any key has the wrong type.
    pub fn from_json(value: &Value) -> Result<Self> {
        JsonOptions::new(value)?.fetch_options()
    }
}

/// Resolved options for one paged call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveMultiFetchOptions {
    pub cache: bool,
    pub raw: bool,
    pub version: u64,
    pub guild_token: Option<String>,
    pub mapify: bool,
    pub page: u64,
    pub reverse: bool,
    pub sort_by: Option<String>,
}

impl Resolve for EffectiveMultiFetchOptions {
    type Overrides = MultiFetchOptions;

    fn resolve(&self, overrides: &MultiFetchOptions) -> Self {
        Self {
            cache: overrides.cache.unwrap_or(self.cache),
            raw: overrides.raw.unwrap_or(self.raw),
            version: overrides.version.unwrap_or(self.version),
            guild_token: pick_nullable(&overrides.guild_token, &self.guild_token),
            mapify: overrides.mapify.unwrap_or(self.mapify),
            page: overrides.page.unwrap_or(self.page),
            reverse: overrides.reverse.unwrap_or(self.reverse),
            sort_by: pick_nullable(&overrides.sort_by, &self.sort_by),
        }
    }
}

/// Per-call options for paged fetches. Extends [`FetchOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiFetchOptions {
    pub cache: Option<bool>,
    pub raw: Option<bool>,
    pub version: Option<u64>,
    pub guild_token: Option<Option<String>>,

    /// Key the page by record id instead of returning a list. Defaults to `true`.
    pub mapify: Option<bool>,

    /// Page to fetch, starting at 1.
    pub page: Option<u64>,

    /// Reverse the server-side sort. Only meaningful together with `sort_by`.
    pub reverse: Option<bool>,

    /// Raw payload field to sort by on the server, e.g. `created_at`.
    pub sort_by: Option<Option<String>>,
}

impl MultiFetchOptions {
    /// Creates options that override nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches the fetched records, or not.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns payload elements untouched instead of records.
    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = Some(raw);
        self
    }

    /// Sends this call to another API version.
    pub fn version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// Uses `token` for this call only.
    pub fn guild_token(mut self, token: impl Into<String>) -> Self {
        self.guild_token = Some(Some(token.into()));
        self
    }

    /// Keys the page by id, or returns it as a list.
    pub fn mapify(mut self, mapify: bool) -> Self {
        self.mapify = Some(mapify);
        self
    }

    /// Selects the page, starting at 1.
    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    /// Reverses the server-side sort.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    /// Sorts on the server by a raw payload field.
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(Some(field.into()));
        self
    }

    /// Reads options from JSON: the [`FetchOptions`] keys plus `mapify`,
    /// `page`, `reverse` and `sortBy`.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError`] if `value` is not an object or any key has the wrong type.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = JsonOptions::new(value)?;
        let FetchOptions {
            cache,
            raw,
            version,
            guild_token,
        } = object.fetch_options()?;
        Ok(Self {
            cache,
            raw,
            version,
            guild_token,
            mapify: object.boolean("mapify")?,
            page: object.integer("page")?,
            reverse: object.boolean("reverse")?,
            sort_by: object.nullable_string("sortBy")?,
        })
    }
}

impl From<FetchOptions> for MultiFetchOptions {
    fn from(options: FetchOptions) -> Self {
        Self {
            cache: options.cache,
            raw: options.raw,
            version: options.version,
            guild_token: options.guild_token,
            ..Self::default()
        }
    }
}

fn pick_nullable(overrides: &Option<Option<String>>, base: &Option<String>) -> Option<String> {
    match overrides {
        Some(value) => value.clone(),
        None => base.clone(),
    }
}

/// Typed view over an untyped options object.
struct JsonOptions<'a>(&'a Map<String, Value>);

impl<'a> JsonOptions<'a> {
    fn new(value: &'a Value) -> Result<Self> {
        let object = value.as_object().ok_or(UsageError::NotAnObject)?;
        if object.contains_key("userToken") {
            tracing::warn!("options#userToken - Obsolete in its use.");
        }
        Ok(Self(object))
    }

    fn fetch_options(&self) -> Result<FetchOptions> {
        Ok(FetchOptions {
            cache: self.boolean("cache")?,
            raw: self.boolean("raw")?,
            version: self.integer("version")?,
            guild_token: self.nullable_string("guildToken")?,
        })
    }

    fn boolean(&self, field: &'static str) -> Result<Option<bool>> {
        match self.0.get(field) {
            None => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(*flag)),
            Some(_) => Err(invalid(field, "boolean")),
        }
    }

    fn integer(&self, field: &'static str) -> Result<Option<u64>> {
        match self.0.get(field) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                        .map(|f| f as u64)
                })
                .map(Some)
                .ok_or_else(|| invalid(field, "a non-negative whole number")),
            Some(_) => Err(invalid(field, "a number")),
        }
    }

    fn nullable_string(&self, field: &'static str) -> Result<Option<Option<String>>> {
        match self.0.get(field) {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(None)),
            Some(Value::String(s)) => Ok(Some(Some(s.clone()))),
            Some(_) => Err(invalid(field, "a string")),
        }
    }
}

fn invalid(field: &'static str, expected: &'static str) -> crate::Error {
    UsageError::InvalidOption { field, expected }.into()
}
