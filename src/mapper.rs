//! Converts API payloads into records.
//!
//! A single-record payload becomes a [`Mapped`] value. A page becomes a
//! [`Collection`], either a list in server order or, when "mapified", a
//! [`Store`] keyed by each element's id. In raw mode the JSON elements are kept
//! as they arrived.

use crate::store::Store;
use serde::de::Error as _;
use serde_json::Value;

/// A record type that can be built from an API payload.
pub trait Record: Sized {
    /// Data the payload itself doesn't carry (an upvote's guild id).
    type Context: ?Sized;

    /// Decodes `payload`. The record keeps the payload as its `raw` field.
    fn from_payload(payload: Value, context: &Self::Context) -> serde_json::Result<Self>;
}

/// A record that appears in pages and is keyed by an id.
pub trait PageRecord: Record {
    /// The id the record is keyed by in a mapified page.
    fn key(&self) -> &str;

    /// The same key, read from the undecoded payload.
    fn payload_key(payload: &Value) -> Option<&str>;
}

/// Either a decoded record or, in raw mode, the payload untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Mapped<T> {
    Record(T),
    /// The payload as the API sent it.
    Raw(Value),
}

impl<T> Mapped<T> {
    /// The decoded record, unless the call was raw.
    pub fn record(&self) -> Option<&T> {
        match self {
            Mapped::Record(record) => Some(record),
            Mapped::Raw(_) => None,
        }
    }

    /// Consumes `self`, returning the decoded record if there is one.
    pub fn into_record(self) -> Option<T> {
        match self {
            Mapped::Record(record) => Some(record),
            Mapped::Raw(_) => None,
        }
    }

    /// The untouched payload, if the call was raw.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Mapped::Raw(value) => Some(value),
            Mapped::Record(_) => None,
        }
    }

    /// Returns `true` for raw results.
    pub fn is_raw(&self) -> bool {
        matches!(self, Mapped::Raw(_))
    }
}

/// A page of results: an ordered list, or an ordered map keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection<T> {
    List(Vec<T>),
    Map(Store<String, T>),
}

impl<T> Collection<T> {
    /// Number of elements in the page.
    pub fn len(&self) -> usize {
        match self {
            Collection::List(items) => items.len(),
            Collection::Map(store) => store.len(),
        }
    }

    /// Returns `true` if the page has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates values in order, whichever shape the page has.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (list, map) = match self {
            Collection::List(items) => (Some(items.iter()), None),
            Collection::Map(store) => (None, Some(store.values())),
        };
        list.into_iter().flatten().chain(map.into_iter().flatten())
    }

    /// The page as a map, if it was mapified.
    pub fn as_map(&self) -> Option<&Store<String, T>> {
        match self {
            Collection::Map(store) => Some(store),
            Collection::List(_) => None,
        }
    }

    /// The page as a list, if it was not mapified.
    pub fn as_list(&self) -> Option<&[T]> {
        match self {
            Collection::List(items) => Some(items),
            Collection::Map(_) => None,
        }
    }

    /// The values in order, dropping keys.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Collection::List(items) => items,
            Collection::Map(store) => store.into_values(),
        }
    }
}

/// Maps a single-record payload.
pub fn map_one<T: Record>(payload: Value, raw: bool, context: &T::Context) -> serde_json::Result<Mapped<T>> {
    if raw {
        Ok(Mapped::Raw(payload))
    } else {
        T::from_payload(payload, context).map(Mapped::Record)
    }
}

/// Maps a page's elements according to `raw` and `mapify`.
pub fn map_page<T: PageRecord>(
    items: Vec<Value>,
    raw: bool,
    mapify: bool,
    context: &T::Context,
) -> serde_json::Result<Collection<Mapped<T>>> {
    if raw {
        collect_raw::<T>(items, mapify)
    } else {
        Ok(collect(records::<T>(items, context)?, mapify))
    }
}

/// Pulls the element array out of a page payload, e.g. `servers`.
pub(crate) fn page_items(mut body: Value, field: &str) -> serde_json::Result<Vec<Value>> {
    match body.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(serde_json::Error::custom(format!(
            "expected `{}` to be an array, found {}",
            field, other
        ))),
        None => Err(serde_json::Error::custom(format!("missing field `{}`", field))),
    }
}

/// Decodes every element. Fails on the first bad one.
pub(crate) fn records<T: Record>(items: Vec<Value>, context: &T::Context) -> serde_json::Result<Vec<T>> {
    items
        .into_iter()
        .map(|item| T::from_payload(item, context))
        .collect()
}

pub(crate) fn collect<T: PageRecord>(records: Vec<T>, mapify: bool) -> Collection<Mapped<T>> {
    if mapify {
        Collection::Map(
            records
                .into_iter()
                .map(|record| (record.key().to_string(), Mapped::Record(record)))
                .collect(),
        )
    } else {
        Collection::List(records.into_iter().map(Mapped::Record).collect())
    }
}

pub(crate) fn collect_raw<T: PageRecord>(items: Vec<Value>, mapify: bool) -> serde_json::Result<Collection<Mapped<T>>> {
    if !mapify {
        return Ok(Collection::List(items.into_iter().map(Mapped::Raw).collect()));
    }
    let mut store = Store::new();
    for item in items {
        let key = T::payload_key(&item)
            .ok_or_else(|| serde_json::Error::custom("page element has no id"))?
            .to_string();
        store.insert(key, Mapped::Raw(item));
    }
    Ok(Collection::Map(store))
}
