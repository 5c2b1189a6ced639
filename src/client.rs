//! The directory API client.
//!
//! [`Client`] is the main entry point. Every fetch resolves its options,
//! issues one GET, classifies the response, then maps and optionally caches
//! the result. Use [`ClientBuilder`] to point the client somewhere other than
//! the public API or to add default headers.

use crate::{
    cache::Cache,
    classify,
    error::UsageError,
    mapper::{self, Collection, Mapped, PageRecord, Record},
    metadata::RequestMetadata,
    models::{Guild, Stats, Upvote, User},
    options::{
        ClientOptions, ClientOptionsUpdate, EffectiveFetchOptions, EffectiveMultiFetchOptions,
        FetchOptions, MultiFetchOptions, Resolve,
    },
    response::Payload,
    Error, Result,
};
use http::{header, HeaderMap, HeaderName, HeaderValue};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Origin of the public directory API.
pub const API_ORIGIN: &str = "https://api.serverlist.space";

const USER_AGENT: &str = concat!("servers-space/", env!("CARGO_PKG_VERSION"));

/// A client for the serverlist.space directory API.
///
/// The client is a cheap handle: clones share the same connection pool,
/// options and cache, and calls may run concurrently.
///
/// # Examples
///
/// ```no_run
/// use servers_space::{Client, ClientOptionsUpdate, FetchOptions, MultiFetchOptions};
///
/// # async fn example() -> Result<(), servers_space::Error> {
/// let client = Client::with_options(
///     ClientOptionsUpdate::new().guild_id("2001").guild_token("secret").cache(true),
/// )?;
///
/// let guild = client.fetch_own_guild(FetchOptions::new()).await?;
/// println!("{:?}", guild.record().map(|g| g.name.as_str()));
///
/// let upvotes = client.fetch_own_upvotes(MultiFetchOptions::new().mapify(false)).await?;
/// for upvote in upvotes.iter().filter_map(|m| m.record()) {
///     println!("{} has upvoted this month!", upvote.user.tag());
/// }
///
/// assert!(client.cache().guilds().contains_key("2001"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
    options: RwLock<ClientOptions>,
    cache: RwLock<Cache>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Creates a client for the public API with default options.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Creates a client for the public API with the given options.
    pub fn with_options(options: ClientOptionsUpdate) -> Result<Self> {
        ClientBuilder::new().options(options).build()
    }

    /// The API origin requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.inner.base_url
    }

    /// A snapshot of the current client options.
    pub fn options(&self) -> ClientOptions {
        self.inner.options.read().clone()
    }

    /// A snapshot of the cached guilds, users and statistics.
    ///
    /// The snapshot is detached from the client: fetches made afterwards do
    /// not show up in it. Use [`with_cache`](Self::with_cache) to read without
    /// copying.
    pub fn cache(&self) -> Cache {
        self.inner.cache.read().clone()
    }

    /// Runs `f` with read access to the live cache and returns its result.
    ///
    /// The cache stays locked while `f` runs, so `f` must not call back into
    /// this client.
    ///
    /// ```no_run
    /// # use servers_space::Client;
    /// # fn example() -> Result<(), servers_space::Error> {
    /// let client = Client::new()?;
    /// let cached = client.with_cache(|cache| cache.guilds().len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_cache<R>(&self, f: impl FnOnce(&Cache) -> R) -> R {
        f(&self.inner.cache.read())
    }

    /// Applies `update` on top of the current options and returns the result.
    ///
    /// Calls made afterwards pick up the new `version`, `guild_token` and
    /// `cache` for any field they leave unset. Lowering `stats_limit` drops the
    /// oldest cached statistics.
    pub fn edit(&self, update: &ClientOptionsUpdate) -> ClientOptions {
        let mut options = self.inner.options.write();
        let edited = options.resolve(update);
        self.install(&mut options, edited)
    }

    /// Like [`edit`](Self::edit), but reads the update from untyped JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] if the update is malformed; the current options
    /// are left untouched.
    ///
    /// ```no_run
    /// # use servers_space::Client;
    /// # fn example() -> Result<(), servers_space::Error> {
    /// let client = Client::new()?;
    /// assert!(client.edit_json(&serde_json::json!({ "guildID": 123 })).is_err());
    /// client.edit_json(&serde_json::json!({ "guildID": "123" }))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn edit_json(&self, update: &Value) -> Result<ClientOptions> {
        let update = ClientOptionsUpdate::from_json(update)?;
        Ok(self.edit(&update))
    }

    /// Applies `update` on top of the library defaults, discarding earlier edits.
    pub fn reset(&self, update: &ClientOptionsUpdate) -> ClientOptions {
        let mut options = self.inner.options.write();
        let edited = ClientOptions::default().resolve(update);
        self.install(&mut options, edited)
    }

    fn install(&self, current: &mut ClientOptions, edited: ClientOptions) -> ClientOptions {
        if edited.stats_limit != current.stats_limit {
            self.inner.cache.write().set_stats_limit(edited.stats_limit);
        }
        tracing::debug!(
            version = edited.version,
            cache = edited.cache,
            stats_limit = edited.stats_limit,
            "Client options updated"
        );
        *current = edited.clone();
        edited
    }

    /// Issues a single GET and classifies the response.
    ///
    /// This is the transport underneath every `fetch_*` method. It never
    /// retries; a `429` comes back as [`Error::RateLimited`] and a failure
    /// `code` in the body as [`Error::RequestFailed`].
    ///
    /// ```no_run
    /// use servers_space::{metadata::RequestMetadata, Client};
    ///
    /// # async fn example() -> Result<(), servers_space::Error> {
    /// let client = Client::new()?;
    /// let metadata = RequestMetadata::new("/servers", 1).with_query_param("page", 2);
    /// let payload = client.call(metadata).await?;
    /// println!("{} after {:?}", payload.status, payload.latency);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn call(&self, metadata: RequestMetadata) -> Result<Payload> {
        let start_time = Instant::now();
        let response = self.execute_request(&metadata).await?;
        self.parse_response(response, &metadata, start_time)
            .await
            .inspect_err(|e| {
                tracing::debug!(error = %e, endpoint = %metadata.endpoint(), "Request failed");
            })
    }

    async fn execute_request(&self, metadata: &RequestMetadata) -> Result<reqwest::Response> {
        let url = self.build_url(metadata);

        tracing::debug!(
            url = %url,
            version = metadata.version,
            path = %metadata.path,
            authorized = metadata.headers.contains_key(header::AUTHORIZATION),
            "Executing HTTP request"
        );

        let mut request = self.inner.http_client.get(url);

        for (name, value) in &self.inner.default_headers {
            request = request.header(name, value);
        }

        for (name, value) in &metadata.headers {
            request = request.header(name, value);
        }

        Ok(request.send().await?)
    }

    /// `{origin}/v{version}{path}` followed by the query parameters in order.
    fn build_url(&self, metadata: &RequestMetadata) -> Url {
        let mut url = self.inner.base_url.clone();
        let path = format!("{}{}", url.path().trim_end_matches('/'), metadata.endpoint());
        url.set_path(&path);

        for (key, value) in &metadata.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        url
    }

    async fn parse_response(
        &self,
        response: reqwest::Response,
        metadata: &RequestMetadata,
        start_time: Instant,
    ) -> Result<Payload> {
        let status = response.status();
        let headers = response.headers().clone();

        // Throttled responses are not guaranteed to carry JSON.
        classify::check_rate_limit(status, &headers, metadata.version, &metadata.path)?;

        let raw_body = response.text().await?;
        let latency = start_time.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            endpoint = %metadata.endpoint(),
            "Received HTTP response"
        );

        let body: Value =
            serde_json::from_str(&raw_body).map_err(|e| Error::DeserializationFailed {
                raw_response: raw_body.clone(),
                serde_error: e.to_string(),
                status,
            })?;
        let body = classify::check_body(status, body)?;

        Ok(Payload {
            body,
            raw_body,
            status,
            headers,
            latency,
        })
    }

    /// Fetches a page of guilds.
    ///
    /// Sends `page`, `reverseSort` and, when set, `sortBy`.
    pub async fn fetch_guilds(
        &self,
        options: MultiFetchOptions,
    ) -> Result<Collection<Mapped<Guild>>> {
        let opts = self.resolve_multi(&options);
        let metadata = sorted_page(RequestMetadata::new("/servers", opts.version), &opts);
        let payload = self.call(metadata).await?;
        self.finish_page::<Guild>(payload, "servers", &opts, &(), |cache, guilds| {
            cache.insert_guilds(guilds)
        })
    }

    /// Fetches a single guild.
    pub async fn fetch_guild(&self, id: &str, options: FetchOptions) -> Result<Mapped<Guild>> {
        let opts = self.resolve(&options);
        require_id(id)?;
        let payload = self
            .call(RequestMetadata::new(format!("/servers/{}", id), opts.version))
            .await?;
        self.finish_one::<Guild>(payload, &opts, &(), |cache, guild| {
            cache.insert_guilds([guild])
        })
    }

    /// Fetches the guild configured as [`ClientOptions::guild_id`].
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::MissingId`] if no guild id is configured.
    pub async fn fetch_own_guild(&self, options: FetchOptions) -> Result<Mapped<Guild>> {
        let id = self.own_guild_id()?;
        self.fetch_guild(&id, options).await
    }

    /// Fetches a page of the guilds a user lists.
    pub async fn fetch_guilds_of_user(
        &self,
        id: &str,
        options: MultiFetchOptions,
    ) -> Result<Collection<Mapped<Guild>>> {
        let opts = self.resolve_multi(&options);
        require_id(id)?;
        let metadata = sorted_page(
            RequestMetadata::new(format!("/users/{}/servers", id), opts.version),
            &opts,
        );
        let payload = self.call(metadata).await?;
        self.finish_page::<Guild>(payload, "servers", &opts, &(), |cache, guilds| {
            cache.insert_guilds(guilds)
        })
    }

    /// Fetches the site statistics.
    ///
    /// With caching on, the snapshot is appended to the statistics history.
    pub async fn fetch_stats(&self, options: FetchOptions) -> Result<Mapped<Stats>> {
        let opts = self.resolve(&options);
        let payload = self
            .call(RequestMetadata::new("/statistics", opts.version))
            .await?;
        self.finish_one::<Stats>(payload, &opts, &(), |cache, stats| cache.push_stats(stats))
    }

    /// Fetches a page of a guild's upvotes for the current month.
    ///
    /// Requires a guild token, per call or from [`ClientOptions::guild_token`].
    /// With caching on, each upvoting user is written to the user cache.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::MissingToken`] without sending anything if no
    /// token resolves.
    pub async fn fetch_upvotes(
        &self,
        id: &str,
        options: MultiFetchOptions,
    ) -> Result<Collection<Mapped<Upvote>>> {
        let opts = self.resolve_multi(&options);
        let token = opts
            .guild_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(UsageError::MissingToken)?;
        require_id(id)?;

        let metadata = RequestMetadata::new(format!("/servers/{}/upvotes", id), opts.version)
            .with_authorization(token)?
            .with_query_param("page", opts.page);
        let payload = self.call(metadata).await?;
        self.finish_page::<Upvote>(payload, "upvotes", &opts, id, |cache, upvotes| {
            cache.insert_users(upvotes.into_iter().map(|upvote| upvote.user))
        })
    }

    /// Fetches upvotes of the guild configured as [`ClientOptions::guild_id`].
    pub async fn fetch_own_upvotes(
        &self,
        options: MultiFetchOptions,
    ) -> Result<Collection<Mapped<Upvote>>> {
        let id = self.own_guild_id()?;
        self.fetch_upvotes(&id, options).await
    }

    /// Fetches a user.
    pub async fn fetch_user(&self, id: &str, options: FetchOptions) -> Result<Mapped<User>> {
        let opts = self.resolve(&options);
        require_id(id)?;
        let payload = self
            .call(RequestMetadata::new(format!("/users/{}", id), opts.version))
            .await?;
        self.finish_one::<User>(payload, &opts, &(), |cache, user| cache.insert_users([user]))
    }

    fn resolve(&self, options: &FetchOptions) -> EffectiveFetchOptions {
        self.inner.options.read().fetch_defaults().resolve(options)
    }

    fn resolve_multi(&self, options: &MultiFetchOptions) -> EffectiveMultiFetchOptions {
        self.inner
            .options
            .read()
            .multi_fetch_defaults()
            .resolve(options)
    }

    fn own_guild_id(&self) -> Result<String> {
        let id = self.inner.options.read().guild_id.clone();
        id.filter(|id| !id.is_empty())
            .ok_or_else(|| UsageError::MissingId.into())
    }

    /// Maps a single-record payload, caching the typed record when asked to.
    ///
    /// Mapping happens in full before the cache is touched.
    fn finish_one<T: Record>(
        &self,
        mut payload: Payload,
        opts: &EffectiveFetchOptions,
        context: &T::Context,
        write: impl FnOnce(&mut Cache, T),
    ) -> Result<Mapped<T>> {
        let body = std::mem::take(&mut payload.body);
        let cached = if opts.cache {
            Some(T::from_payload(body.clone(), context).map_err(|e| payload.decode_error(e))?)
        } else {
            None
        };
        let mapped = mapper::map_one::<T>(body, opts.raw, context).map_err(|e| payload.decode_error(e))?;

        if let Some(record) = cached {
            write(&mut *self.inner.cache.write(), record);
        }
        Ok(mapped)
    }

    /// Page counterpart of [`finish_one`](Self::finish_one).
    fn finish_page<T: PageRecord>(
        &self,
        mut payload: Payload,
        field: &str,
        opts: &EffectiveMultiFetchOptions,
        context: &T::Context,
        write: impl FnOnce(&mut Cache, Vec<T>),
    ) -> Result<Collection<Mapped<T>>> {
        let body = std::mem::take(&mut payload.body);
        let items = mapper::page_items(body, field).map_err(|e| payload.decode_error(e))?;
        let cached = if opts.cache {
            Some(mapper::records::<T>(items.clone(), context).map_err(|e| payload.decode_error(e))?)
        } else {
            None
        };
        let page = mapper::map_page::<T>(items, opts.raw, opts.mapify, context)
            .map_err(|e| payload.decode_error(e))?;

        if let Some(records) = cached {
            write(&mut *self.inner.cache.write(), records);
        }
        Ok(page)
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(UsageError::MissingId.into());
    }
    Ok(())
}

/// Adds the paging and server-side sort parameters of guild listings.
fn sorted_page(metadata: RequestMetadata, opts: &EffectiveMultiFetchOptions) -> RequestMetadata {
    metadata
        .with_query_param("page", opts.page)
        .with_query_param("reverseSort", opts.reverse)
        .with_optional_query_param("sortBy", opts.sort_by.as_deref())
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use servers_space::{ClientBuilder, ClientOptionsUpdate};
///
/// # fn example() -> Result<(), servers_space::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.serverlist.space")?
///     .default_header("X-Client", "my-bot/1.0")?
///     .options(ClientOptionsUpdate::new().version(1).cache(true))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    options: ClientOptionsUpdate,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        Self {
            base_url: None,
            default_headers,
            options: ClientOptionsUpdate::default(),
        }
    }

    /// Sets the API origin. Defaults to [`API_ORIGIN`].
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the initial client options, layered over the library defaults.
    pub fn options(mut self, options: ClientOptionsUpdate) -> Self {
        self.options = options;
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build(self) -> Result<Client> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(API_ORIGIN)?,
        };

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let options = ClientOptions::default().resolve(&self.options);
        let cache = Cache::new(options.stats_limit);

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                options: RwLock::new(options),
                cache: RwLock::new(cache),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
