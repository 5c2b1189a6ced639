//! Integration tests using wiremock to simulate the directory API.

use serde_json::{json, Value};
use servers_space::{
    Client, ClientOptionsUpdate, Collection, Error, FetchOptions, Mapped, MultiFetchOptions,
    UsageError,
};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn guild_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "member_count": 42,
        "tags": ["gaming"],
        "created_at": 1514764800000i64,
        "updated_at": 1546300800000i64,
        "public": true,
        "compliance": true,
        "icon_child_friendly": true,
        "icon": null,
        "short_description": "A guild",
        "full_description": null,
        "vanity": null,
        "owners": [user_json("1", "owner")]
    })
}

fn user_json(id: &str, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "discriminator": "0001",
        "avatar": "https://cdn.discordapp.com/avatars/1/a.png",
        "short_description": null
    })
}

fn client_for(server: &MockServer, options: ClientOptionsUpdate) -> Client {
    Client::builder()
        .base_url(server.uri())
        .unwrap()
        .options(options)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_fetch_guilds_mapified_by_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .and(query_param("page", "1"))
        .and(query_param("reverseSort", "false"))
        .and(query_param_is_missing("sortBy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "servers": [guild_json("10", "ten"), guild_json("20", "twenty"), guild_json("10", "TEN")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());
    let guilds = client.fetch_guilds(MultiFetchOptions::new()).await.unwrap();

    let store = guilds.as_map().expect("pages are mapified by default");
    assert_eq!(store.len(), 2);
    assert_eq!(store.keys().cloned().collect::<Vec<_>>(), vec!["10", "20"]);
    assert_eq!(
        store.get("10").and_then(Mapped::record).map(|g| g.name.as_str()),
        Some("TEN")
    );
    assert!(client.cache().guilds().is_empty());
}

#[tokio::test]
async fn test_fetch_guilds_sorted_raw_list() {
    let mock_server = MockServer::start().await;
    let servers = vec![guild_json("3", "three"), json!({ "id": "4", "anything": "goes" })];

    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .and(query_param("page", "2"))
        .and(query_param("reverseSort", "true"))
        .and(query_param("sortBy", "created_at"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "servers": servers })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());
    let page = client
        .fetch_guilds(
            MultiFetchOptions::new()
                .page(2)
                .reverse(true)
                .sort_by("created_at")
                .raw(true)
                .mapify(false),
        )
        .await
        .unwrap();

    match page {
        Collection::List(items) => {
            let raw: Vec<Value> = items.into_iter().filter_map(|m| m.raw().cloned()).collect();
            assert_eq!(raw, servers);
        }
        other => panic!("Expected a list, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_guild_cache_overwrites_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers/2001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(guild_json("2001", "Rustaceans")))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());

    let guild = client
        .fetch_guild("2001", FetchOptions::new().cache(true))
        .await
        .unwrap();
    assert_eq!(guild.record().map(|g| g.id.as_str()), Some("2001"));
    assert_eq!(client.cache().guilds().len(), 1);

    client
        .fetch_guild("2001", FetchOptions::new().cache(true))
        .await
        .unwrap();
    let cache = client.cache();
    assert_eq!(cache.guilds().len(), 1);
    assert_eq!(
        cache.guilds().get("2001").map(|g| g.name.as_str()),
        Some("Rustaceans")
    );
}

#[tokio::test]
async fn test_fetch_own_guild_uses_configured_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers/555"))
        .respond_with(ResponseTemplate::new(200).set_body_json(guild_json("555", "Mine")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new().guild_id("555"));
    let guild = client.fetch_own_guild(FetchOptions::new()).await.unwrap();
    assert_eq!(guild.record().map(|g| g.name.as_str()), Some("Mine"));
}

#[tokio::test]
async fn test_missing_id_fails_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());

    let result = client.fetch_own_guild(FetchOptions::new()).await;
    assert!(matches!(result, Err(Error::Usage(UsageError::MissingId))));

    let result = client.fetch_user("", FetchOptions::new()).await;
    assert!(matches!(result, Err(Error::Usage(UsageError::MissingId))));
}

#[tokio::test]
async fn test_rate_limited_ignores_body_code() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/statistics"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("x-ratelimit-limit", "5")
                .insert_header("retry-after", "1")
                .set_body_json(json!({ "code": 429, "message": "Too many requests" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new().cache(true));
    let result = client.fetch_stats(FetchOptions::new()).await;

    match result {
        Err(Error::RateLimited(limit)) => {
            assert_eq!(limit.limit, Some(5));
            assert_eq!(limit.retry_after, Some(1));
            assert_eq!(
                limit.to_string(),
                "Endpoint /v1/statistics Ratelimited, 5 times per 1 second"
            );
        }
        other => panic!("Expected RateLimited, got {:?}", other),
    }
    assert!(client.cache().stats().is_empty());
}

#[tokio::test]
async fn test_rate_limited_with_plain_text_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());
    let err = client
        .fetch_guilds(MultiFetchOptions::new())
        .await
        .unwrap_err();

    assert!(err.is_rate_limited());
    assert_eq!(
        err.to_string(),
        "Endpoint /v1/servers Ratelimited, NaN times per NaN seconds"
    );
}

#[tokio::test]
async fn test_embedded_failure_code_on_ok_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers/404"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 404, "message": "not found" })),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new().cache(true));
    let err = client
        .fetch_guild("404", FetchOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RequestFailed { .. }));
    assert_eq!(err.to_string(), "200 not found");
    assert!(client.cache().guilds().is_empty());
}

#[tokio::test]
async fn test_fetch_upvotes_requires_token_before_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upvotes": [] })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new().guild_id("2001"));
    let result = client.fetch_own_upvotes(MultiFetchOptions::new()).await;

    assert!(matches!(result, Err(Error::Usage(UsageError::MissingToken))));
}

#[tokio::test]
async fn test_fetch_upvotes_authorized_and_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers/2001/upvotes"))
        .and(header("authorization", "guild-secret"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "upvotes": [
                { "timestamp": 1546300800000i64, "user": user_json("77", "first") },
                { "timestamp": 1546300900000i64, "user": user_json("78", "second") }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(
        &mock_server,
        ClientOptionsUpdate::new().guild_id("2001").guild_token("guild-secret"),
    );
    let upvotes = client
        .fetch_own_upvotes(MultiFetchOptions::new().cache(true).mapify(false))
        .await
        .unwrap();

    let upvotes: Vec<_> = upvotes.into_vec().into_iter().filter_map(Mapped::into_record).collect();
    assert_eq!(upvotes.len(), 2);
    assert!(upvotes.iter().all(|u| u.guild_id == "2001"));
    assert_eq!(upvotes[1].user.tag(), "second#0001");

    let cache = client.cache();
    assert_eq!(cache.users().keys().cloned().collect::<Vec<_>>(), vec!["77", "78"]);
}

#[tokio::test]
async fn test_per_call_token_overrides_client_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers/9/upvotes"))
        .and(header("authorization", "per-call"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upvotes": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new().guild_token("client"));
    let upvotes = client
        .fetch_upvotes("9", MultiFetchOptions::new().guild_token("per-call"))
        .await
        .unwrap();
    assert!(upvotes.is_empty());
}

#[tokio::test]
async fn test_stats_history_is_bounded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": 100,
            "users": 250,
            "tags": 12
        })))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(
        &mock_server,
        ClientOptionsUpdate::new().cache(true).stats_limit(2),
    );

    for _ in 0..3 {
        let stats = client.fetch_stats(FetchOptions::new()).await.unwrap();
        assert_eq!(stats.record().map(|s| s.guild_user_total()), Some(350));
    }

    let cache = client.cache();
    assert_eq!(cache.stats().len(), 2);
    assert_eq!(cache.stats().latest().map(|s| s.tags), Some(12));
}

#[tokio::test]
async fn test_raw_user_is_cached_as_record() {
    let mock_server = MockServer::start().await;
    let payload = user_json("235593018332282884", "iREDMe");

    Mock::given(method("GET"))
        .and(path("/v1/users/235593018332282884"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new().cache(true));
    let user = client
        .fetch_user("235593018332282884", FetchOptions::new().raw(true))
        .await
        .unwrap();

    assert_eq!(user.raw(), Some(&payload));
    assert_eq!(
        client
            .cache()
            .users()
            .get("235593018332282884")
            .map(|u| u.tag()),
        Some("iREDMe#0001".to_string())
    );
    assert_eq!(
        client.with_cache(|cache| cache.users().get("235593018332282884").map(|u| u.raw.clone())),
        Some(payload)
    );
}

#[tokio::test]
async fn test_fetch_guilds_of_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/1/servers"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [guild_json("31", "a"), guild_json("32", "b")]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());
    let guilds = client
        .fetch_guilds_of_user("1", MultiFetchOptions::new().cache(true))
        .await
        .unwrap();

    assert_eq!(guilds.len(), 2);
    assert_eq!(
        client.cache().guilds().keys().cloned().collect::<Vec<_>>(),
        vec!["31", "32"]
    );
}

#[tokio::test]
async fn test_version_layering() {
    let mock_server = MockServer::start().await;

    for version in ["/v2/users/1", "/v3/users/1"] {
        Mock::given(method("GET"))
            .and(path(version))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json("1", "ferris")))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let client = client_for(&mock_server, ClientOptionsUpdate::new());
    client
        .fetch_user("1", FetchOptions::new().version(2))
        .await
        .unwrap();

    client.edit(&ClientOptionsUpdate::new().version(3));
    client.fetch_user("1", FetchOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_default_user_agent_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/statistics"))
        .and(header(
            "user-agent",
            concat!("servers-space/", env!("CARGO_PKG_VERSION")),
        ))
        .and(header("x-client", "tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": 1,
            "users": 1,
            "tags": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .default_header("X-Client", "tests")
        .unwrap()
        .build()
        .unwrap();

    client.fetch_stats(FetchOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_invalid_json_is_deserialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("invalid json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());
    let result = client.fetch_guild("1", FetchOptions::new()).await;

    match result {
        Err(Error::DeserializationFailed {
            raw_response,
            status,
            ..
        }) => {
            assert_eq!(status.as_u16(), 200);
            assert_eq!(raw_response, "invalid json");
        }
        other => panic!("Expected DeserializationFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_page_leaves_cache_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [guild_json("1", "fine"), { "id": 2 }]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new().cache(true));
    let result = client.fetch_guilds(MultiFetchOptions::new()).await;

    assert!(matches!(result, Err(Error::DeserializationFailed { .. })));
    assert!(client.cache().guilds().is_empty());
}

#[tokio::test]
async fn test_network_error() {
    let client = Client::builder()
        .base_url("http://127.0.0.1:1")
        .unwrap()
        .build()
        .unwrap();

    let result = client.fetch_stats(FetchOptions::new()).await;
    assert!(matches!(result, Err(Error::Network(_))));
}

#[tokio::test]
async fn test_concurrent_fetches_share_cache() {
    let mock_server = MockServer::start().await;

    for id in ["1", "2"] {
        Mock::given(method("GET"))
            .and(path(format!("/v1/servers/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(guild_json(id, id)))
            .mount(&mock_server)
            .await;
    }

    let client = client_for(&mock_server, ClientOptionsUpdate::new().cache(true));
    let other = client.clone();

    let (first, second) = tokio::join!(
        client.fetch_guild("1", FetchOptions::new()),
        other.fetch_guild("2", FetchOptions::new()),
    );
    first.unwrap();
    second.unwrap();

    let cache = client.cache();
    assert_eq!(cache.guilds().len(), 2);
    assert!(cache.guilds().contains_key("1") && cache.guilds().contains_key("2"));
}

#[tokio::test]
async fn test_cache_snapshot_does_not_block_client() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/users/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("1", "kept")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, ClientOptionsUpdate::new());
    let before = client.cache();

    client.edit(&ClientOptionsUpdate::new().stats_limit(2));
    client
        .fetch_user("1", FetchOptions::new().cache(true))
        .await
        .unwrap();

    assert!(before.users().is_empty());
    assert_eq!(before.stats().limit(), 10);
    assert_eq!(client.with_cache(|cache| cache.users().len()), 1);
    assert_eq!(client.cache().stats().limit(), 2);
}
