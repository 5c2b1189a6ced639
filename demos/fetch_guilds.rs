//! Lists a page of guilds and shows the client cache filling up.
//!
//! Run with: `cargo run --example fetch_guilds`
//!
//! Set `SERVERLIST_GUILD_ID` and `SERVERLIST_TOKEN` to also list this month's
//! upvotes for your guild.

use servers_space::{Client, ClientOptionsUpdate, Error, FetchOptions, MultiFetchOptions};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("servers_space=debug,fetch_guilds=info")
        .init();

    let mut options = ClientOptionsUpdate::new().cache(true);
    if let Ok(id) = std::env::var("SERVERLIST_GUILD_ID") {
        options = options.guild_id(id);
    }
    if let Ok(token) = std::env::var("SERVERLIST_TOKEN") {
        options = options.guild_token(token);
    }
    let client = Client::with_options(options)?;

    println!("=== Guilds, page 1, newest first ===");
    let guilds = client
        .fetch_guilds(MultiFetchOptions::new().sort_by("created_at").mapify(false))
        .await?;
    for guild in guilds.iter().filter_map(|g| g.record()) {
        let owner = guild.owner().map(|o| o.tag()).unwrap_or_default();
        println!("{:<40} {:>8} members  owner {}", guild.name, guild.member_count, owner);
    }

    println!();
    println!("=== Statistics ===");
    match client.fetch_stats(FetchOptions::new()).await {
        Ok(stats) => {
            if let Some(stats) = stats.record() {
                println!(
                    "{} guilds, {} users, {} tags",
                    stats.guilds, stats.users, stats.tags
                );
            }
        }
        Err(Error::RateLimited(limit)) => println!("{limit}"),
        Err(e) => return Err(e),
    }

    if client.options().guild_token.is_some() {
        println!();
        println!("=== Upvotes this month ===");
        let upvotes = client.fetch_own_upvotes(MultiFetchOptions::new()).await?;
        for upvote in upvotes.iter().filter_map(|u| u.record()) {
            println!("{} has upvoted this month!", upvote.user.tag());
        }
    }

    let cache = client.cache();
    println!();
    println!(
        "Cached {} guilds, {} users, {} statistics snapshots",
        cache.guilds().len(),
        cache.users().len(),
        cache.stats().len()
    );

    Ok(())
}
