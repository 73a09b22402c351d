//! # tabtalk-demo
//!
//! Runs two chat instances side by side on one storage file, the way two
//! open tabs of the messenger would, and shows a message written in one
//! reaching the other through the broadcast channel.
//!
//! Configuration comes from the `TABTALK_*` environment variables; set
//! `TABTALK_DB_PATH` to keep the demo away from the default data directory.

use std::time::Duration;

use tabtalk_client::commands::{conversations, identity, messaging};
use tabtalk_client::{BroadcastHub, ChatInstance, ClientConfig};
use tabtalk_shared::ConversationKind;
use tracing::info;

const DEMO_EMAIL: &str = "me@example.com";
const DEMO_PASSWORD: &str = "password123";
const PEER_EMAIL: &str = "sarah@example.com";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tabtalk_client::init_tracing();
    info!("Starting TabTalk demo v{}", env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let hub = BroadcastHub::new(config.broadcast_capacity);
    let mine = ChatInstance::open(&hub, config.clone()).await?;
    let theirs = ChatInstance::open(&hub, config).await?;

    // -----------------------------------------------------------------------
    // 1. Sign in both instances (seeds demo contacts on first run)
    // -----------------------------------------------------------------------
    let me = match identity::login(&mine, DEMO_EMAIL, DEMO_PASSWORD).await {
        Ok(user) => user,
        Err(_) => identity::register(&mine, "Me", DEMO_EMAIL, DEMO_PASSWORD).await?,
    };

    let peer = match identity::login(&theirs, PEER_EMAIL, DEMO_PASSWORD).await {
        Ok(user) => user,
        Err(e) => {
            info!(error = %e, "no demo contact, registering one");
            identity::register(&theirs, "Sarah Johnson", PEER_EMAIL, DEMO_PASSWORD).await?
        }
    };

    // -----------------------------------------------------------------------
    // 2. Both sides open their shared direct conversation
    // -----------------------------------------------------------------------
    let existing = conversations::list_conversations(&mine)
        .await?
        .into_iter()
        .find(|c| c.kind == ConversationKind::Direct && c.has_participant(&peer.id));
    let conversation = match existing {
        Some(c) => c,
        None => {
            conversations::start_conversation(
                &mine,
                vec![peer.id.clone()],
                ConversationKind::Direct,
                None,
            )
            .await?
        }
    };

    conversations::open_conversation(&theirs, &conversation.id).await?;
    conversations::open_conversation(&mine, &conversation.id).await?;

    // -----------------------------------------------------------------------
    // 3. Send from one instance and watch the other refresh
    // -----------------------------------------------------------------------
    let mut views = theirs.views();

    let sent = messaging::send_message(&mine, &format!("Hello from {}!", me.username)).await?;

    tokio::time::timeout(Duration::from_secs(5), views.changed()).await??;
    let view = theirs.snapshot();
    let arrived = view.messages.iter().any(|m| m.id == sent.id);
    info!(
        arrived,
        messages = view.messages.len(),
        unread = view.total_unread(),
        "other instance refreshed"
    );

    // -----------------------------------------------------------------------
    // 4. Sign out; the other instance marks the user offline
    // -----------------------------------------------------------------------
    identity::logout(&mine).await?;
    tokio::time::timeout(Duration::from_secs(5), views.changed()).await??;
    info!(
        offline = theirs.snapshot().offline_users.contains(&me.id),
        "logout observed"
    );

    Ok(())
}
