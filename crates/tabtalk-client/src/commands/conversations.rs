use tabtalk_shared::{ConversationKind, RecordId};
use tabtalk_store::{Conversation, Group, Message, NewConversation, NewGroup};
use tracing::{debug, info};

use crate::error::Result;
use crate::instance::ChatInstance;

/// Start a conversation between the signed-in user and `participants`.
///
/// The signed-in user is always a participant. Group conversations get a
/// generated avatar.
pub async fn start_conversation(
    instance: &ChatInstance,
    participants: Vec<RecordId>,
    kind: ConversationKind,
    group_name: Option<String>,
) -> Result<Conversation> {
    let inner = instance.inner();
    let user = inner.signed_in_user()?;

    let participants = with_member(user.id.clone(), participants);
    let group_avatar = group_name
        .as_deref()
        .map(|name| super::avatar_url(name, "random"));
    let draft = NewConversation {
        participants,
        kind,
        group_name,
        group_avatar,
        ..Default::default()
    };

    let conversation = inner
        .store
        .call(move |db| db.create_conversation(draft))
        .await?;
    info!(conversation = %conversation.id.short(), ?kind, "conversation started");

    inner.refresh().await?;
    Ok(conversation)
}

/// Make `conversation_id` the active conversation, mark it read, and return
/// its message window.
pub async fn open_conversation(
    instance: &ChatInstance,
    conversation_id: &RecordId,
) -> Result<Vec<Message>> {
    let inner = instance.inner();
    let user = inner.signed_in_user()?;

    let id = conversation_id.clone();
    inner
        .store
        .call(move |db| db.mark_conversation_read(&id, &user.id))
        .await?;
    inner.lock_state()?.active_conversation = Some(conversation_id.clone());
    debug!(conversation = %conversation_id.short(), "conversation opened");

    Ok(inner.refresh().await?.messages)
}

/// The signed-in user's conversations, most recent activity first.
pub async fn list_conversations(instance: &ChatInstance) -> Result<Vec<Conversation>> {
    let user = instance.inner().signed_in_user()?;
    instance
        .store()
        .call(move |db| db.list_conversations_for_user(&user.id))
        .await
}

/// Create a group administered by the signed-in user, with its group
/// conversation.
pub async fn create_group(
    instance: &ChatInstance,
    name: &str,
    members: Vec<RecordId>,
) -> Result<(Group, Conversation)> {
    let inner = instance.inner();
    let user = inner.signed_in_user()?;

    let members = with_member(user.id.clone(), members);
    let avatar = super::avatar_url(name, "random");
    let group = NewGroup {
        name: name.to_string(),
        avatar: Some(avatar.clone()),
        members: members.clone(),
        admin: user.id,
    };
    let conversation = NewConversation {
        participants: members,
        kind: ConversationKind::Group,
        group_name: Some(name.to_string()),
        group_avatar: Some(avatar),
        ..Default::default()
    };

    let created = inner
        .store
        .call(move |db| {
            let group = db.create_group(group)?;
            let conversation = db.create_conversation(conversation)?;
            Ok((group, conversation))
        })
        .await?;
    info!(group = %created.0.id.short(), members = created.0.members.len(), "group created");

    inner.refresh().await?;
    Ok(created)
}

/// Groups the signed-in user belongs to.
pub async fn list_groups(instance: &ChatInstance) -> Result<Vec<Group>> {
    let user = instance.inner().signed_in_user()?;
    instance
        .store()
        .call(move |db| db.list_groups_for_user(&user.id))
        .await
}

fn with_member(member: RecordId, mut others: Vec<RecordId>) -> Vec<RecordId> {
    others.retain(|id| *id != member);
    others.insert(0, member);
    others
}
