//! Demo data for an empty store.
//!
//! Creates five contacts, one direct conversation with each, a "Tech Team"
//! group conversation with its group record, and back-dated messages. Runs
//! through the ordinary store operations, so it obeys every constraint.

use chrono::{DateTime, Duration, Utc};
use tabtalk_shared::constants::EMPTY_CONVERSATION_PREVIEW;
use tabtalk_shared::credentials::hash_password;
use tabtalk_shared::{now_millis, ConversationKind, MessageKind, MessageStatus, RecordId};
use tabtalk_store::{
    Conversation, ConversationPatch, Database, Group, NewConversation, NewGroup, NewMessage,
    NewUser, Result, User,
};

const DEMO_PASSWORD: &str = "password123";
const GROUP_NAME: &str = "Tech Team";
const GROUP_AVATAR: &str = "https://ui-avatars.com/api/?name=Tech+Team&background=ff9800&color=fff";

struct Contact {
    username: &'static str,
    email: &'static str,
    about: &'static str,
    color: &'static str,
}

const CONTACTS: [Contact; 5] = [
    Contact {
        username: "Sarah Johnson",
        email: "sarah@example.com",
        about: "Available",
        color: "25d366",
    },
    Contact {
        username: "Mike Chen",
        email: "mike@example.com",
        about: "At work",
        color: "34b7f1",
    },
    Contact {
        username: "Emma Wilson",
        email: "emma@example.com",
        about: "Hey there! I'm using ChatApp",
        color: "e91e63",
    },
    Contact {
        username: "David Brown",
        email: "david@example.com",
        about: "Busy",
        color: "9c27b0",
    },
    Contact {
        username: "Lisa Anderson",
        email: "lisa@example.com",
        about: "Online",
        color: "f44336",
    },
];

/// (content, seconds before now). Even lines come from the contact, odd
/// lines from the current user.
const DIRECT_LINES: [&[(&str, i64)]; 5] = [
    &[
        ("Hey! How are you doing?", 3_600),
        ("I wanted to discuss the project we talked about yesterday", 3_500),
        ("Are you free for a quick call?", 3_400),
    ],
    &[
        ("Good morning! ☀️", 7_200),
        ("Did you see the latest updates?", 7_000),
        ("Let me know when you're ready to review", 6_800),
        ("Thanks for your help! 🙏", 6_600),
    ],
    &[
        ("Hi there! 👋", 86_400),
        ("I have some exciting news to share!", 86_000),
        ("Can we meet tomorrow?", 85_000),
        ("Looking forward to it! 😊", 84_000),
    ],
    &[
        ("Hello!", 172_800),
        ("I need your opinion on something", 170_000),
        ("It's about the design mockups", 168_000),
        ("Let me send you the files", 165_000),
    ],
    &[
        ("Hey! 👋", 259_200),
        ("How was your weekend?", 255_000),
        ("Mine was great! Went hiking 🏔️", 250_000),
        ("You should join us next time!", 245_000),
    ],
];

/// (contact index, content, seconds before now).
const GROUP_LINES: [(usize, &str, i64); 8] = [
    (0, "Welcome to the Tech Team group! 🎉", 604_800),
    (1, "Thanks for adding me!", 600_000),
    (2, "Let's discuss the new features", 590_000),
    (3, "I've prepared a presentation", 580_000),
    (4, "Great! When can we schedule a meeting?", 570_000),
    (0, "How about Friday at 2 PM?", 560_000),
    (1, "Works for me! ✅", 555_000),
    (2, "Perfect! See you all then 👋", 550_000),
];

/// What [`seed_demo_data`] created.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub users: Vec<User>,
    pub conversations: Vec<Conversation>,
    pub group: Group,
}

/// Fill the store with demo data around `current_user`.
///
/// Does nothing and returns `None` when the store already holds more than
/// one user. Contacts that already exist (matched by email) are reused.
pub fn seed_demo_data(db: &mut Database, current_user: &RecordId) -> Result<Option<SeedReport>> {
    if db.list_users()?.len() > 1 {
        tracing::debug!("store already seeded");
        return Ok(None);
    }

    tracing::info!(user = %current_user.short(), "seeding demo data");
    let now = now_millis();

    let mut users = Vec::with_capacity(CONTACTS.len());
    for contact in &CONTACTS {
        let user = match db.get_user_by_email(contact.email)? {
            Some(existing) => existing,
            None => db.create_user(NewUser {
                username: contact.username.to_string(),
                email: contact.email.to_string(),
                password_hash: hash_password(DEMO_PASSWORD),
                avatar: Some(contact_avatar(contact)),
                about: contact.about.to_string(),
            })?,
        };
        users.push(user);
    }

    let mut conversations = Vec::with_capacity(CONTACTS.len() + 1);
    for (contact, lines) in users.iter().zip(DIRECT_LINES) {
        let script: Vec<_> = lines
            .iter()
            .enumerate()
            .map(|(i, (content, ago))| {
                let sender = if i % 2 == 0 { &contact.id } else { current_user };
                (sender.clone(), *content, *ago)
            })
            .collect();

        let conversation = db.create_conversation(NewConversation {
            participants: vec![current_user.clone(), contact.id.clone()],
            kind: ConversationKind::Direct,
            ..Default::default()
        })?;
        conversations.push(play_script(db, conversation, &script, current_user, now)?);
    }

    let mut members = vec![current_user.clone()];
    members.extend(users.iter().map(|u| u.id.clone()));

    let group_script: Vec<_> = GROUP_LINES
        .iter()
        .map(|(who, content, ago)| (users[*who].id.clone(), *content, *ago))
        .collect();
    let conversation = db.create_conversation(NewConversation {
        participants: members.clone(),
        kind: ConversationKind::Group,
        group_name: Some(GROUP_NAME.to_string()),
        group_avatar: Some(GROUP_AVATAR.to_string()),
        ..Default::default()
    })?;
    conversations.push(play_script(db, conversation, &group_script, current_user, now)?);

    let group = db.create_group(NewGroup {
        name: GROUP_NAME.to_string(),
        avatar: Some(GROUP_AVATAR.to_string()),
        members,
        admin: current_user.clone(),
    })?;

    tracing::info!(
        users = users.len(),
        conversations = conversations.len(),
        "demo data seeded"
    );

    Ok(Some(SeedReport {
        users,
        conversations,
        group,
    }))
}

/// Send every scripted line, then leave one unread message unless the
/// current user spoke last.
fn play_script(
    db: &mut Database,
    conversation: Conversation,
    script: &[(RecordId, &str, i64)],
    current_user: &RecordId,
    now: DateTime<Utc>,
) -> Result<Conversation> {
    let Some((last_sender, _, _)) = script.last() else {
        return db.update_conversation(
            &conversation.id,
            ConversationPatch {
                last_message: Some(EMPTY_CONVERSATION_PREVIEW.to_string()),
                ..Default::default()
            },
        );
    };

    for (i, (sender, content, ago)) in script.iter().enumerate() {
        db.send_message(NewMessage {
            conversation_id: conversation.id.clone(),
            sender_id: sender.clone(),
            content: content.to_string(),
            kind: MessageKind::Text,
            media_url: None,
            sent_at: Some(now - Duration::seconds(*ago)),
            status: Some(if i % 2 == 0 {
                MessageStatus::Read
            } else {
                MessageStatus::Delivered
            }),
        })?;
    }

    let unread_count = u32::from(last_sender != current_user);
    db.update_conversation(
        &conversation.id,
        ConversationPatch {
            unread_count: Some(unread_count),
            ..Default::default()
        },
    )
}

fn contact_avatar(contact: &Contact) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background={}&color=fff&size=128",
        contact.username.replace(' ', "+"),
        contact.color
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_with_owner() -> (tempfile::TempDir, Database, User) {
        let dir = tempfile::tempdir().unwrap();
        let mut db = Database::open_at(&dir.path().join("seed.db")).unwrap();
        let owner = db
            .create_user(NewUser {
                username: "Me".to_string(),
                email: "me@example.com".to_string(),
                password_hash: hash_password("secret"),
                avatar: None,
                about: String::new(),
            })
            .unwrap();
        (dir, db, owner)
    }

    #[test]
    fn test_seed_populates_an_empty_store() {
        let (_dir, mut db, owner) = open_with_owner();

        let report = seed_demo_data(&mut db, &owner.id).unwrap().unwrap();

        assert_eq!(report.users.len(), 5);
        assert_eq!(db.list_users().unwrap().len(), 6);

        let conversations = db.list_conversations_for_user(&owner.id).unwrap();
        assert_eq!(conversations.len(), 6);
        // Sarah's conversation is the most recent one.
        assert_eq!(
            conversations[0].last_message.as_deref(),
            Some("Are you free for a quick call?")
        );
        // The group conversation is the oldest.
        let group_conversation = conversations.last().unwrap();
        assert_eq!(group_conversation.kind, ConversationKind::Group);
        assert_eq!(group_conversation.participants.len(), 6);
        assert_eq!(group_conversation.last_message.as_deref(), Some("Perfect! See you all then 👋"));

        assert_eq!(db.list_groups_for_user(&owner.id).unwrap(), vec![report.group]);
    }

    #[test]
    fn test_unread_counts_follow_last_sender() {
        let (_dir, mut db, owner) = open_with_owner();
        seed_demo_data(&mut db, &owner.id).unwrap();

        let conversations = db.list_conversations_for_user(&owner.id).unwrap();
        let unread: Vec<u32> = conversations.iter().map(|c| c.unread_count).collect();

        // Sarah spoke last (3 lines); the other contacts end with our reply;
        // a contact spoke last in the group.
        assert_eq!(unread, vec![1, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_seeded_messages_are_back_dated_and_ordered() {
        let (_dir, mut db, owner) = open_with_owner();
        seed_demo_data(&mut db, &owner.id).unwrap();

        let sarah = db.get_user_by_email("sarah@example.com").unwrap().unwrap();
        let conversation = db
            .list_conversations_for_user(&sarah.id)
            .unwrap()
            .into_iter()
            .find(|c| c.kind == ConversationKind::Direct)
            .unwrap();
        let messages = db.list_messages(&conversation.id, 50).unwrap();

        assert_eq!(messages.len(), 3);
        assert!(messages.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(messages.iter().all(|m| m.timestamp < now_millis()));
        assert_eq!(messages[0].sender_id, sarah.id);
        assert_eq!(messages[1].sender_id, owner.id);
        assert_eq!(messages[0].status, MessageStatus::Read);
        assert_eq!(messages[1].status, MessageStatus::Delivered);
        assert_eq!(conversation.last_message_time, messages[2].timestamp);
    }

    #[test]
    fn test_seed_runs_once() {
        let (_dir, mut db, owner) = open_with_owner();

        assert!(seed_demo_data(&mut db, &owner.id).unwrap().is_some());
        assert!(seed_demo_data(&mut db, &owner.id).unwrap().is_none());
        assert_eq!(db.list_users().unwrap().len(), 6);
    }
}
