//! The activity's message board: public threads, announcements, private messages and
//! reactions. Only members of the activity take part.

use super::actions::{MessageOutcome, MessageStep};
use crate::access;
use crate::config::PlatformConfig;
use crate::error::{DomainError, Validator};
use crate::model::{
    Activity, Attachment, Message, MessageId, MessageKind, PinMode, ReactionMode, User,
    ALLOWED_REACTIONS,
};
use chrono::{DateTime, Utc};

pub const MAX_MESSAGE_CHARS: usize = 5000;
pub const MAX_ATTACHMENTS: usize = 5;

fn validate_body(content: &str, attachments: &[Attachment]) -> Result<(), DomainError> {
    let mut v = Validator::new();
    v.length("content", content, 1, MAX_MESSAGE_CHARS);
    v.check(
        attachments.len() <= MAX_ATTACHMENTS,
        "attachments",
        format!("at most {} attachments", MAX_ATTACHMENTS),
    );
    v.finish()
}

impl Activity {
    /// Stores `message` under the next id and returns the stored copy.
    pub(crate) fn push_message(&mut self, mut message: Message) -> Message {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        message.id = id;
        self.messages.insert(id, message.clone());
        message
    }

    /// Members and managers may use the message board.
    pub fn can_message(&self, actor: &User) -> bool {
        self.is_member(actor.id) || access::can_manage_activity(actor, self)
    }

    /// A message `actor` may see. Private messages of others read as missing.
    fn visible_message(&self, actor: &User, id: MessageId) -> Result<&Message, DomainError> {
        self.messages
            .get(&id)
            .filter(|m| m.is_visible_to(actor.id))
            .ok_or_else(|| DomainError::not_found(id.to_string()))
    }

    fn visible_message_mut(&mut self, actor: &User, id: MessageId) -> Result<&mut Message, DomainError> {
        self.messages
            .get_mut(&id)
            .filter(|m| m.is_visible_to(actor.id))
            .ok_or_else(|| DomainError::not_found(id.to_string()))
    }

    fn post(
        &mut self,
        actor: &User,
        kind: MessageKind,
        content: String,
        parent_id: Option<MessageId>,
        attachments: Vec<Attachment>,
        now: DateTime<Utc>,
    ) -> Result<Message, DomainError> {
        match kind {
            MessageKind::Text => {}
            MessageKind::Announcement => {
                if !access::can_facilitate(actor, self) {
                    return Err(DomainError::forbidden("Only facilitators can post announcements"));
                }
            }
            MessageKind::System | MessageKind::Private => {
                return Err(DomainError::invalid("kind", "must be text or announcement"));
            }
        }
        validate_body(&content, &attachments)?;
        if let Some(parent) = parent_id {
            let belongs = self.messages.get(&parent).is_some_and(|m| !m.is_private());
            if !belongs {
                return Err(DomainError::invalid(
                    "parent_id",
                    "Parent message does not belong to this activity",
                ));
            }
        }

        let mut message = Message::new(actor.id, kind, content.trim(), now);
        message.parent_id = parent_id;
        message.attachments = attachments;
        message.is_pinned = kind == MessageKind::Announcement;
        Ok(self.push_message(message))
    }

    fn send_private(
        &mut self,
        actor: &User,
        recipient: crate::model::UserId,
        content: String,
        attachments: Vec<Attachment>,
        now: DateTime<Utc>,
    ) -> Result<Message, DomainError> {
        if recipient == actor.id {
            return Err(DomainError::invalid(
                "recipient_id",
                "Cannot send a private message to yourself",
            ));
        }
        if !self.is_member(recipient) {
            return Err(DomainError::invalid(
                "recipient_id",
                "Recipient is not a participant of this activity",
            ));
        }
        validate_body(&content, &attachments)?;

        let mut message = Message::new(actor.id, MessageKind::Private, content.trim(), now);
        message.recipient_id = Some(recipient);
        message.attachments = attachments;
        Ok(self.push_message(message))
    }

    fn delete_message(&mut self, actor: &User, id: MessageId) -> Result<usize, DomainError> {
        let message = self.visible_message(actor, id)?;
        if !access::can_delete_message(actor, message, self) {
            return Err(DomainError::forbidden("Cannot delete this message"));
        }
        let before = self.messages.len();
        self.messages
            .retain(|key, m| *key != id && m.parent_id != Some(id));
        Ok(before - self.messages.len())
    }

    fn react(
        &mut self,
        actor: &User,
        id: MessageId,
        emoji: &str,
        mode: ReactionMode,
    ) -> Result<Message, DomainError> {
        if !ALLOWED_REACTIONS.contains(&emoji) {
            return Err(DomainError::invalid("emoji", "is not an allowed reaction"));
        }
        let message = self.visible_message_mut(actor, id)?;
        let users = message.reactions.entry(emoji.to_string()).or_default();
        let add = match mode {
            ReactionMode::Add => true,
            ReactionMode::Remove => false,
            ReactionMode::Toggle => !users.contains(&actor.id),
        };
        if add {
            users.insert(actor.id);
        } else {
            users.remove(&actor.id);
        }
        message.reactions.retain(|_, users| !users.is_empty());
        Ok(message.clone())
    }

    /// Applies one message-board operation for `actor`.
    pub(crate) fn apply_message(
        &mut self,
        actor: &User,
        step: MessageStep,
        config: &PlatformConfig,
        now: DateTime<Utc>,
    ) -> Result<MessageOutcome, DomainError> {
        if !self.can_message(actor) {
            return Err(DomainError::forbidden(
                "Only participants can use the activity messages",
            ));
        }

        let outcome = match step {
            MessageStep::Post {
                kind,
                content,
                parent_id,
                attachments,
            } => MessageOutcome::Message(self.post(actor, kind, content, parent_id, attachments, now)?),
            MessageStep::SendPrivate {
                recipient,
                content,
                attachments,
            } => MessageOutcome::Message(self.send_private(actor, recipient, content, attachments, now)?),
            MessageStep::Edit {
                message_id,
                content,
            } => {
                let window = config.edit_window_minutes;
                let message = self.visible_message_mut(actor, message_id)?;
                if !access::can_edit_message(actor, message, now, window) {
                    return Err(DomainError::forbidden(format!(
                        "Messages can only be edited by their author within {} minutes",
                        window
                    )));
                }
                validate_body(&content, &[])?;
                message.content = content.trim().to_string();
                message.edited_at = Some(now);
                MessageOutcome::Message(message.clone())
            }
            MessageStep::Delete { message_id } => {
                MessageOutcome::Deleted(self.delete_message(actor, message_id)?)
            }
            MessageStep::Pin { message_id, mode } => {
                if !access::can_facilitate(actor, self) {
                    return Err(DomainError::forbidden("Only facilitators can pin messages"));
                }
                let message = self.visible_message_mut(actor, message_id)?;
                if message.is_private() {
                    return Err(DomainError::invalid("message_id", "Private messages cannot be pinned"));
                }
                message.is_pinned = match mode {
                    PinMode::Pin => true,
                    PinMode::Unpin => false,
                    PinMode::Toggle => !message.is_pinned,
                };
                MessageOutcome::Message(message.clone())
            }
            MessageStep::React {
                message_id,
                emoji,
                mode,
            } => MessageOutcome::Message(self.react(actor, message_id, &emoji, mode)?),
            MessageStep::MarkRead { message_id } => {
                let message = self.visible_message_mut(actor, message_id)?;
                if message.recipient_id != Some(actor.id) {
                    return Err(DomainError::forbidden(
                        "Only the recipient can mark a message as read",
                    ));
                }
                message.is_read = true;
                MessageOutcome::Message(message.clone())
            }
            MessageStep::ReadPrivate {
                correspondent,
                mark_as_read,
            } => {
                if mark_as_read {
                    for message in self.messages.values_mut() {
                        let from_correspondent =
                            correspondent.map_or(true, |c| message.author_id == c);
                        if message.is_private()
                            && message.recipient_id == Some(actor.id)
                            && from_correspondent
                        {
                            message.is_read = true;
                        }
                    }
                }
                let messages = self
                    .private_messages(actor.id, correspondent)
                    .into_iter()
                    .cloned()
                    .collect();
                MessageOutcome::Private(messages)
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActivityStatus, Participant, ParticipantRole, Role, UserId};

    fn user(id: u32) -> User {
        User::new(UserId(id), format!("u{}", id), Role::Citizen)
    }

    fn activity() -> Activity {
        let now = Utc::now();
        let mut a = Activity::fixture(UserId(1), ActivityStatus::Open, 5);
        a.participants
            .insert(UserId(2), Participant::accepted(UserId(2), now));
        a.participants
            .insert(UserId(3), Participant::accepted(UserId(3), now));
        a.participants
            .insert(UserId(4), Participant::invited(UserId(4), UserId(1), now));
        a.recount();
        a
    }

    fn run(a: &mut Activity, actor: &User, step: MessageStep) -> Result<MessageOutcome, DomainError> {
        a.apply_message(actor, step, &PlatformConfig::default(), Utc::now())
    }

    fn post(a: &mut Activity, actor: &User, kind: MessageKind, parent: Option<MessageId>) -> Result<Message, DomainError> {
        let step = MessageStep::Post {
            kind,
            content: "Hello all".into(),
            parent_id: parent,
            attachments: Vec::new(),
        };
        match run(a, actor, step)? {
            MessageOutcome::Message(m) => Ok(m),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_only_members_post() {
        let mut a = activity();
        let err = post(&mut a, &user(4), MessageKind::Text, None).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(post(&mut a, &user(2), MessageKind::Text, None).is_ok());
    }

    #[test]
    fn test_announcements_are_for_facilitators_and_pinned() {
        let mut a = activity();
        let err = post(&mut a, &user(2), MessageKind::Announcement, None).unwrap_err();
        assert_eq!(err.status_code(), 403);

        a.participants.get_mut(&UserId(2)).unwrap().role = ParticipantRole::Facilitator;
        let announcement = post(&mut a, &user(2), MessageKind::Announcement, None).unwrap();
        assert!(announcement.is_pinned);
        assert!(post(&mut a, &user(2), MessageKind::System, None).is_err());
    }

    #[test]
    fn test_delete_cascades_replies() {
        let mut a = activity();
        let root = post(&mut a, &user(2), MessageKind::Text, None).unwrap();
        post(&mut a, &user(3), MessageKind::Text, Some(root.id)).unwrap();
        post(&mut a, &user(1), MessageKind::Text, Some(root.id)).unwrap();
        let other = post(&mut a, &user(3), MessageKind::Text, None).unwrap();

        let err = run(&mut a, &user(3), MessageStep::Delete { message_id: root.id }).unwrap_err();
        assert_eq!(err.status_code(), 403);

        match run(&mut a, &user(1), MessageStep::Delete { message_id: root.id }).unwrap() {
            MessageOutcome::Deleted(n) => assert_eq!(n, 3),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(a.messages.len(), 1);
        assert!(a.messages.contains_key(&other.id));

        let err = post(&mut a, &user(2), MessageKind::Text, Some(root.id)).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed(_)));
    }

    #[test]
    fn test_private_messages_and_read_marks() {
        let mut a = activity();
        let send = |to: u32| MessageStep::SendPrivate {
            recipient: UserId(to),
            content: "psst".into(),
            attachments: Vec::new(),
        };
        assert!(run(&mut a, &user(2), send(2)).is_err());
        assert!(run(&mut a, &user(2), send(4)).is_err());
        run(&mut a, &user(2), send(3)).unwrap();
        run(&mut a, &user(2), send(3)).unwrap();

        let private_id = *a.messages.keys().next().unwrap();
        let err = run(
            &mut a,
            &user(1),
            MessageStep::React {
                message_id: private_id,
                emoji: "👍".into(),
                mode: ReactionMode::Add,
            },
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        assert_eq!(a.conversations(UserId(3))[0].unread_count, 2);
        let read = run(
            &mut a,
            &user(3),
            MessageStep::ReadPrivate {
                correspondent: Some(UserId(2)),
                mark_as_read: true,
            },
        )
        .unwrap();
        match read {
            MessageOutcome::Private(messages) => assert_eq!(messages.len(), 2),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(a.conversations(UserId(3))[0].unread_count, 0);
        assert_eq!(a.conversations(UserId(2))[0].message_count, 2);
    }

    #[test]
    fn test_reactions() {
        let mut a = activity();
        let m = post(&mut a, &user(2), MessageKind::Text, None).unwrap();
        let react = |emoji: &str, mode| MessageStep::React {
            message_id: m.id,
            emoji: emoji.into(),
            mode,
        };

        assert!(run(&mut a, &user(3), react("🦀", ReactionMode::Add)).is_err());
        run(&mut a, &user(3), react("🎉", ReactionMode::Toggle)).unwrap();
        run(&mut a, &user(2), react("🎉", ReactionMode::Add)).unwrap();
        assert_eq!(a.messages[&m.id].reactions["🎉"].len(), 2);

        run(&mut a, &user(3), react("🎉", ReactionMode::Toggle)).unwrap();
        run(&mut a, &user(2), react("🎉", ReactionMode::Remove)).unwrap();
        assert!(a.messages[&m.id].reactions.is_empty());
    }

    #[test]
    fn test_edit_window_and_system_messages() {
        let mut a = activity();
        let m = post(&mut a, &user(2), MessageKind::Text, None).unwrap();
        let edit = |id| MessageStep::Edit {
            message_id: id,
            content: "Hello everyone".into(),
        };

        assert!(run(&mut a, &user(3), edit(m.id)).is_err());
        run(&mut a, &user(2), edit(m.id)).unwrap();
        assert!(a.messages[&m.id].edited_at.is_some());

        a.messages.get_mut(&m.id).unwrap().created_at = Utc::now() - chrono::Duration::minutes(16);
        assert_eq!(run(&mut a, &user(2), edit(m.id)).unwrap_err().status_code(), 403);

        let system = a.push_message(Message::new(UserId(1), MessageKind::System, "Started", Utc::now()));
        assert_eq!(run(&mut a, &user(1), edit(system.id)).unwrap_err().status_code(), 403);
    }
}
