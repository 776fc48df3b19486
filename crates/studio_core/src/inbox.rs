//! crates/studio_core/src/inbox.rs
//!
//! The contact inbox: public enquiries that an admin reads and deletes.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::bookings::{optional, required};
use crate::domain::{Message, MessageStatus, NewMessage};
use crate::error::{ActionError, ActionResult};
use crate::ports::{CacheInvalidator, DatabaseService, PortError};

const ADMIN_MESSAGES_PATH: &str = "/admin/messages";

/// The contact form as posted by either page variant.
///
/// One variant posts the selected radio under `subject`; the other keeps the
/// radios under `subject_visual` and mirrors the choice into a hidden
/// `subject` input.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub subject_visual: Option<String>,
    pub message: String,
}

impl ContactForm {
    /// Exactly one subject: `subject` wins, the radio value is the fallback.
    pub fn resolved_subject(&self) -> Option<String> {
        optional(self.subject.clone()).or_else(|| optional(self.subject_visual.clone()))
    }

    pub fn validate(self) -> ActionResult<NewMessage> {
        let subject = self.resolved_subject();
        Ok(NewMessage {
            first_name: required(&self.first_name, "first_name")?,
            last_name: required(&self.last_name, "last_name")?,
            email: required(&self.email, "email")?,
            subject: subject.ok_or(ActionError::MissingField("subject"))?,
            message: required(&self.message, "message")?,
            phone: optional(self.phone),
        })
    }
}

#[derive(Clone)]
pub struct InboxService {
    db: Arc<dyn DatabaseService>,
    cache: Arc<dyn CacheInvalidator>,
}

impl InboxService {
    pub fn new(db: Arc<dyn DatabaseService>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { db, cache }
    }

    /// Stores a new enquiry as `unread`.
    pub async fn submit(&self, form: ContactForm) -> ActionResult<Message> {
        let message = form.validate()?;
        let created = self.db.insert_message(message).await.map_err(|e| {
            error!("Failed to store contact message: {:?}", e);
            ActionError::Store("Failed to send message. Please try again.".to_string())
        })?;

        info!(message_id = %created.id, "Contact message received");
        self.cache.revalidate(ADMIN_MESSAGES_PATH);
        Ok(created)
    }

    pub async fn list(&self) -> Vec<Message> {
        match self.db.list_messages().await {
            Ok(messages) => messages,
            Err(e) => {
                error!("Error fetching messages: {:?}", e);
                Vec::new()
            }
        }
    }

    pub async fn unread_count(&self) -> i64 {
        self.db.count_unread_messages().await.unwrap_or_else(|e| {
            error!("Error counting unread messages: {:?}", e);
            0
        })
    }

    /// Marks a message read. Returns whether this call made the transition.
    pub async fn mark_read(&self, id: Uuid) -> ActionResult<bool> {
        let changed = self.db.mark_message_read(id).await.map_err(|e| {
            error!(message_id = %id, "Error updating message: {:?}", e);
            ActionError::Store("Failed to mark as read".to_string())
        })?;
        if changed {
            self.cache.revalidate(ADMIN_MESSAGES_PATH);
        }
        Ok(changed)
    }

    /// Opening a message in the admin inbox: returns it and marks it read if it
    /// was unread. Repeated views do not write again.
    pub async fn view_and_mark_read(&self, id: Uuid) -> ActionResult<(Message, bool)> {
        let mut message = self.db.get_message(id).await.map_err(|e| match e {
            PortError::NotFound(_) => ActionError::NotFound(format!("Message {id} not found")),
            other => {
                error!(message_id = %id, "Error loading message: {:?}", other);
                ActionError::Store("Failed to load message".to_string())
            }
        })?;

        let changed = if message.status == MessageStatus::Unread {
            self.mark_read(id).await?
        } else {
            false
        };
        message.status = MessageStatus::Read;
        Ok((message, changed))
    }

    pub async fn delete(&self, id: Uuid) -> ActionResult<()> {
        let deleted = self.db.delete_message(id).await.map_err(|e| {
            error!(message_id = %id, "Error deleting message: {:?}", e);
            ActionError::Store("Failed to delete message".to_string())
        })?;
        if !deleted {
            return Err(ActionError::NotFound(format!("Message {id} not found")));
        }
        self.cache.revalidate(ADMIN_MESSAGES_PATH);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            first_name: "Jo".into(),
            last_name: "Lee".into(),
            email: "jo@x.com".into(),
            subject: Some("General Inquiry".into()),
            message: "Hi".into(),
            ..Default::default()
        }
    }

    #[test]
    fn subject_from_either_variant() {
        let radio_only = ContactForm {
            subject: None,
            subject_visual: Some("Event Coverage".into()),
            ..form()
        };
        assert_eq!(radio_only.resolved_subject().as_deref(), Some("Event Coverage"));

        let hidden_and_radio = ContactForm {
            subject: Some("Portrait Session".into()),
            subject_visual: Some("Portrait Session".into()),
            ..form()
        };
        assert_eq!(
            hidden_and_radio.resolved_subject().as_deref(),
            Some("Portrait Session")
        );

        let blank_hidden = ContactForm {
            subject: Some(" ".into()),
            subject_visual: Some("Commercial Project".into()),
            ..form()
        };
        assert_eq!(
            blank_hidden.resolved_subject().as_deref(),
            Some("Commercial Project")
        );
    }

    #[test]
    fn missing_subject_is_rejected() {
        let no_subject = ContactForm {
            subject: None,
            ..form()
        };
        assert_eq!(
            no_subject.validate().unwrap_err(),
            ActionError::MissingField("subject")
        );
    }

    #[test]
    fn phone_is_optional() {
        let message = form().validate().unwrap();
        assert_eq!(message.subject, "General Inquiry");
        assert_eq!(message.phone, None);
    }
}
