//! Per-subscription notification building.
//!
//! Resolves the owner's contact address through the directory (the
//! address is never stored on the subscription), renders the reminder
//! message, and hands it to the email collaborator. One outbound attempt
//! per call; failures surface to the caller.

use crate::directory::OwnerDirectory;
use crate::error::{Result, TrackerError};
use crate::notify::email::{EmailMessage, EmailSender};
use crate::store::Subscription;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

/// Builds and sends one reminder email per subscription.
pub struct NotificationDispatcher {
    directory: Arc<dyn OwnerDirectory>,
    sender: Arc<dyn EmailSender>,
    /// Civil timezone renewal dates are rendered in.
    tz: Tz,
}

impl NotificationDispatcher {
    pub fn new(directory: Arc<dyn OwnerDirectory>, sender: Arc<dyn EmailSender>, tz: Tz) -> Self {
        Self {
            directory,
            sender,
            tz,
        }
    }

    /// Send the renewal reminder for `subscription`.
    ///
    /// Fails with [`TrackerError::DeliveryFailed`] when the owner has no
    /// contact address or the email attempt fails; the caller's fan-out
    /// tolerates individual failures.
    pub async fn notify(&self, subscription: &Subscription) -> Result<()> {
        let renew_date = subscription.renew_date.ok_or_else(|| {
            TrackerError::DeliveryFailed(format!(
                "subscription {} has no renewal date",
                subscription.id
            ))
        })?;

        let contact = self
            .directory
            .contact(&subscription.owner_id)
            .await?
            .filter(|c| !c.email.trim().is_empty())
            .ok_or_else(|| {
                TrackerError::DeliveryFailed(format!(
                    "no contact address for owner {}",
                    subscription.owner_id
                ))
            })?;

        let message = render_reminder(&subscription.name, renew_date, &contact.email, self.tz);
        self.sender.send(&message).await
    }
}

/// Render the reminder message for one subscription.
fn render_reminder(name: &str, renew_date: DateTime<Utc>, to: &str, tz: Tz) -> EmailMessage {
    let date = human_date(renew_date, tz);
    EmailMessage {
        to: to.to_owned(),
        subject: format!("Reminder: {name} renews on {date}"),
        text: format!("Hi! Your {name} renews on {date}."),
        html: format!("<p>Hi! Your <b>{name}</b> renews on <b>{date}</b>.</p>"),
    }
}

/// Human-readable calendar date in the configured civil timezone, no
/// time-of-day, e.g. `Wed Mar 13 2024`.
fn human_date(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%a %b %d %Y").to_string()
}
