//! Notification building and outbound email delivery.

pub mod dispatcher;
pub mod email;

pub use dispatcher::NotificationDispatcher;
pub use email::{EmailMessage, EmailSender, HttpEmailSender};
