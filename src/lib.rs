//! Subtrack: subscription renewal tracking and reminder engine.
//!
//! # Architecture
//!
//! The core is built from small components wired together by the daemon:
//! - **Store**: SQLite-backed subscription and owner records, with live
//!   watches that push the current set on every change
//! - **Upcoming calculator**: pure window math for the interactive
//!   "renewing soon" view, driven by the per-owner lookahead preference
//! - **Scheduler**: a daily fixed-time trigger (one wall-clock time in
//!   one civil timezone) firing the batch reminder engine
//! - **Notifier**: per-subscription reminder emails delivered through an
//!   HTTP email API, fanned out concurrently with per-job isolation
//!
//! The batch window (2–3 calendar days ahead) and the interactive
//! lookahead (user preference, default 7 days) are distinct by design
//! and never unified.

pub mod config;
pub mod directory;
pub mod error;
pub mod notify;
pub mod prefs;
pub mod scheduler;
pub mod store;
pub mod summary;
pub mod upcoming;

pub use config::TrackerConfig;
pub use directory::{OwnerDirectory, StoreOwnerDirectory};
pub use error::{Result, TrackerError};
pub use notify::{EmailMessage, EmailSender, HttpEmailSender, NotificationDispatcher};
pub use prefs::{DEFAULT_REMINDER_DAYS, PreferenceStore};
pub use scheduler::{DailyTrigger, FiringReport, ReminderEngine};
pub use store::{Category, NewSubscription, OwnerContact, Subscription, SubscriptionPatch, TrackerStore};
pub use upcoming::{sort_by_renewal, upcoming};
