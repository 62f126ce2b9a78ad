//! Daily reminder scheduling: the fixed-time trigger and the firing
//! engine it drives.

pub mod engine;
pub mod trigger;

pub use engine::{BATCH_WINDOW_END_DAYS, BATCH_WINDOW_START_DAYS, FiringReport, ReminderEngine, batch_window};
pub use trigger::DailyTrigger;
