//! Statistics derived from the focus-session log.

mod insights;

pub use insights::FocusInsights;
