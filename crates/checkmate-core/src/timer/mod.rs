mod break_policy;
mod clock;
mod engine;
mod state;

pub use break_policy::{BreakPolicy, BreakTier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{badge_for, Completion, TimerService};
pub use state::{DisplaySnapshot, Phase, TimerState};
