pub mod change;
pub mod config;
pub mod monitor;
pub mod trigger;

pub use change::ChangeDetector;
pub use config::{ChangeDetectorConfig, MonitorConfig, OutputKind};
pub use monitor::{render_advice, Monitor, TableOutcome, TableStatus, TickReport};
pub use trigger::{handle_command, spawn_stdin_listener, PendingTrigger, TriggerBoard};
