//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod button;
pub mod buzzer;
pub mod controller;
pub mod force;
pub mod tick;

pub use button::button_task;
pub use buzzer::buzzer_task;
pub use controller::controller_task;
pub use force::force_task;
pub use tick::tick_task;
