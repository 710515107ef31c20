pub mod core;
pub mod models;

pub use core::{Planner, PlannerBuilder};
pub use models::{ConversationState, Transcript, TranscriptEvent};
