pub mod color;
pub mod events;
pub mod extract;
pub mod planner;
pub mod prompt;
