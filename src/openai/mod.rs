pub mod chat;
pub mod core;

pub use self::chat::{BoxedCompletionGateway, CompletionGateway, OpenAiCompletion};
pub use self::core::{Message, Role, completion_stream};
