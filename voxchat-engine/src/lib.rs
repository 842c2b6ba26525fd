pub mod client;
pub mod traits;

pub use client::{BusyFlag, ClientError, ConversationClient, FlowKind};
pub use traits::{ChatBackend, Notifier};
