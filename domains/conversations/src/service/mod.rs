//! Conversation services: the store, the per-conversation message stream and
//! the per-user conversation index

pub mod index;
pub mod store;
pub mod stream;

pub use index::ConversationIndex;
pub use store::ConversationStore;
pub use stream::MessageStream;
