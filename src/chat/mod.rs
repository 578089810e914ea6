mod models;
mod session;
mod store;
mod transport;

pub use models::{ChatQuery, ChatReply, Message, Sender};
pub use session::{ExchangeState, SessionController};
pub use store::ConversationStore;
pub use transport::{HttpTransport, Transport, TransportError};
