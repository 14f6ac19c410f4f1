pub mod attachments;
pub mod environment;
pub mod history;
pub mod message;
pub mod tokens;

pub use attachments::{Attachment, AttachmentKind, RemoveOutcome};
pub use environment::EnvironmentContext;
pub use history::HistoryStore;
pub use message::{Content, ContentPart, Message, Role};
pub use tokens::{CharEstimator, TokenLedger, TokenizeError, Tokenizer};
