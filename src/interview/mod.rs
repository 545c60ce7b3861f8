pub mod adapters;
pub mod catalog;
pub mod completion;
pub mod error;
pub mod extractor;
pub mod form;
pub mod matcher;
pub mod persistence;
pub mod ports;
pub mod prompts;
pub mod session;
pub mod transcript;
pub mod validation;

pub use catalog::{FormCatalog, FormEntry, SessionPaths};
pub use completion::CompletionGateway;
pub use error::InterviewError;
pub use form::{CompletionPolicy, FieldInfo, Form};
pub use session::{InterviewState, SavedAnswer, Session, SessionOptions, TurnOutcome};
