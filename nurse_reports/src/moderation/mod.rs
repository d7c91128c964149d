//! Background moderation of submitted free text.

pub mod classifier;
pub mod dispatcher;
pub mod errors;
pub mod models;

pub use classifier::{ChatCompletionsClassifier, TextClassifier};
pub use dispatcher::{DispatchOutcome, ModerationDispatcher, ModerationHandle, ModerationQueue, RetryPolicy};
pub use errors::{ClassifyResult, ModerationError};
pub use models::{FieldVerdict, FreeTextField, ModerationJob, ModerationResult};
