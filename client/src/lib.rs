pub mod error;
pub mod form;
pub mod models;
pub mod render;
pub mod transport;

pub use error::ClientError;
pub use form::{DefaultAction, QueryForm};
pub use models::{Attachment, DecisionResult, Justification, QueryRequest};
pub use render::DecisionCard;
pub use transport::{ClientConfig, HttpTransport, QueryTransport};
