//! App operations served at the server root.

pub mod envelope;
pub mod expression_evaluate;
pub mod handler;
pub mod library_evaluate;
pub mod registry;

pub use envelope::OperationEnvelope;
pub use expression_evaluate::{EXPRESSION_EVALUATE, ExpressionEvaluateOperation};
pub use handler::{DynOperationHandler, OperationError, OperationHandler};
pub use library_evaluate::{LIBRARY_EVALUATE, LibraryEvaluateOperation};
pub use registry::OperationRegistry;
