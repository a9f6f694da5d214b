pub mod error;
pub use error::{CheckerError, CheckerResult, ResultExt, ServiceFault};
pub mod checker;
pub use checker::Checker;
pub mod dispatch;
pub use dispatch::Dispatcher;
pub mod storage;
pub use storage::MemoryCollection;
