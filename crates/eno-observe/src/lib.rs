mod logger;
pub use logger::*;

mod enricher;
pub use enricher::*;

pub use eno_model::Severity;
