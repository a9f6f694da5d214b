mod site;
pub use site::{CallSite, __function_name};

mod sink;
pub use sink::{LogSink, MemorySink, TracingSink};

mod task_logger;
pub use task_logger::{LOG_PREFIX, TaskLogger, UNSET_TOOL, format_timestamp, render_line};
