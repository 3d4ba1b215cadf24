pub mod console;
pub mod progress;

pub use console::{format_duration, print_diff_table, print_summary_table, print_verbose};
pub use progress::{ProgressEvent, ProgressSink};
