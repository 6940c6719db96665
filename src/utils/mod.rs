pub mod text;
pub mod time;

pub use text::{max_display_width, pad_display};
pub use time::format_human_timestamp;
