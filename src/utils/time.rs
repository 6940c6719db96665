use chrono::{DateTime, Local};

pub fn format_human_timestamp(time: &DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}
