use chrono::prelude::*;

pub fn merged_query(full_name: &str) -> String {
    format!("repo:{full_name} is:pr is:merged")
}

pub fn timestring<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}
