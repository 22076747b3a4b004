//! Clock lookup tool.
//!
//! Answers "what time is it in X" from a small static city table. Offsets
//! are standard time; DST shifts are out of scope for this table.

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use plume_core::error::ToolError;
use plume_core::tool::{Tool, ToolResult};
use serde_json::{Value, json};

/// City name → UTC offset in hours.
const CITY_OFFSETS: &[(&str, i32)] = &[
    ("london", 0),
    ("dublin", 0),
    ("lisbon", 0),
    ("paris", 1),
    ("berlin", 1),
    ("madrid", 1),
    ("rome", 1),
    ("amsterdam", 1),
    ("stockholm", 1),
    ("warsaw", 1),
    ("athens", 2),
    ("helsinki", 2),
    ("kyiv", 2),
    ("cairo", 2),
    ("istanbul", 3),
    ("moscow", 3),
    ("dubai", 4),
    ("karachi", 5),
    ("mumbai", 5),
    ("delhi", 5),
    ("dhaka", 6),
    ("bangkok", 7),
    ("jakarta", 7),
    ("beijing", 8),
    ("shanghai", 8),
    ("singapore", 8),
    ("hong kong", 8),
    ("tokyo", 9),
    ("seoul", 9),
    ("sydney", 10),
    ("auckland", 12),
    ("new york", -5),
    ("toronto", -5),
    ("chicago", -6),
    ("mexico city", -6),
    ("denver", -7),
    ("los angeles", -8),
    ("san francisco", -8),
    ("seattle", -8),
    ("anchorage", -9),
    ("honolulu", -10),
    ("sao paulo", -3),
    ("buenos aires", -3),
];

/// Cities on a half-hour offset.
const HALF_HOUR_CITIES: &[&str] = &["mumbai", "delhi"];

pub struct CurrentTimeTool;

impl CurrentTimeTool {
    pub fn new() -> Self {
        Self
    }

    fn lookup(location: &str) -> Option<(&'static str, i32)> {
        let needle = location.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        CITY_OFFSETS
            .iter()
            .find(|(city, _)| needle.contains(city) || *city == needle)
            .copied()
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Look up the current local time in a major city. \
         Provide the city name, e.g. \"Tokyo\" or \"New York\"."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "City to look up, e.g. \"Tokyo\""
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let location = arguments["location"].as_str().unwrap_or("").to_string();

        let Some((city, hours)) = Self::lookup(&location) else {
            return Ok(ToolResult::failure(format!(
                "I'm sorry, I don't have timezone data for \"{location}\". \
                 I can look up major cities such as London, New York, or Tokyo."
            )));
        };

        let mut offset_secs = hours * 3600;
        if HALF_HOUR_CITIES.contains(&city) {
            offset_secs += 1800;
        }

        let offset = FixedOffset::east_opt(offset_secs).ok_or_else(|| {
            ToolError::ExecutionFailed {
                tool_name: "current_time".into(),
                reason: format!("invalid UTC offset for {city}"),
            }
        })?;
        let local = Utc::now().with_timezone(&offset);

        Ok(ToolResult::ok(format!(
            "The current time in {} is {} (UTC{}).",
            title_case(city),
            local.format("%Y-%m-%d %H:%M"),
            format_offset(offset_secs),
        )))
    }
}

fn title_case(city: &str) -> String {
    city.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_offset(secs: i32) -> String {
    let sign = if secs < 0 { '-' } else { '+' };
    let abs = secs.abs();
    format!("{}{}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
}
