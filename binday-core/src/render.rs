//! Plain-text and JSON renderings of a [`Schedule`].

use std::fmt::Write as _;
use std::str::FromStr;

use serde::Serialize;

use crate::model::{Collection, Schedule};
use crate::ports::PortError;

/// Content type of text responses.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
/// Content type of JSON responses.
pub const JSON_CONTENT_TYPE: &str = "application/json";

const DATE_FORMAT: &str = "%d/%m/%y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Output shape requested by the caller.
pub enum OutputFormat {
    /// One line per collection.
    #[default]
    Text,
    /// `{"address": .., "collections": [..]}`.
    Json,
}

impl OutputFormat {
    /// Parse a format name; anything other than `json` means text.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(name))
    }
}

/// Response body together with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Body text.
    pub body: String,
    /// Value for the `Content-Type` header.
    pub content_type: &'static str,
}

#[derive(Serialize)]
struct ScheduleDocument<'a> {
    address: &'a str,
    collections: &'a [Collection],
}

/// Render a schedule in the requested format.
///
/// # Errors
///
/// Returns [`PortError::Internal`] if JSON serialisation fails.
pub fn render(schedule: &Schedule, format: OutputFormat) -> Result<Rendered, PortError> {
    match format {
        OutputFormat::Json => Ok(Rendered {
            body: to_json(schedule)?,
            content_type: JSON_CONTENT_TYPE,
        }),
        OutputFormat::Text => Ok(Rendered {
            body: to_text(schedule),
            content_type: TEXT_CONTENT_TYPE,
        }),
    }
}

/// JSON document with ISO dates.
///
/// # Errors
///
/// Returns [`PortError::Internal`] if serialisation fails.
pub fn to_json(schedule: &Schedule) -> Result<String, PortError> {
    let document = ScheduleDocument {
        address: &schedule.address,
        collections: &schedule.collections,
    };
    serde_json::to_string(&document)
        .map_err(|err| PortError::Internal(err.to_string()))
}

/// Short text listing used by the HTTP API.
#[must_use]
pub fn to_text(schedule: &Schedule) -> String {
    let mut out = format!("{} bin collections", schedule.address);
    for collection in &schedule.collections {
        out.push('\n');
        out.push_str(&collection_line(collection));
    }
    out
}

/// Text listing printed by the command line, with a pointer to the council site.
#[must_use]
pub fn to_banner(schedule: &Schedule, footer: &str) -> String {
    if schedule.collections.is_empty() {
        return schedule.panel_text.clone();
    }

    let mut out = format!("{} Bin Collections:\n", schedule.address);
    for collection in &schedule.collections {
        // writing into a String cannot fail
        let _ignored = writeln!(out, "{}", collection_line(collection));
    }
    out.push_str("Visit ");
    out.push_str(footer);
    out
}

fn collection_line(collection: &Collection) -> String {
    format!(
        "{} - {}",
        collection.kind,
        collection.date.format(DATE_FORMAT)
    )
}
