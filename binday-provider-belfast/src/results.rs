//! Parsing of the `BinDetailsPnl` results panel.

use std::sync::LazyLock;

use chrono::{NaiveDate, Weekday};
use scraper::{Html, Selector};

use binday_core::model::{BinKind, Collection, Schedule};
use binday_core::ports::PortError;

use crate::form::selector;

static PANEL: LazyLock<Selector> = LazyLock::new(|| selector("#BinDetailsPnl"));

const HEADER_LABELS: [&str; 4] = ["type of bin", "day(s)", "how often?", "next collection"];
const BIN_WORDS: [&str; 5] = ["bin", "general", "recycling", "compost", "brown"];
/// Characters of page text kept when the results panel is missing.
const PREVIEW_CHARS: usize = 1000;
/// Day, month and year of a date like `Mon Sep  1 2025`, after the weekday.
const DATE_FORMAT: &str = "%b %d %Y";

/// Parse the results page into a schedule.
///
/// The panel is a table with one row per bin: name, collection day,
/// frequency, next collection date. Its first text line is the address.
pub(crate) fn parse_schedule(body: &str) -> Result<Schedule, PortError> {
    let html = Html::parse_document(body);
    let Some(panel) = html.select(&PANEL).next() else {
        return Err(PortError::ResultsPanelMissing {
            preview: page_preview(&html),
        });
    };

    let lines: Vec<&str> = panel
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let address = lines
        .first()
        .and_then(|line| line.split(',').next())
        .map(|street| title_case(street.trim()))
        .unwrap_or_default();

    let rows: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| !HEADER_LABELS.contains(&line.to_lowercase().as_str()))
        .collect();

    Ok(Schedule {
        address,
        collections: scan_collections(&rows),
        panel_text: lines.join("\n"),
    })
}

/// Page text with whitespace runs between nodes reduced to one space.
fn page_preview(html: &Html) -> String {
    let words: Vec<&str> = html
        .root_element()
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();
    words.join(" ").chars().take(PREVIEW_CHARS).collect()
}

/// Walk the cells looking for `name, day, frequency, date` groups.
fn scan_collections(cells: &[&str]) -> Vec<Collection> {
    let mut collections: Vec<Collection> = Vec::new();
    let mut index = 0;

    while let Some([name, _day, _frequency, raw_date]) = cells.get(index..index + 4) {
        let parsed = looks_like_bin(name)
            .then(|| parse_collection_date(raw_date))
            .flatten();

        let Some(date) = parsed else {
            index += 1;
            continue;
        };

        let kind = normalize_bin_name(name);
        if let Some(existing) = collections.iter_mut().find(|entry| entry.kind == kind) {
            existing.date = date;
        } else {
            collections.push(Collection { kind, date });
        }
        index += 4;
    }

    collections
}

fn looks_like_bin(name: &str) -> bool {
    let lower = name.to_lowercase();
    BIN_WORDS.iter().any(|word| lower.contains(word))
}

/// Parse `Mon Sep  1 2025`. Runs of whitespace are collapsed; the weekday
/// must be a weekday name but is not checked against the date.
fn parse_collection_date(raw: &str) -> Option<NaiveDate> {
    let mut words = raw.split_whitespace();
    words.next()?.parse::<Weekday>().ok()?;
    let rest = words.collect::<Vec<_>>().join(" ");
    NaiveDate::parse_from_str(&rest, DATE_FORMAT).ok()
}

/// Map a council bin label onto a [`BinKind`].
pub(crate) fn normalize_bin_name(raw: &str) -> BinKind {
    let stripped = raw
        .trim()
        .replace(" bin", "")
        .replace(" Bin", "")
        .replace(" waste", "");
    let name = stripped.trim();
    let lower = name.to_lowercase();

    if lower.starts_with("general") {
        BinKind::General
    } else if lower.starts_with("recycling") {
        BinKind::Recycling
    } else if lower.starts_with("compost") || lower.starts_with("brown") {
        BinKind::Compost
    } else {
        BinKind::Other(title_case(name))
    }
}

/// Capitalise the first letter of every run of letters and lower-case the
/// rest, so `12a o'neill st` becomes `12A O'Neill St`.
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS: &str = r#"
        <html><body><form id="form1">
        <div id="BinDetailsPnl">
          <h2>12 EXAMPLE STREET, BELFAST, BT1 1AA</h2>
          <table>
            <tr><th>Type of bin</th><th>Day(s)</th><th>How often?</th><th>Next collection</th></tr>
            <tr><td>Recycling bin</td><td>Monday</td><td>Fortnightly</td><td>Mon Sep  8 2025</td></tr>
            <tr><td>General waste bin</td><td>Monday</td><td>Fortnightly</td><td>Mon Sep 1 2025</td></tr>
            <tr><td>Brown bin</td><td>Tuesday</td><td>Weekly</td><td>Tue Sep 02 2025</td></tr>
            <tr><td>Glass box</td><td>Wednesday</td><td>Monthly</td><td>Wed Sep 3 2025</td></tr>
          </table>
          <p>Bins must be out by 7am.</p>
        </div>
        </form></body></html>"#;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).expect("valid date")
    }

    #[test]
    fn parses_address_and_bins() {
        let schedule = parse_schedule(RESULTS).expect("schedule");
        assert_eq!(
            schedule.address, "12 Example Street",
            "address before first comma"
        );
        assert_eq!(
            schedule.collections,
            vec![
                Collection {
                    kind: BinKind::Recycling,
                    date: date(8),
                },
                Collection {
                    kind: BinKind::General,
                    date: date(1),
                },
                Collection {
                    kind: BinKind::Compost,
                    date: date(2),
                },
            ],
            "glass box has no bin keyword and is skipped"
        );
        assert!(
            schedule
                .panel_text
                .starts_with("12 EXAMPLE STREET, BELFAST, BT1 1AA\nType of bin"),
            "raw text"
        );
    }

    fn preview_of(body: &str) -> Option<String> {
        if let Err(PortError::ResultsPanelMissing { preview }) = parse_schedule(body) {
            Some(preview)
        } else {
            None
        }
    }

    #[test]
    fn missing_panel_is_an_error_carrying_a_preview() {
        let body = "<html><body><h1>Session expired</h1>\n<p> Start  again </p></body></html>";
        assert_eq!(
            preview_of(body).as_deref(),
            Some("Session expired Start  again"),
            "text nodes joined by spaces"
        );

        let long = format!("<p>{}</p>", "x".repeat(PREVIEW_CHARS + 10));
        assert_eq!(
            preview_of(&long).as_deref().map(str::len),
            Some(PREVIEW_CHARS),
            "preview is capped"
        );
    }

    #[test]
    fn unparsable_dates_shift_the_window_by_one() {
        let cells = [
            "General bin",
            "Monday",
            "Fortnightly",
            "No collection",
            "Recycling bin",
            "Monday",
            "Weekly",
            "Mon Sep 1 2025",
        ];
        let collections = scan_collections(&cells);
        assert_eq!(
            collections,
            vec![Collection {
                kind: BinKind::Recycling,
                date: date(1),
            }],
            "recovered"
        );
    }

    #[test]
    fn repeated_bin_keeps_the_last_date() {
        let cells = [
            "General bin",
            "Monday",
            "Weekly",
            "Mon Sep 1 2025",
            "General waste",
            "Monday",
            "Weekly",
            "Mon Sep 8 2025",
        ];
        let collections = scan_collections(&cells);
        assert_eq!(
            collections,
            vec![Collection {
                kind: BinKind::General,
                date: date(8),
            }],
            "replaced"
        );
    }

    #[test]
    fn weekday_is_required_but_not_checked() {
        assert_eq!(
            parse_collection_date("Fri Sep 1 2025"),
            Some(date(1)),
            "weekday ignored"
        );
        assert_eq!(parse_collection_date("Sep 1 2025"), None, "no weekday");
        assert_eq!(parse_collection_date("Mon 01/09/2025"), None, "shape");
    }

    #[test]
    fn bin_names_are_normalised() {
        assert_eq!(
            normalize_bin_name(" General waste bin "),
            BinKind::General,
            "general"
        );
        assert_eq!(
            normalize_bin_name("Recycling Bin"),
            BinKind::Recycling,
            "recycling"
        );
        assert_eq!(normalize_bin_name("Brown bin"), BinKind::Compost, "brown");
        assert_eq!(normalize_bin_name("Compost"), BinKind::Compost, "compost");
        assert_eq!(
            normalize_bin_name("GLASS BOX bin"),
            BinKind::Other("Glass Box".to_owned()),
            "other"
        );
    }

    #[test]
    fn title_case_starts_words_after_any_non_letter() {
        assert_eq!(
            title_case("12a O'NEILL STREET"),
            "12A O'Neill Street",
            "digits and apostrophes"
        );
        assert_eq!(title_case(""), "", "empty");
    }
}
