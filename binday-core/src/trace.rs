//! Per-lookup diagnostic log returned to callers that ask for a debug trace.

use std::collections::VecDeque;

/// Number of trailing lines kept for rendering.
pub const TRACE_TAIL: usize = 50;

const VALUE_PREVIEW: usize = 60;

/// Bounded log of what a lookup did, mirrored to `tracing` at debug level.
#[derive(Debug, Default, Clone)]
pub struct Trace {
    lines: VecDeque<String>,
}

impl Trace {
    /// Create an empty trace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line.
    pub fn record(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(target: "binday::trace", "{line}");
        if self.lines.len() == TRACE_TAIL {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Record a listing of form fields, hiding the bulk of ASP.NET state values.
    pub fn fields<'a, I>(&mut self, prefix: &str, fields: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut sorted: Vec<(&str, &str)> = fields.into_iter().collect();
        sorted.sort_by_key(|(name, _)| *name);

        self.record(format!("{prefix} fields ({} total):", sorted.len()));
        for (name, value) in sorted {
            if name.starts_with("__") {
                self.record(format!("  {name}=[{} bytes]", value.len()));
            } else {
                self.record(format!("  {name}={:?}", preview(value)));
            }
        }
    }

    /// Kept lines joined with newlines.
    #[must_use]
    pub fn render_tail(&self) -> String {
        self.lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Iterator over the kept lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn preview(value: &str) -> String {
    if value.chars().count() <= VALUE_PREVIEW {
        return value.to_owned();
    }
    let mut shown: String = value.chars().take(VALUE_PREVIEW - 3).collect();
    shown.push_str("...");
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_tail() {
        let mut trace = Trace::new();
        for index in 0..(TRACE_TAIL + 5) {
            trace.record(format!("line {index}"));
        }
        assert_eq!(trace.lines().count(), TRACE_TAIL, "trace is bounded");
        assert_eq!(
            trace.lines().next(),
            Some("line 5"),
            "oldest lines are dropped"
        );
        assert!(
            trace.render_tail().ends_with("line 54"),
            "newest line is last"
        );
    }

    #[test]
    fn field_listing_hides_state_and_truncates_long_values() {
        let long = "x".repeat(70);
        let mut trace = Trace::new();
        trace.fields(
            "Initial page",
            [
                ("__VIEWSTATE", "abcdef"),
                ("b_field", long.as_str()),
                ("a_field", "short"),
            ],
        );

        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(
            lines.first(),
            Some(&"Initial page fields (3 total):"),
            "header line"
        );
        assert_eq!(
            lines.get(1),
            Some(&"  __VIEWSTATE=[6 bytes]"),
            "state value is summarised"
        );
        assert_eq!(
            lines.get(2),
            Some(&"  a_field=\"short\""),
            "short value is shown"
        );
        let expected = format!("  b_field=\"{}...\"", "x".repeat(57));
        assert_eq!(lines.get(3), Some(&expected.as_str()), "long value is cut");
    }
}
