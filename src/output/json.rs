//! JSON output formatter for slowlog-digest reports

use crate::output::text::summary_label;
use crate::report::Report;
use crate::Result;
use serde_json::json;

/// JSON formatter for reports
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter (pretty-printed)
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Format a report as JSON; each profile carries its summary label
    pub fn format(&self, report: &Report) -> Result<String> {
        let profiles: Vec<_> = report
            .profiles
            .iter()
            .map(|profile| {
                json!({
                    "rank": profile.rank,
                    "summary": summary_label(&profile.class),
                    "class": profile.class,
                })
            })
            .collect();

        let json_value = json!({
            "metadata": report.metadata,
            "global": report.global,
            "profiles": profiles,
            "width": report.width,
        });

        let output = if self.pretty {
            serde_json::to_string_pretty(&json_value)?
        } else {
            serde_json::to_string(&json_value)?
        };
        Ok(output)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
