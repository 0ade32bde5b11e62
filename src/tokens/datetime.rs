//! Sub-formats of the `date-time` token.

use chrono::{DateTime, Datelike, SecondsFormat, Timelike, Utc};

/// Output format selected by the `date-time[...]` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeFormat {
    /// `2024-03-05`
    Date,
    /// `13:07:45`
    Time,
    /// `05/2/2024:13:07:45 +0000`, with a zero-based month number.
    ///
    /// Kept for consumers that already parse this layout; use
    /// [`DateTimeFormat::Apache`] for the standard common log format.
    Clf,
    /// `05/Mar/2024:13:07:45 +0000`
    Apache,
    /// `2024-03-05T13:07:45.000Z`
    Iso,
    /// `Tue, 05 Mar 2024 13:07:45 GMT`
    Web,
}

impl DateTimeFormat {
    /// Parses the token argument; no argument selects [`DateTimeFormat::Web`].
    ///
    /// Returns `None` for unknown sub-formats.
    pub fn parse(arg: Option<&str>) -> Option<Self> {
        match arg.unwrap_or("web") {
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "clf" => Some(Self::Clf),
            "apache" => Some(Self::Apache),
            "iso" => Some(Self::Iso),
            "web" => Some(Self::Web),
            _ => None,
        }
    }

    pub fn render(self, now: DateTime<Utc>) -> String {
        match self {
            Self::Date => now.format("%Y-%m-%d").to_string(),
            Self::Time => now.format("%H:%M:%S").to_string(),
            Self::Clf => format!(
                "{:02}/{}/{}:{:02}:{:02}:{:02} +0000",
                now.day(),
                now.month0(),
                now.year(),
                now.hour(),
                now.minute(),
                now.second()
            ),
            Self::Apache => now.format("%d/%b/%Y:%H:%M:%S +0000").to_string(),
            Self::Iso => now.to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::Web => now.format("%a, %d %b %Y %H:%M:%S GMT").to_string(),
        }
    }
}
