//! Status badge shown by the front end.

use std::fmt;

use colored::{ColoredString, Colorize};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::monitor::{Severity, Status};

/// Placeholder text before the first probe completes.
pub const WAITING_TEXT: &str = "…";

/// Text shown for a failed probe.
pub const ERROR_TEXT: &str = "Err";

/// Badge background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BadgeColor {
    Green,
    Yellow,
    Red,
    Gray,
}

impl From<Option<Severity>> for BadgeColor {
    fn from(severity: Option<Severity>) -> Self {
        match severity {
            Some(Severity::Good) => Self::Green,
            Some(Severity::Warning) => Self::Yellow,
            Some(Severity::Error) => Self::Red,
            None => Self::Gray,
        }
    }
}

/// Colored text label for a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: String,
    pub color: BadgeColor,
}

impl From<&Status> for Badge {
    fn from(status: &Status) -> Self {
        let text = match (status.failure.as_ref(), status.latency_ms) {
            (Some(_), _) => ERROR_TEXT.to_string(),
            (None, Some(ms)) => format!("{ms:.0}ms"),
            (None, None) => WAITING_TEXT.to_string(),
        };
        Self {
            text,
            color: status.severity.into(),
        }
    }
}

impl Badge {
    /// Terminal rendering: white text on the badge color.
    pub fn render(&self) -> ColoredString {
        let padded = format!(" {} ", self.text);
        let label = padded.white().bold();
        match self.color {
            BadgeColor::Green => label.on_green(),
            BadgeColor::Yellow => label.black().on_yellow(),
            BadgeColor::Red => label.on_red(),
            BadgeColor::Gray => label.on_bright_black(),
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{ThresholdPair, classify};
    use crate::probe::{ProbeOutcome, Target};
    use std::time::Duration;

    fn status_for(outcome: ProbeOutcome) -> Status {
        let thresholds = ThresholdPair::default();
        let severity = classify(&outcome, &thresholds);
        Status::observed(Target::parse("8.8.8.8").unwrap(), &outcome, severity)
    }

    #[test]
    fn test_unknown_badge() {
        let badge = Badge::from(&Status::unknown());
        assert_eq!(badge.text, WAITING_TEXT);
        assert_eq!(badge.color, BadgeColor::Gray);
    }

    #[test]
    fn test_good_badge_rounds_latency() {
        let badge = Badge::from(&status_for(ProbeOutcome::Success(Duration::from_micros(
            95_400,
        ))));
        assert_eq!(badge.text, "95ms");
        assert_eq!(badge.color, BadgeColor::Green);
    }

    #[test]
    fn test_warning_badge() {
        let badge = Badge::from(&status_for(ProbeOutcome::Success(Duration::from_millis(
            150,
        ))));
        assert_eq!(badge.text, "150ms");
        assert_eq!(badge.color, BadgeColor::Yellow);
    }

    #[test]
    fn test_failure_badges() {
        for outcome in [
            ProbeOutcome::timeout(),
            ProbeOutcome::unreachable("no route to host"),
        ] {
            let badge = Badge::from(&status_for(outcome));
            assert_eq!(badge.text, ERROR_TEXT);
            assert_eq!(badge.color, BadgeColor::Red);
        }
    }

    #[test]
    fn test_render_keeps_text() {
        colored::control::set_override(false);
        let badge = Badge {
            text: "42ms".to_string(),
            color: BadgeColor::Green,
        };
        assert_eq!(badge.render().to_string(), " 42ms ");
        assert_eq!(badge.to_string(), "42ms");
    }

    #[test]
    fn test_color_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&BadgeColor::Yellow).unwrap(), "\"yellow\"");
        assert_eq!(BadgeColor::Gray.as_ref(), "gray");
    }
}
