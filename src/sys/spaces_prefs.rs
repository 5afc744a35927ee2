//! Mission Control settings that break slot-based switching.

use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpacesPreferences {
    pub spans_displays: bool,
    pub auto_rearrange: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceIssue {
    /// Spaces reorder themselves by recent use, so slots drift.
    AutoRearrange,
    /// Each display has its own spaces while several displays are attached.
    SeparateSpaces { displays: usize },
}

impl PreferenceIssue {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PreferenceIssue::AutoRearrange)
    }
}

impl fmt::Display for PreferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreferenceIssue::AutoRearrange => f.write_str(
                "Spaces must not auto-rearrange; turn off \"Automatically rearrange Spaces based on most recent use\" in Desktop & Dock > Mission Control",
            ),
            PreferenceIssue::SeparateSpaces { displays } => write!(
                f,
                "{displays} displays are attached with separate Spaces; turn off \"Displays have separate Spaces\" in Desktop & Dock > Mission Control"
            ),
        }
    }
}

impl SpacesPreferences {
    /// `None` when the plist lacks either setting.
    pub fn from_json(root: &Value) -> Option<Self> {
        let spans = root.get("spans-displays")?.as_i64()?;
        let mode = root
            .get("SpacesDisplayConfiguration")?
            .get("Management Data")?
            .get("Management Mode")?
            .as_i64()?;
        Some(Self {
            spans_displays: spans == 1,
            auto_rearrange: mode == 1,
        })
    }

    pub fn issues(&self, display_count: usize) -> Vec<PreferenceIssue> {
        let mut issues = Vec::new();
        if self.auto_rearrange {
            issues.push(PreferenceIssue::AutoRearrange);
        }
        if !self.spans_displays && display_count > 1 {
            issues.push(PreferenceIssue::SeparateSpaces { displays: display_count });
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_log::test;

    use super::*;

    fn prefs_json(spans: i64, mode: i64) -> Value {
        json!({
            "spans-displays": spans,
            "SpacesDisplayConfiguration": {
                "Management Data": { "Management Mode": mode, "Monitors": [] }
            }
        })
    }

    #[test]
    fn parses_both_settings() {
        assert_eq!(
            Some(SpacesPreferences { spans_displays: true, auto_rearrange: false }),
            SpacesPreferences::from_json(&prefs_json(1, 0))
        );
        assert_eq!(None, SpacesPreferences::from_json(&json!({ "spans-displays": 1 })));
    }

    #[test]
    fn auto_rearrange_is_fatal() {
        let issues = SpacesPreferences::from_json(&prefs_json(1, 1)).unwrap().issues(1);
        assert_eq!(vec![PreferenceIssue::AutoRearrange], issues);
        assert!(issues[0].is_fatal());
    }

    #[test]
    fn separate_spaces_only_matters_with_several_displays() {
        let prefs = SpacesPreferences::from_json(&prefs_json(0, 0)).unwrap();
        assert!(prefs.issues(1).is_empty());
        let issues = prefs.issues(2);
        assert_eq!(vec![PreferenceIssue::SeparateSpaces { displays: 2 }], issues);
        assert!(!issues[0].is_fatal());
    }
}
