//! Column-label to field-name matching rules.

use std::fmt;

/// Decides whether a result column label names a field.
pub trait ColumnNameMatcher: Send + Sync + fmt::Debug {
    fn matches(&self, label: &str, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl ColumnNameMatcher for ExactMatcher {
    fn matches(&self, label: &str, name: &str) -> bool {
        label == name
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveMatcher;

impl ColumnNameMatcher for CaseInsensitiveMatcher {
    fn matches(&self, label: &str, name: &str) -> bool {
        label.eq_ignore_ascii_case(name)
    }
}

/// Ignores underscores and case, so `battery_level` matches `batteryLevel`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCaseMatcher;

impl ColumnNameMatcher for SnakeCaseMatcher {
    fn matches(&self, label: &str, name: &str) -> bool {
        let mut label = label.chars().filter(|c| *c != '_');
        let mut name = name.chars().filter(|c| *c != '_');
        loop {
            match (label.next(), name.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => {}
                _ => return false,
            }
        }
    }
}
