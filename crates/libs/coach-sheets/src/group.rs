//! Group code to target tab resolution.

use std::collections::HashMap;

use crate::gateway::{TabInfo, is_output_tab};
use crate::prelude::*;

const DEFAULT_GROUPS: [(&str, &str); 8] = [
    ("A", "Level 3 CM"),
    ("B", "Level 5 LO"),
    ("C", "Level 5 HRM"),
    ("D", "Level 5 Business Management"),
    ("E", "Top-up"),
    ("PCP", "PCP"),
    ("ME", "ME"),
    ("PDF", "PDF"),
];

/// How many tab titles a "target tab missing" error lists.
const LISTED_TABS: usize = 10;

/// Immutable group code → tab name table.
///
/// Codes missing from the table map to a tab of the same name, so every code
/// has a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMapping {
    groups: HashMap<String, String>,
}

impl Default for GroupMapping {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_GROUPS)
    }
}

impl GroupMapping {
    /// A table holding only `pairs`, without the default groups.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            groups: pairs
                .into_iter()
                .map(|(code, tab)| (code.into(), tab.into()))
                .collect(),
        }
    }

    /// Adds codes to the table; a code already present is remapped.
    pub fn with_overrides<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.groups.extend(
            pairs
                .into_iter()
                .map(|(code, tab)| (code.into(), tab.into())),
        );
        self
    }

    /// The tab name candidate for `code`, without checking it exists.
    pub fn tab_for<'a>(&'a self, code: &'a str) -> &'a str {
        self.groups.get(code).map(String::as_str).unwrap_or(code)
    }

    /// Resolves `code` to a tab present in `tabs` (exact title match).
    pub fn resolve(&self, code: &str, tabs: &[TabInfo]) -> Result<String> {
        let candidate = self.tab_for(code);
        if tabs.iter().any(|tab| tab.title == candidate) {
            return Ok(candidate.to_string());
        }

        let available: Vec<&str> = tabs
            .iter()
            .map(|tab| tab.title.as_str())
            .filter(|title| !is_output_tab(title))
            .take(LISTED_TABS)
            .collect();
        Err(Error::NotFound(format!(
            "Target sheet '{candidate}' for group '{code}' not found. Available sheets: {}",
            available.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tabs(titles: &[&str]) -> Vec<TabInfo> {
        titles
            .iter()
            .enumerate()
            .map(|(index, title)| TabInfo {
                title: title.to_string(),
                sheet_id: index as i64,
                index: index as i64,
            })
            .collect()
    }

    #[test]
    fn every_default_code_maps_to_its_tab() {
        let mapping = GroupMapping::default();
        for (code, tab) in DEFAULT_GROUPS {
            assert_eq!(mapping.tab_for(code), tab);
            assert_eq!(mapping.resolve(code, &tabs(&[tab])).unwrap(), tab);
        }
    }

    #[test]
    fn unmapped_code_falls_back_to_itself() {
        let mapping = GroupMapping::default();
        assert_eq!(mapping.tab_for("Z"), "Z");
        assert_eq!(mapping.resolve("Z", &tabs(&["Students", "Z"])).unwrap(), "Z");
    }

    #[test]
    fn missing_target_lists_at_most_ten_non_output_tabs() {
        let titles: Vec<String> = (0..14).map(|i| format!("Tab {i}")).collect();
        let mut all: Vec<&str> = vec!["PCP Output"];
        all.extend(titles.iter().map(String::as_str));
        let err = GroupMapping::default()
            .resolve("B", &tabs(&all))
            .unwrap_err();
        let Error::NotFound(message) = err else {
            panic!("expected NotFound, got {err:?}");
        };
        assert!(message.contains("'Level 5 LO' for group 'B'"));
        assert!(message.contains("Tab 9"));
        assert!(!message.contains("Tab 10"));
        assert!(!message.contains("PCP Output"));
    }

    #[test]
    fn substituted_mapping_wins_over_defaults() {
        let mapping = GroupMapping::default().with_overrides([("A", "Level 3 CM 2026"), ("F", "Level 4")]);
        assert_eq!(mapping.tab_for("A"), "Level 3 CM 2026");
        assert_eq!(mapping.tab_for("F"), "Level 4");
        assert_eq!(mapping.tab_for("B"), "Level 5 LO");

        let only = GroupMapping::from_pairs([("A", "Alt")]);
        assert_eq!(only.tab_for("B"), "B");
    }
}
