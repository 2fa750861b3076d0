//! Site configuration for identifier validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Site configuration describing which identifiers the platform recognizes.
///
/// Every field is optional, and absence is meaningful: an absent field skips
/// the corresponding validation entirely, while an empty set applies the
/// check to every name. A dialect is plain read-only data and can be shared
/// across any number of concurrent analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    /// Names callable as functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<BTreeSet<String>>,
    /// Names of platform-supplied global variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<BTreeSet<String>>,
    /// Names that still work but should be flagged to authors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<BTreeSet<String>>,
    /// Names the site has turned off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<BTreeSet<String>>,
}

impl Dialect {
    /// Deserialize a dialect from its JSON site-config form: an object with
    /// optional `functions`/`variables`/`deprecated`/`disabled` arrays.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether `name` is a known function, or `None` when the function list
    /// is absent and the check does not apply.
    pub fn knows_function(&self, name: &str) -> Option<bool> {
        self.functions.as_ref().map(|set| set.contains(name))
    }

    /// Whether `name` is a known global variable, or `None` when the
    /// variable list is absent and the check does not apply.
    pub fn knows_variable(&self, name: &str) -> Option<bool> {
        self.variables.as_ref().map(|set| set.contains(name))
    }

    pub fn is_deprecated(&self, name: &str) -> bool {
        self.deprecated
            .as_ref()
            .is_some_and(|set| set.contains(name))
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.as_ref().is_some_and(|set| set.contains(name))
    }

    /// Whether any dialect list mentions `name`, regardless of category.
    pub(crate) fn lists(&self, name: &str) -> bool {
        [
            &self.functions,
            &self.variables,
            &self.deprecated,
            &self.disabled,
        ]
        .into_iter()
        .any(|field| field.as_ref().is_some_and(|set| set.contains(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_stay_absent() {
        let dialect = Dialect::from_json_str(r#"{"variables": ["page_title"]}"#)
            .expect("dialect should deserialize");
        assert_eq!(dialect.knows_variable("page_title"), Some(true));
        assert_eq!(dialect.knows_variable("other"), Some(false));
        assert_eq!(dialect.knows_function("length"), None);
        assert!(!dialect.is_deprecated("page_title"));
    }

    #[test]
    fn empty_list_differs_from_absent_list() {
        let dialect =
            Dialect::from_json_str(r#"{"variables": []}"#).expect("dialect should deserialize");
        assert_eq!(dialect.knows_variable("anything"), Some(false));

        let dialect = Dialect::from_json_str("{}").expect("dialect should deserialize");
        assert_eq!(dialect.knows_variable("anything"), None);
    }

    #[test]
    fn lists_covers_every_category() {
        let dialect = Dialect::from_json_str(
            r#"{"functions": ["f"], "variables": ["v"], "deprecated": ["dep"], "disabled": ["dis"]}"#,
        )
        .expect("dialect should deserialize");
        for name in ["f", "v", "dep", "dis"] {
            assert!(dialect.lists(name), "{name} should be listed");
        }
        assert!(!dialect.lists("other"));
    }
}
