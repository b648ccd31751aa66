//! Action tag classification
//!
//! Maps free-form action tags such as `UPDATE_USER_PROFILE` to an entity type
//! using an ordered rule table. Tags can mention more than one keyword
//! (`UPDATE_USER_ROLE`), so rule order is the precedence: the first rule that
//! matches wins. The table is part of the settings file and can be reordered
//! or extended without rebuilding.
//!
//! Default precedence:
//!
//! | # | entity type | matches                                             |
//! |---|-------------|-----------------------------------------------------|
//! | 1 | USER        | contains `USER` or `PROFILE`, equals `ADMIN_DISABLE_2FA` |
//! | 2 | PLINKK      | contains `PLINKK`                                   |
//! | 3 | THEME       | contains `THEME`                                    |
//! | 4 | REDIRECT    | contains `REDIRECT`                                 |
//! | 5 | ROLE        | contains `ROLE`                                     |

use serde::{Deserialize, Serialize};

use crate::models::EntityType;

/// One row of the classification table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRule {
    /// Entity type assigned when the rule matches
    pub entity_type: EntityType,

    /// Matches when the action contains any of these substrings
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Matches when the action equals any of these tags
    #[serde(default)]
    pub exact: Vec<String>,
}

impl ClassificationRule {
    pub fn keywords(entity_type: EntityType, keywords: &[&str]) -> Self {
        Self {
            entity_type,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            exact: Vec::new(),
        }
    }

    pub fn with_exact(mut self, tags: &[&str]) -> Self {
        self.exact.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    /// Check the rule against an already uppercased action
    fn matches(&self, action: &str) -> bool {
        self.exact.iter().any(|tag| tag.to_uppercase() == action)
            || self
                .keywords
                .iter()
                .filter(|k| !k.is_empty())
                .any(|k| action.contains(&k.to_uppercase()))
    }
}

/// The built-in precedence table
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule::keywords(EntityType::User, &["USER", "PROFILE"])
            .with_exact(&["ADMIN_DISABLE_2FA"]),
        ClassificationRule::keywords(EntityType::Plinkk, &["PLINKK"]),
        ClassificationRule::keywords(EntityType::Theme, &["THEME"]),
        ClassificationRule::keywords(EntityType::Redirect, &["REDIRECT"]),
        ClassificationRule::keywords(EntityType::Role, &["ROLE"]),
    ]
}

/// Ordered, first-match-wins classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionClassifier {
    rules: Vec<ClassificationRule>,
}

impl ActionClassifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    /// Resolve the entity type for an action tag
    ///
    /// Case-insensitive. Returns `None` when no rule matches.
    pub fn classify(&self, action: &str) -> Option<EntityType> {
        let action = action.trim().to_uppercase();
        if action.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(&action))
            .map(|rule| rule.entity_type)
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }
}

impl Default for ActionClassifier {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
