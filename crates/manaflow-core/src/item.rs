use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a resource.
///
/// `Any` is the wildcard: an input slot named `Any` accepts the first
/// concrete item offered to it and is then permanently rebound to that name.
/// In data files the string `"Any"` parses to the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemId {
    Any,
    Named(String),
}

impl ItemId {
    pub const WILDCARD: &'static str = "Any";

    pub fn new(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, ItemId::Any)
    }

    pub fn name(&self) -> &str {
        match self {
            ItemId::Any => Self::WILDCARD,
            ItemId::Named(name) => name,
        }
    }

    /// Whether a slot with this identity takes `incoming`.
    pub fn accepts(&self, incoming: &ItemId) -> bool {
        self.is_wildcard() || self == incoming
    }
}

impl From<String> for ItemId {
    fn from(name: String) -> Self {
        if name == Self::WILDCARD {
            ItemId::Any
        } else {
            ItemId::Named(name)
        }
    }
}

impl From<&str> for ItemId {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<ItemId> for String {
    fn from(item: ItemId) -> Self {
        match item {
            ItemId::Any => ItemId::WILDCARD.to_string(),
            ItemId::Named(name) => name,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_string_parses_to_wildcard() {
        assert_eq!(ItemId::new("Any"), ItemId::Any);
        assert_eq!(ItemId::new("Ore"), ItemId::Named("Ore".into()));
        assert!(ItemId::from("Any").is_wildcard());
    }

    #[test]
    fn wildcard_accepts_everything() {
        let any = ItemId::Any;
        assert!(any.accepts(&ItemId::new("Ore")));
        assert!(any.accepts(&ItemId::Any));
    }

    #[test]
    fn concrete_accepts_only_itself() {
        let ore = ItemId::new("Ore");
        assert!(ore.accepts(&ItemId::new("Ore")));
        assert!(!ore.accepts(&ItemId::new("Plate")));
        assert!(!ore.accepts(&ItemId::Any));
    }

    #[test]
    fn serde_round_trips_as_plain_string() {
        let json = serde_json::to_string(&ItemId::Any).unwrap();
        assert_eq!(json, "\"Any\"");
        let ore: ItemId = serde_json::from_str("\"Fire Mana\"").unwrap();
        assert_eq!(ore.name(), "Fire Mana");
    }
}
