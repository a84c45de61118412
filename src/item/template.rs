//! Identity-only item templates.

use crate::attributes::{AttrKey, Attributes, ItemClass};

use super::{GenericPassword, InternetPassword, KeychainItem};

/// An item with only identity attributes, used to scope search, delete and
/// update. Never carries a secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTemplate {
    item: KeychainItem,
}

impl ItemTemplate {
    /// Template with no narrowing attributes. Only a list-all search accepts it.
    pub fn empty(class: ItemClass) -> Self {
        let item = match class {
            ItemClass::Generic => KeychainItem::Generic(GenericPassword::default()),
            ItemClass::Internet => KeychainItem::Internet(InternetPassword::default()),
        };
        Self { item }
    }

    pub fn class(&self) -> ItemClass {
        self.item.class()
    }

    pub fn item(&self) -> &KeychainItem {
        &self.item
    }

    pub fn into_item(self) -> KeychainItem {
        self.item
    }

    pub fn query_attributes(&self) -> Attributes {
        self.item.query_attributes()
    }

    /// Whether any attribute besides the class narrows the match
    pub fn is_scoped(&self) -> bool {
        self.query_attributes().keys().any(|k| k != AttrKey::Class)
    }
}

impl From<KeychainItem> for ItemTemplate {
    fn from(mut item: KeychainItem) -> Self {
        item.common_mut().secret = None;
        Self { item }
    }
}

impl From<GenericPassword> for ItemTemplate {
    fn from(item: GenericPassword) -> Self {
        KeychainItem::Generic(item).into()
    }
}

impl From<InternetPassword> for ItemTemplate {
    fn from(item: InternetPassword) -> Self {
        KeychainItem::Internet(item).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_strips_secret() {
        let template = ItemTemplate::from(GenericPassword::new("svc", "bob", "p@ss"));
        assert!(template.item().secret().is_none());
        assert!(!template.item().is_concrete());
        assert_eq!(template.class(), ItemClass::Generic);
    }

    #[test]
    fn test_scope() {
        assert!(!ItemTemplate::empty(ItemClass::Generic).is_scoped());
        assert!(!ItemTemplate::empty(ItemClass::Internet).is_scoped());
        assert!(ItemTemplate::from(GenericPassword::matching("", "bob")).is_scoped());
        assert!(ItemTemplate::from(InternetPassword::matching("example.com")).is_scoped());
    }

    #[test]
    fn test_empty_template_attributes() {
        let attrs = ItemTemplate::empty(ItemClass::Internet).query_attributes();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.class().unwrap(), ItemClass::Internet);
    }
}
