//! Search Operations
//!
//! Look up credentials by template, or list a whole class.

use crate::attributes::ItemClass;
use crate::error::{KeychainError, KeychainResult};
use crate::item::{ItemTemplate, KeychainItem};
use crate::store::{MatchLimit, SecureStore, StoreQuery, StoreRecord, StoreResult, StoreStatus};

use super::{Lifecycle, Operation, Verb, sealed, store_error};

/// Parsed matches plus the number of store records that could not be parsed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub items: Vec<KeychainItem>,
    /// Malformed records left out of `items`
    pub skipped: usize,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn first(&self) -> Option<&KeychainItem> {
        self.items.first()
    }
}

impl IntoIterator for SearchResults {
    type Item = KeychainItem;
    type IntoIter = std::vec::IntoIter<KeychainItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[derive(Debug, Clone)]
pub struct Search {
    template: ItemTemplate,
    list_all: bool,
    match_limit: MatchLimit,
    with_secrets: bool,
    require_match: bool,
    lifecycle: Lifecycle,
}

impl Search {
    /// First item matching a scoped template, attributes only
    pub fn new(template: impl Into<ItemTemplate>) -> Self {
        Self {
            template: template.into(),
            list_all: false,
            match_limit: MatchLimit::One,
            with_secrets: false,
            require_match: true,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Every item of `class`. The only way to search without narrowing
    /// attributes.
    pub fn list_all(class: ItemClass) -> Self {
        Self {
            list_all: true,
            match_limit: MatchLimit::All,
            ..Self::new(ItemTemplate::empty(class))
        }
    }

    pub fn all_matches(mut self) -> Self {
        self.match_limit = MatchLimit::All;
        self
    }

    pub fn first_match(mut self) -> Self {
        self.match_limit = MatchLimit::One;
        self
    }

    /// Include secret payloads in the returned items
    pub fn with_secrets(mut self) -> Self {
        self.with_secrets = true;
        self
    }

    /// Succeed with empty results instead of `NotFound`
    pub fn allow_empty(mut self) -> Self {
        self.require_match = false;
        self
    }

    pub fn template(&self) -> &ItemTemplate {
        &self.template
    }

    pub fn match_limit(&self) -> MatchLimit {
        self.match_limit
    }

    /// Parse records in store order, skipping malformed ones. A first-match
    /// search stops at the first record that parses.
    fn parse_records(&self, records: Vec<StoreRecord>) -> SearchResults {
        let mut results = SearchResults::default();
        for record in records {
            match self.parse_record(&record) {
                Ok(item) => {
                    results.items.push(item);
                    if self.match_limit == MatchLimit::One {
                        break;
                    }
                }
                Err(e) => {
                    results.skipped += 1;
                    log::warn!("Skipping malformed keychain record: {}", e);
                }
            }
        }
        results
    }

    fn parse_record(&self, record: &StoreRecord) -> KeychainResult<KeychainItem> {
        if self.with_secrets && record.data.is_none() {
            return Err(KeychainError::invalid("record has no readable secret payload"));
        }
        KeychainItem::from_record(record)
    }
}

impl sealed::Sealed for Search {}

impl Operation for Search {
    type Request = StoreQuery;
    type Response = Vec<StoreRecord>;
    type Output = SearchResults;

    const VERB: Verb = Verb::Search;

    fn class(&self) -> ItemClass {
        self.template.class()
    }

    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn validate(&self) -> KeychainResult<()> {
        if !self.list_all && !self.template.is_scoped() {
            return Err(KeychainError::contract(format!(
                "search of {} items needs an identity attribute; use list_all to list the class",
                self.class()
            )));
        }
        Ok(())
    }

    fn build_query(&self) -> KeychainResult<StoreQuery> {
        // The store returns every match; the limit applies after parsing.
        Ok(StoreQuery {
            attributes: self.template.query_attributes(),
            match_limit: MatchLimit::All,
            return_data: self.with_secrets,
        })
    }

    fn execute(store: &dyn SecureStore, request: &StoreQuery) -> StoreResult<Vec<StoreRecord>> {
        store.copy_matching(request)
    }

    fn interpret(&self, result: StoreResult<Vec<StoreRecord>>) -> KeychainResult<SearchResults> {
        let results = match result {
            Ok(records) => self.parse_records(records),
            Err(StoreStatus::ITEM_NOT_FOUND) => SearchResults::default(),
            Err(status) => return Err(store_error(Self::VERB, status)),
        };

        if results.is_empty() && self.require_match {
            return Err(KeychainError::NotFound);
        }
        Ok(results)
    }
}
