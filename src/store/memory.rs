//! In-Memory Store
//!
//! A non-persistent [`SecureStore`] with the same matching and uniqueness
//! rules as the SQLite store. Failures can be queued ahead of time so tests
//! can reproduce store errors deterministically.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::attributes::{AttrKey, AttrValue, Attributes};

use super::{
    MatchLimit, SecureStore, StoreQuery, StoreRecord, StoreResult, StoreStatus, check_add_request,
    check_changes, check_query,
};

#[derive(Default)]
struct MemoryState {
    records: Vec<StoreRecord>,
    injected: VecDeque<StoreStatus>,
    calls: usize,
}

impl MemoryState {
    fn take_injected(&mut self) -> StoreResult<()> {
        self.calls += 1;
        match self.injected.pop_front() {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }

    fn matching_indices(&self, query: &Attributes) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.attributes.matches(query))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Store kept entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next store call with `status`. Queued failures are consumed
    /// in order, one per call.
    pub fn fail_next(&self, status: StoreStatus) {
        if let Ok(mut state) = self.state.lock() {
            state.injected.push_back(status);
        }
    }

    /// Insert a record verbatim, bypassing validation
    pub fn insert_raw(&self, record: StoreRecord) {
        if let Ok(mut state) = self.state.lock() {
            state.records.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of store calls received so far, including failed ones
    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.calls).unwrap_or(0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| StoreStatus::NOT_AVAILABLE)
    }
}

impl SecureStore for MemoryStore {
    fn add(&self, attributes: &Attributes) -> StoreResult<Attributes> {
        let mut state = self.lock()?;
        state.take_injected()?;
        check_add_request(attributes)?;

        let mut stored = attributes.clone();
        let data = match stored.remove(AttrKey::ValueData) {
            Some(AttrValue::Data(data)) => data,
            _ => return Err(StoreStatus::PARAM),
        };

        if state
            .records
            .iter()
            .any(|r| r.attributes.same_primary_key(&stored))
        {
            return Err(StoreStatus::DUPLICATE_ITEM);
        }

        let now = Utc::now();
        stored.insert(AttrKey::CreationDate, AttrValue::Date(now));
        stored.insert(AttrKey::ModificationDate, AttrValue::Date(now));
        state.records.push(StoreRecord::new(stored.clone(), Some(data)));

        Ok(stored)
    }

    fn copy_matching(&self, query: &StoreQuery) -> StoreResult<Vec<StoreRecord>> {
        let mut state = self.lock()?;
        state.take_injected()?;
        check_query(&query.attributes)?;

        let mut found: Vec<StoreRecord> = state
            .matching_indices(&query.attributes)
            .into_iter()
            .map(|i| {
                let record = &state.records[i];
                let data = if query.return_data { record.data.clone() } else { None };
                StoreRecord::new(record.attributes.clone(), data)
            })
            .collect();

        if found.is_empty() {
            return Err(StoreStatus::ITEM_NOT_FOUND);
        }
        if query.match_limit == MatchLimit::One {
            found.truncate(1);
        }
        Ok(found)
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> StoreResult<usize> {
        let mut state = self.lock()?;
        state.take_injected()?;
        let class = check_query(query)?;
        check_changes(class, changes)?;

        let targets = state.matching_indices(query);
        if targets.is_empty() {
            return Err(StoreStatus::ITEM_NOT_FOUND);
        }

        let mut new_data = None;
        let mut attribute_changes = changes.clone();
        if let Some(AttrValue::Data(data)) = attribute_changes.remove(AttrKey::ValueData) {
            new_data = Some(data);
        }

        let now = Utc::now();
        let mut updated: Vec<(usize, Attributes)> = Vec::with_capacity(targets.len());
        for &i in &targets {
            let mut attrs = state.records[i].attributes.clone();
            attrs.extend(attribute_changes.clone());
            attrs.insert(AttrKey::ModificationDate, AttrValue::Date(now));
            updated.push((i, attrs));
        }

        // Updated items may collide with untouched items or with each other.
        for (pos, (_, attrs)) in updated.iter().enumerate() {
            let clashes_untouched = state
                .records
                .iter()
                .enumerate()
                .any(|(j, r)| !targets.contains(&j) && r.attributes.same_primary_key(attrs));
            let clashes_updated = updated[pos + 1..]
                .iter()
                .any(|(_, other)| other.same_primary_key(attrs));
            if clashes_untouched || clashes_updated {
                return Err(StoreStatus::DUPLICATE_ITEM);
            }
        }

        let count = updated.len();
        for (i, attrs) in updated {
            let record = &mut state.records[i];
            record.attributes = attrs;
            if let Some(data) = &new_data {
                record.data = Some(data.clone());
            }
        }
        Ok(count)
    }

    fn delete(&self, query: &Attributes) -> StoreResult<usize> {
        let mut state = self.lock()?;
        state.take_injected()?;
        check_query(query)?;

        let before = state.records.len();
        state.records.retain(|r| !r.attributes.matches(query));
        let removed = before - state.records.len();

        if removed == 0 {
            return Err(StoreStatus::ITEM_NOT_FOUND);
        }
        Ok(removed)
    }
}
