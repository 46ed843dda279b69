//! Name, label and row filters over flattened list results
use crate::{resource::ResourceExt, selector::Selector, Resource, Result};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

/// Prefix of query parameters that persist row filter state and are not filters themselves
pub const ROW_FILTER_STORAGE_PREFIX: &str = "rowFilter-";

/// Query parameters that never act as filters
pub const RESERVED_QUERY_PARAMS: [&str; 4] = ["q", "kind", "orderBy", "sortBy"];

/// Query parameter of the name filter
pub const NAME_FILTER: &str = "name";

/// Query parameter of the label filter
pub const LABEL_FILTER: &str = "label";

/// Case-insensitive fuzzy match: every character of `needle` occurs in `haystack` in order
pub fn fuzzy_case_insensitive(needle: &str, haystack: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let mut rest = haystack.chars();
    needle
        .to_lowercase()
        .chars()
        .all(|c| rest.by_ref().any(|h| h == c))
}

/// A bucketed filter, e.g. pods by phase
///
/// The reducer puts every object into a bucket. When some buckets are
/// selected, an object passes if its bucket is selected or if its bucket is
/// not one of the known `items`.
pub struct RowFilter<K> {
    /// Name of the filter, also its query parameter
    pub filter_type: String,
    /// Known bucket ids
    pub items: Vec<String>,
    reducer: Arc<dyn Fn(&K) -> String + Send + Sync>,
}

impl<K> Clone for RowFilter<K> {
    fn clone(&self) -> Self {
        Self {
            filter_type: self.filter_type.clone(),
            items: self.items.clone(),
            reducer: self.reducer.clone(),
        }
    }
}

impl<K> fmt::Debug for RowFilter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowFilter")
            .field("filter_type", &self.filter_type)
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl<K> RowFilter<K> {
    /// A row filter with known buckets and a reducer
    pub fn new<I, F>(filter_type: &str, items: I, reducer: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        F: Fn(&K) -> String + Send + Sync + 'static,
    {
        Self {
            filter_type: filter_type.to_string(),
            items: items.into_iter().map(Into::into).collect(),
            reducer: Arc::new(reducer),
        }
    }

    /// The bucket of an object
    pub fn reduce(&self, obj: &K) -> String {
        (self.reducer)(obj)
    }

    fn passes(&self, selected: &BTreeSet<String>, obj: &K) -> bool {
        if selected.is_empty() {
            return true;
        }
        let bucket = self.reduce(obj);
        selected.contains(&bucket) || !self.items.contains(&bucket)
    }
}

/// The filter state of a list page
pub struct Filters<K> {
    name: Option<String>,
    labels: Option<Selector>,
    row_filters: Vec<RowFilter<K>>,
    selected: BTreeMap<String, BTreeSet<String>>,
}

impl<K> Default for Filters<K> {
    fn default() -> Self {
        Self {
            name: None,
            labels: None,
            row_filters: vec![],
            selected: BTreeMap::new(),
        }
    }
}

impl<K> Clone for Filters<K> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            labels: self.labels.clone(),
            row_filters: self.row_filters.clone(),
            selected: self.selected.clone(),
        }
    }
}

impl<K> fmt::Debug for Filters<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filters")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("row_filters", &self.row_filters)
            .field("selected", &self.selected)
            .finish()
    }
}

impl<K: Resource> Filters<K> {
    /// Register a row filter
    #[must_use]
    pub fn row_filter(mut self, filter: RowFilter<K>) -> Self {
        self.row_filters.push(filter);
        self
    }

    /// Set the name filter, an empty string clears it
    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
    }

    /// Set the label filter, an empty selector clears it
    pub fn set_labels(&mut self, selector: Selector) {
        self.labels = Some(selector).filter(|s| !s.selects_all());
    }

    /// Select buckets of a row filter, an empty list clears the selection
    pub fn select<I, S>(&mut self, filter_type: &str, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).filter(|id| !id.is_empty()).collect();
        if ids.is_empty() {
            self.selected.remove(filter_type);
        } else {
            self.selected.insert(filter_type.to_string(), ids);
        }
    }

    /// Apply one query parameter of the page url
    ///
    /// Returns whether the parameter was taken as a filter. Reserved keys and
    /// row filter storage keys are ignored.
    pub fn apply_query_param(&mut self, key: &str, value: &str) -> Result<bool> {
        if RESERVED_QUERY_PARAMS.contains(&key) || key.starts_with(ROW_FILTER_STORAGE_PREFIX) {
            return Ok(false);
        }
        match key {
            NAME_FILTER => self.set_name(value),
            LABEL_FILTER => self.set_labels(value.parse()?),
            _ => self.select(key, value.split(',').map(str::trim)),
        }
        Ok(true)
    }

    /// Whether an object passes every filter
    pub fn matches(&self, obj: &K) -> bool {
        if let Some(name) = &self.name {
            if !fuzzy_case_insensitive(name, &obj.name_any()) {
                return false;
            }
        }
        if let Some(selector) = &self.labels {
            if !selector.matches(obj.labels()) {
                return false;
            }
        }
        self.row_filters.iter().all(|rf| match self.selected.get(&rf.filter_type) {
            Some(selected) => rf.passes(selected, obj),
            None => true,
        })
    }

    /// The objects passing every filter, in input order
    pub fn apply<'a>(&self, objs: &'a [K]) -> Vec<&'a K> {
        objs.iter().filter(|obj| self.matches(obj)).collect()
    }

    /// Count objects per bucket of every row filter
    ///
    /// Counts ignore the row filter selections themselves, so every bucket
    /// keeps showing how many objects it would add.
    pub fn row_filter_counts(&self, objs: &[K]) -> BTreeMap<String, BTreeMap<String, usize>> {
        self.row_filters
            .iter()
            .map(|rf| {
                let mut counts: BTreeMap<String, usize> = rf.items.iter().map(|id| (id.clone(), 0)).collect();
                for obj in objs {
                    *counts.entry(rf.reduce(obj)).or_default() += 1;
                }
                (rf.filter_type.clone(), counts)
            })
            .collect()
    }
}
