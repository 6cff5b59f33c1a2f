use crate::dataset::{search_text, Dataset, Record};
use crate::index::{Bm25Index, Bm25Params, Document};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Where an indexed document came from: its category and row in that dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocRef {
    pub category: String,
    pub row: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub category: Option<String>,
    pub stack: Option<String>,
    pub limit: usize,
    /// Exclusive lower bound; hits must score strictly above it.
    pub min_score: f32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { category: None, stack: None, limit: 10, min_score: 0.0 }
    }
}

impl SearchOptions {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryHit {
    pub id: String,
    pub score: f32,
    pub category: String,
    pub data: Record,
}

/// BM25 search across several categorized datasets sharing one index.
///
/// Each record is indexed as `"<category>:<row>"` with a [`DocRef`] attached,
/// and the records themselves are kept per category to hydrate hits.
#[derive(Debug, Default)]
pub struct CategorySearch {
    index: Bm25Index<DocRef>,
    datasets: BTreeMap<String, Vec<Record>>,
}

pub fn doc_id(category: &str, row: usize) -> String {
    format!("{category}:{row}")
}

impl CategorySearch {
    pub fn new() -> Self { Self::default() }

    pub fn with_params(params: Bm25Params) -> Self {
        Self { index: Bm25Index::with_params(params), datasets: BTreeMap::new() }
    }

    /// Index `records` under `category`. Loading a category again replaces its
    /// previous records and postings; other categories are left as they are.
    pub fn load_dataset(&mut self, category: impl Into<String>, records: Vec<Record>) {
        let category = category.into();
        if let Some(previous) = self.datasets.remove(&category) {
            for row in 0..previous.len() {
                self.index.remove_document(&doc_id(&category, row));
            }
            tracing::debug!(category = %category, dropped = previous.len(), "replacing category");
        }

        let docs = records.iter().enumerate().map(|(row, record)| Document {
            id: doc_id(&category, row),
            text: search_text(record),
            metadata: DocRef { category: category.clone(), row },
        });
        let added = self.index.add_documents(docs);
        tracing::info!(category = %category, records = added, "loaded dataset");
        self.datasets.insert(category, records);
    }

    pub fn load_datasets<I>(&mut self, datasets: I)
    where
        I: IntoIterator<Item = Dataset>,
    {
        for Dataset { category, data } in datasets {
            self.load_dataset(category, data);
        }
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<CategoryHit> {
        let limit = options.limit;
        let mut results = Vec::new();
        if limit == 0 {
            return results;
        }
        let stack = options.stack.as_deref().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());

        // Filters run after global ranking, so fetch extra and widen while the
        // index still has hits left to give.
        let mut fetch = limit.saturating_mul(2);
        loop {
            let hits = self.index.search(query, fetch);
            let exhausted = hits.len() < fetch;
            results.clear();
            for hit in hits {
                if hit.score <= options.min_score {
                    return results;
                }
                let DocRef { category, row } = hit.metadata;
                if options.category.as_deref().is_some_and(|want| want != category.as_str()) {
                    continue;
                }
                let Some(record) = self.datasets.get(category).and_then(|rows| rows.get(*row)) else {
                    continue;
                };
                if stack.as_deref().is_some_and(|s| !matches_stack(record, s)) {
                    continue;
                }
                results.push(CategoryHit {
                    id: hit.id.to_string(),
                    score: hit.score,
                    category: category.clone(),
                    data: record.clone(),
                });
                if results.len() == limit {
                    return results;
                }
            }
            if exhausted || fetch == usize::MAX {
                return results;
            }
            fetch = fetch.saturating_mul(2);
        }
    }

    /// Loaded category names, sorted.
    pub fn get_categories(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    pub fn get_category_data(&self, category: &str) -> Option<&[Record]> {
        self.datasets.get(category).map(Vec::as_slice)
    }

    pub fn num_docs(&self) -> usize { self.index.len() }

    pub fn clear(&mut self) {
        self.index.clear();
        self.datasets.clear();
    }
}

/// Records that name no stack (no `stack`/`stacks` field, or only blank or
/// null values there) apply to every stack.
fn matches_stack(record: &Record, stack: &str) -> bool {
    let declared: Vec<String> = record
        .iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case("stack") || key.eq_ignore_ascii_case("stacks"))
        .flat_map(|(_, value)| stack_names(value))
        .collect();
    declared.is_empty() || declared.iter().any(|name| name == stack || name == "all" || name == "*")
}

fn stack_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(|c: char| c == ',' || c == '/' || c == '|' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::to_lowercase)
            .collect(),
        Value::Array(items) => items.iter().flat_map(stack_names).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(obj) => obj,
            _ => panic!("record must be an object"),
        }
    }

    #[test]
    fn stack_field_matching() {
        let tailwind = record(json!({"name": "grid", "stack": "React, Tailwind"}));
        let listed = record(json!({"name": "grid", "stacks": ["vue", "svelte"]}));
        let universal = record(json!({"name": "grid", "stack": "all"}));
        let agnostic = record(json!({"name": "grid"}));
        assert!(matches_stack(&tailwind, "tailwind"));
        assert!(!matches_stack(&tailwind, "vue"));
        assert!(matches_stack(&listed, "svelte"));
        assert!(matches_stack(&universal, "flutter"));
        assert!(matches_stack(&agnostic, "flutter"));
    }

    #[test]
    fn blank_stack_values_apply_to_every_stack() {
        let blank = record(json!({"name": "card", "stack": ""}));
        let null = record(json!({"name": "card", "stack": null}));
        let separators = record(json!({"name": "card", "stacks": [" , ", null]}));
        for agnostic in [&blank, &null, &separators] {
            assert!(matches_stack(agnostic, "vue"));
            assert!(matches_stack(agnostic, "react"));
        }
    }

    #[test]
    fn reload_replaces_category() {
        let mut search = CategorySearch::new();
        search.load_dataset("colors", vec![record(json!({"name": "Ocean"})), record(json!({"name": "Sky"}))]);
        search.load_dataset("colors", vec![record(json!({"name": "Forest"}))]);
        assert_eq!(search.num_docs(), 1);
        assert!(search.search("ocean", &SearchOptions::default()).is_empty());
        let hits = search.search("forest", &SearchOptions::default());
        assert_eq!(hits[0].id, "colors:0");
    }

    #[test]
    fn zero_limit_is_empty() {
        let mut search = CategorySearch::new();
        search.load_dataset("colors", vec![record(json!({"name": "Ocean"}))]);
        assert!(search.search("ocean", &SearchOptions::default().limit(0)).is_empty());
    }
}
