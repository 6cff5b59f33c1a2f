use crate::tokenizer::tokenize;
use std::collections::{BTreeMap, HashMap};

pub type TermId = u32;
pub type DocId = u32;

/// BM25 tuning knobs: `k1` controls term-frequency saturation, `b` the
/// strength of document-length normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// A unit of ingest: `text` is tokenized once, `metadata` is handed back on hits.
#[derive(Debug, Clone)]
pub struct Document<M> {
    pub id: String,
    pub text: String,
    pub metadata: M,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'a, M> {
    pub doc_id: DocId,
    pub id: &'a str,
    pub score: f32,
    pub metadata: &'a M,
}

#[derive(Debug)]
struct DocEntry<M> {
    id: String,
    len: u32,
    /// Distinct terms with their frequency, kept so removal can find its postings.
    terms: Vec<(TermId, u32)>,
    metadata: M,
}

/// In-memory inverted index scored with Okapi BM25.
///
/// Postings, document lengths and stored documents are updated together inside
/// `add_document`/`remove_document`, so every posting always points at a live
/// document. Internal doc ids increase with every ingest, which makes them the
/// tie-break for equal scores (earlier insertion ranks first).
#[derive(Debug)]
pub struct Bm25Index<M = ()> {
    params: Bm25Params,
    dictionary: HashMap<String, TermId>,
    postings: Vec<HashMap<DocId, u32>>, // indexed by TermId
    terms: Vec<String>,                 // indexed by TermId
    /// Ids of terms whose last posting was removed, reused on the next intern.
    free_terms: Vec<TermId>,
    docs: BTreeMap<DocId, DocEntry<M>>,
    ids: HashMap<String, DocId>,
    total_len: u64,
    next_doc_id: DocId,
}

impl<M> Default for Bm25Index<M> {
    fn default() -> Self {
        Self::with_params(Bm25Params::default())
    }
}

impl<M> Bm25Index<M> {
    pub fn new() -> Self { Self::default() }

    pub fn with_params(params: Bm25Params) -> Self {
        Self {
            params,
            dictionary: HashMap::new(),
            postings: Vec::new(),
            terms: Vec::new(),
            free_terms: Vec::new(),
            docs: BTreeMap::new(),
            ids: HashMap::new(),
            total_len: 0,
            next_doc_id: 0,
        }
    }

    pub fn params(&self) -> Bm25Params { self.params }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// Distinct terms that occur in at least one indexed document.
    pub fn num_terms(&self) -> usize { self.dictionary.len() }

    pub fn contains(&self, id: &str) -> bool { self.ids.contains_key(id) }

    /// Average token count across indexed documents, 0 when empty.
    pub fn avg_doc_len(&self) -> f32 {
        if self.docs.is_empty() { 0.0 } else { self.total_len as f32 / self.docs.len() as f32 }
    }

    /// Number of documents containing `term` (already tokenized form).
    pub fn doc_freq(&self, term: &str) -> usize {
        self.dictionary
            .get(term)
            .map(|tid| self.postings[*tid as usize].len())
            .unwrap_or(0)
    }

    /// Ingest one document. An id that is already indexed is replaced.
    pub fn add_document(&mut self, doc: Document<M>) -> DocId {
        if self.remove_document(&doc.id) {
            tracing::debug!(id = %doc.id, "replacing indexed document");
        }

        let tokens = tokenize(&doc.text);
        let len = tokens.len() as u32;
        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for term in tokens {
            let tid = self.intern(term);
            *tf_counts.entry(tid).or_insert(0) += 1;
        }

        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;
        for (&tid, &tf) in tf_counts.iter() {
            self.postings[tid as usize].insert(doc_id, tf);
        }
        self.total_len += len as u64;
        self.ids.insert(doc.id.clone(), doc_id);
        self.docs.insert(
            doc_id,
            DocEntry { id: doc.id, len, terms: tf_counts.into_iter().collect(), metadata: doc.metadata },
        );
        doc_id
    }

    fn intern(&mut self, term: String) -> TermId {
        if let Some(&tid) = self.dictionary.get(&term) {
            return tid;
        }
        let tid = match self.free_terms.pop() {
            Some(tid) => {
                self.terms[tid as usize] = term.clone();
                tid
            }
            None => {
                self.postings.push(HashMap::new());
                self.terms.push(term.clone());
                (self.postings.len() - 1) as TermId
            }
        };
        self.dictionary.insert(term, tid);
        tid
    }

    pub fn add_documents<I>(&mut self, docs: I) -> usize
    where
        I: IntoIterator<Item = Document<M>>,
    {
        let mut added = 0;
        for doc in docs {
            self.add_document(doc);
            added += 1;
        }
        tracing::debug!(added, num_docs = self.docs.len(), avg_doc_len = self.avg_doc_len(), "batch indexed");
        added
    }

    /// Drop a document and all of its postings. Returns false if `id` was not indexed.
    pub fn remove_document(&mut self, id: &str) -> bool {
        let Some(doc_id) = self.ids.remove(id) else { return false };
        let Some(entry) = self.docs.remove(&doc_id) else { return false };
        for (tid, _) in entry.terms {
            let plist = &mut self.postings[tid as usize];
            plist.remove(&doc_id);
            if plist.is_empty() {
                let term = std::mem::take(&mut self.terms[tid as usize]);
                self.dictionary.remove(&term);
                self.free_terms.push(tid);
            }
        }
        self.total_len -= entry.len as u64;
        true
    }

    pub fn metadata(&self, id: &str) -> Option<&M> {
        self.ids.get(id).and_then(|doc_id| self.docs.get(doc_id)).map(|d| &d.metadata)
    }

    pub fn clear(&mut self) {
        self.dictionary.clear();
        self.postings.clear();
        self.terms.clear();
        self.free_terms.clear();
        self.docs.clear();
        self.ids.clear();
        self.total_len = 0;
        self.next_doc_id = 0;
    }

    fn idf(&self, df: usize) -> f32 {
        let n = self.docs.len() as f32;
        let df = df as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Rank documents against `query`, best first, at most `limit` hits.
    ///
    /// Only documents sharing at least one term with the query are scored, and
    /// only strictly positive scores are returned. A query without terms yields
    /// no hits.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Hit<'_, M>> {
        let q_tokens = tokenize(query);
        if q_tokens.is_empty() || limit == 0 || self.docs.is_empty() {
            return Vec::new();
        }

        let Bm25Params { k1, b } = self.params;
        let avg_len = self.avg_doc_len().max(f32::EPSILON);
        let mut scores: HashMap<DocId, f32> = HashMap::new();
        for term in &q_tokens {
            let Some(&tid) = self.dictionary.get(term) else { continue };
            let plist = &self.postings[tid as usize];
            if plist.is_empty() { continue; }
            let idf = self.idf(plist.len());
            for (&doc_id, &tf) in plist {
                let Some(entry) = self.docs.get(&doc_id) else { continue };
                let tf = tf as f32;
                let norm = k1 * (1.0 - b + b * (entry.len as f32 / avg_len));
                *scores.entry(doc_id).or_insert(0.0) += idf * (tf * (k1 + 1.0)) / (tf + norm);
            }
        }

        let mut scored: Vec<(DocId, f32)> = scores.into_iter().filter(|(_, s)| *s > 0.0).collect();
        scored.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));
        scored.truncate(limit);

        scored
            .into_iter()
            .filter_map(|(doc_id, score)| {
                let entry = self.docs.get(&doc_id)?;
                Some(Hit { doc_id, id: entry.id.as_str(), score, metadata: &entry.metadata })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str) -> Document<()> {
        Document { id: id.to_string(), text: text.to_string(), metadata: () }
    }

    #[test]
    fn idf_matches_bm25_plus_one_form() {
        let mut index = Bm25Index::new();
        index.add_documents([doc("a", "red"), doc("b", "red blue"), doc("c", "green")]);
        // N = 3, df(red) = 2
        let expected = ((3.0f32 - 2.0 + 0.5) / (2.0 + 0.5) + 1.0).ln();
        assert!((index.idf(index.doc_freq("red")) - expected).abs() < 1e-6);
    }

    #[test]
    fn single_document_score_by_hand() {
        let mut index = Bm25Index::new();
        index.add_document(doc("a", "blue blue sky"));
        let hits = index.search("blue", 10);
        assert_eq!(hits.len(), 1);
        // N=1, df=1 -> idf = ln(0.5/1.5 + 1); dl == avgdl so norm = k1
        let idf = (0.5f32 / 1.5 + 1.0).ln();
        let expected = idf * (2.0 * 2.5) / (2.0 + 1.5);
        assert!((hits[0].score - expected).abs() < 1e-5);
    }

    #[test]
    fn remove_keeps_structures_consistent() {
        let mut index = Bm25Index::new();
        index.add_documents([doc("a", "one two"), doc("b", "two three three")]);
        assert!(index.remove_document("b"));
        assert!(!index.remove_document("b"));
        assert_eq!(index.len(), 1);
        assert_eq!(index.doc_freq("two"), 1);
        assert_eq!(index.doc_freq("three"), 0);
        assert!((index.avg_doc_len() - 2.0).abs() < f32::EPSILON);
        assert!(index.search("three", 10).is_empty());
    }

    #[test]
    fn removing_last_posting_drops_the_term() {
        let mut index = Bm25Index::new();
        index.add_documents([doc("a", "alpha beta"), doc("b", "beta")]);
        assert_eq!(index.num_terms(), 2);
        index.remove_document("a");
        assert_eq!(index.num_terms(), 1);
        assert_eq!(index.doc_freq("alpha"), 0);

        // the freed slot is reused instead of growing the postings table
        index.add_document(doc("c", "gamma"));
        assert_eq!(index.num_terms(), 2);
        assert_eq!(index.postings.len(), 2);
        assert_eq!(index.search("gamma", 10)[0].id, "c");
        assert!(index.search("alpha", 10).is_empty());
    }

    #[test]
    fn duplicate_id_replaces_document() {
        let mut index = Bm25Index::new();
        index.add_document(doc("a", "alpha"));
        index.add_document(doc("a", "beta"));
        assert_eq!(index.len(), 1);
        assert!(index.search("alpha", 10).is_empty());
        assert_eq!(index.search("beta", 10)[0].id, "a");
    }

    #[test]
    fn zero_limit_returns_nothing() {
        let mut index = Bm25Index::new();
        index.add_document(doc("a", "alpha"));
        assert!(index.search("alpha", 0).is_empty());
    }
}
