use designdex_core::{Bm25Index, Bm25Params, Document};

fn doc(id: &str, text: &str) -> Document<()> {
    Document { id: id.to_string(), text: text.to_string(), metadata: () }
}

fn sample_index() -> Bm25Index {
    let mut index = Bm25Index::new();
    index.add_documents([
        doc("a", "primary blue button"),
        doc("b", "secondary gray button outline"),
        doc("c", "danger red alert"),
        doc("d", "blue blue gradient hero"),
    ]);
    index
}

#[test]
fn queries_without_terms_return_nothing() {
    let index = sample_index();
    assert!(index.search("", 10).is_empty());
    assert!(index.search("   ", 10).is_empty());
    assert!(index.search("!!! ---", 10).is_empty());
}

#[test]
fn unknown_terms_return_nothing() {
    let index = sample_index();
    assert!(index.search("zebra", 10).is_empty());
}

#[test]
fn unknown_term_does_not_block_known_ones() {
    let index = sample_index();
    let hits = index.search("zebra alert", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "c");
}

#[test]
fn results_are_ranked_and_limited() {
    let index = sample_index();
    let hits = index.search("blue", 10);
    let ids: Vec<&str> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec!["d", "a"]);
    assert!(hits[0].score > hits[1].score);
    assert!(hits.iter().all(|h| h.score > 0.0));

    let top = index.search("blue button", 1);
    assert_eq!(top.len(), 1);
}

#[test]
fn higher_term_frequency_never_scores_lower() {
    for params in [Bm25Params::default(), Bm25Params { k1: 0.5, b: 0.0 }, Bm25Params { k1: 2.0, b: 1.0 }] {
        let mut index = Bm25Index::with_params(params);
        // same length, different tf for "blue"
        index.add_documents([
            doc("one", "blue red red"),
            doc("two", "blue blue red"),
            doc("three", "blue blue blue"),
        ]);
        let hits = index.search("blue", 10);
        let score = |id: &str| hits.iter().find(|h| h.id == id).map(|h| h.score).unwrap();
        assert!(score("two") >= score("one"));
        assert!(score("three") >= score("two"));
    }
}

#[test]
fn longer_documents_are_normalized_down() {
    let mut index = Bm25Index::new();
    index.add_documents([doc("short", "blue"), doc("long", "blue sky sea ocean navy cobalt")]);
    let hits = index.search("blue", 10);
    assert_eq!(hits[0].id, "short");
}

#[test]
fn equal_scores_keep_insertion_order() {
    let mut index = Bm25Index::new();
    index.add_documents([doc("z", "blue card"), doc("m", "blue card"), doc("a", "blue card")]);
    let hits = index.search("blue", 10);
    let ids: Vec<&str> = hits.iter().map(|h| h.id).collect();
    assert_eq!(ids, vec!["z", "m", "a"]);
    assert_eq!(hits[0].score, hits[2].score);
}

#[test]
fn clear_resets_everything() {
    let mut index = sample_index();
    index.clear();
    assert_eq!(index.len(), 0);
    assert!(index.is_empty());
    assert_eq!(index.avg_doc_len(), 0.0);
    assert!(index.search("blue", 10).is_empty());
    assert!(index.search("button", 10).is_empty());
}

#[test]
fn batch_average_tracks_all_documents() {
    let mut index = Bm25Index::<()>::new();
    index.add_documents([doc("a", "one"), doc("b", "one two three")]);
    assert!((index.avg_doc_len() - 2.0).abs() < f32::EPSILON);
    index.add_document(doc("c", "one two three four five"));
    assert!((index.avg_doc_len() - 3.0).abs() < f32::EPSILON);
}

#[test]
fn metadata_is_returned_with_hits() {
    let mut index = Bm25Index::new();
    index.add_document(Document { id: "x".into(), text: "teal swatch".into(), metadata: 42u32 });
    let hits = index.search("teal", 5);
    assert_eq!(*hits[0].metadata, 42);
    assert_eq!(index.metadata("x"), Some(&42));
}
