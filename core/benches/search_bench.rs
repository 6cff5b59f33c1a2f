use criterion::{criterion_group, criterion_main, Criterion};
use designdex_core::dataset::records_from_json;
use designdex_core::tokenizer::tokenize;
use designdex_core::{CategorySearch, SearchOptions};
use serde_json::{json, Value};

const WORDS: &[&str] = &[
    "primary", "blue", "button", "card", "modal", "gradient", "shadow", "glass", "dark", "light",
    "hover", "focus", "outline", "navy", "teal", "grid", "layout", "icon", "alert", "badge",
];

fn corpus(rows: usize) -> Value {
    let rows: Vec<Value> = (0..rows)
        .map(|i| {
            let name = format!("{} {}", WORDS[i % WORDS.len()], WORDS[(i * 7) % WORDS.len()]);
            let tags: Vec<&str> = (0..4).map(|j| WORDS[(i + j * 3) % WORDS.len()]).collect();
            json!({"name": name, "tags": tags, "id": i})
        })
        .collect();
    Value::Array(rows)
}

fn bench_tokenize(c: &mut Criterion) {
    let text = "Glassmorphism card with backdrop-blur, subtle border (rgba 255/255/255/0.2) and hover:shadow-lg; 主要按钮";
    c.bench_function("tokenize_record", |b| b.iter(|| tokenize(text)));
}

fn bench_search(c: &mut Criterion) {
    let mut search = CategorySearch::new();
    search.load_dataset("components", records_from_json(corpus(5_000)));
    search.load_dataset("colors", records_from_json(corpus(1_000)));
    let options = SearchOptions::default().category("colors");
    c.bench_function("search_filtered", |b| b.iter(|| search.search("blue glass hover", &options)));
}

criterion_group!(benches, bench_tokenize, bench_search);
criterion_main!(benches);
