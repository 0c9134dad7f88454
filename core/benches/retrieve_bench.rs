use criterion::{criterion_group, criterion_main, Criterion};
use retriever_core::tokenizer::tokenize;
use retriever_core::{Document, InMemorySource, Retriever, TfidfRetriever};

const WORDS: &[&str] = &[
    "river", "stone", "market", "engine", "harbor", "signal", "garden", "lantern", "copper", "meadow",
    "archive", "compass", "thunder", "velvet", "orbit", "canyon", "pepper", "glacier", "ribbon", "falcon",
];

fn synthetic_corpus(docs: usize, paragraphs: usize) -> Vec<Document> {
    let mut seed: u64 = 42;
    let mut next = move || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) as usize
    };
    (0..docs)
        .map(|d| {
            let text = (0..paragraphs)
                .map(|_| (0..40).map(|_| WORDS[next() % WORDS.len()]).collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\n\n");
            Document::new(format!("doc{d}"), text)
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = synthetic_corpus(1, 50).remove(0).text;
    c.bench_function("tokenize_50_paragraphs", |b| b.iter(|| tokenize(&text)));
}

fn bench_fit_and_retrieve(c: &mut Criterion) {
    let retriever = TfidfRetriever::new(InMemorySource::new(synthetic_corpus(200, 10)));
    c.bench_function("fit_2000_paragraphs", |b| b.iter(|| retriever.fit().unwrap()));
    retriever.fit().unwrap();
    c.bench_function("retrieve_top10", |b| {
        b.iter(|| retriever.retrieve("copper lantern harbor", None, 10, false).unwrap())
    });
}

criterion_group!(benches, bench_tokenize, bench_fit_and_retrieve);
criterion_main!(benches);
