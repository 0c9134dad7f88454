use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use retriever_core::{
    AnalyzerConfig, DocumentId, FileSource, Retriever, StopWords, TfidfRetriever, Vectorizer, VectorizerConfig,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "retriever")]
#[command(about = "Retrieve the most relevant paragraphs for a query with TF-IDF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit on the input documents and print the best paragraphs for a query
    Query {
        /// Input path (file or directory of .json/.jsonl/.txt/.md)
        #[arg(long)]
        input: String,
        /// Free-text query
        #[arg(long, short)]
        query: String,
        /// Number of paragraphs to return
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        /// Comma-separated document ids to restrict results to
        #[arg(long)]
        doc_ids: Option<String>,
        /// Log every selected candidate
        #[arg(long, default_value_t = false)]
        verbose: bool,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
    /// Fit on the input documents and print corpus statistics
    Stats {
        #[arg(long)]
        input: String,
        /// Also list the N most frequent terms by document frequency
        #[arg(long, default_value_t = 0)]
        top_terms: usize,
        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
}

#[derive(Args)]
struct AnalyzerArgs {
    /// Remove English stop words
    #[arg(long, default_value_t = false)]
    stop_words: bool,
    /// Strip accents (NFKD, drop combining marks)
    #[arg(long, default_value_t = false)]
    strip_accents: bool,
    /// Apply the English Snowball stemmer
    #[arg(long, default_value_t = false)]
    stem: bool,
    /// Largest n-gram to index
    #[arg(long, default_value_t = 1)]
    max_ngram: usize,
    /// Use 1 + ln(tf) instead of the raw term count
    #[arg(long, default_value_t = false)]
    sublinear_tf: bool,
    /// Use idf = ln(N/df) + 1 instead of the smoothed form
    #[arg(long, default_value_t = false)]
    no_smooth_idf: bool,
}

impl AnalyzerArgs {
    fn vectorizer(&self) -> Result<Vectorizer> {
        let config = VectorizerConfig {
            analyzer: AnalyzerConfig {
                strip_accents: self.strip_accents,
                stop_words: self.stop_words.then_some(StopWords::English),
                stem: self.stem,
                ngram_range: (1, self.max_ngram),
                ..Default::default()
            },
            smooth_idf: !self.no_smooth_idf,
            sublinear_tf: self.sublinear_tf,
        };
        Ok(Vectorizer::new(config)?)
    }
}

#[derive(Serialize)]
struct Hit<'a> {
    rank: usize,
    document_id: &'a str,
    paragraph_id: u32,
    score: f64,
    text: &'a str,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { input, query, k, doc_ids, verbose, json, analyzer } => {
            run_query(&input, &query, k, doc_ids.as_deref(), verbose, json, &analyzer)
        }
        Commands::Stats { input, top_terms, analyzer } => run_stats(&input, top_terms, &analyzer),
    }
}

fn parse_doc_ids(raw: &str) -> Result<HashSet<DocumentId>> {
    let mut ids = HashSet::new();
    for id in raw.split(',').map(str::trim) {
        if id.is_empty() {
            anyhow::bail!("invalid argument: empty document id in {raw:?}");
        }
        ids.insert(id.to_string());
    }
    Ok(ids)
}

fn run_query(input: &str, query: &str, k: usize, doc_ids: Option<&str>, verbose: bool, json: bool, analyzer: &AnalyzerArgs) -> Result<()> {
    let candidates = doc_ids.map(parse_doc_ids).transpose()?;
    let retriever = TfidfRetriever::with_vectorizer(FileSource::new(input), analyzer.vectorizer()?);
    let summary = retriever.fit()?;
    tracing::info!(documents = summary.documents, paragraphs = summary.paragraphs, vocabulary = summary.vocabulary, input, "fitted documents");
    let got = retriever.retrieve(query, candidates.as_ref(), k, verbose)?;
    tracing::info!(hits = got.len(), k, filtered = candidates.is_some(), "query complete");

    let hits: Vec<Hit> = got
        .meta
        .iter()
        .zip(&got.passages)
        .zip(&got.scores)
        .enumerate()
        .map(|(i, ((m, text), &score))| Hit {
            rank: i + 1,
            document_id: &m.document_id,
            paragraph_id: m.paragraph_id,
            score,
            text,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }
    if hits.is_empty() {
        println!("no results");
    }
    for h in hits {
        println!("{:>3}. [{} #{}] {:.4}", h.rank, h.document_id, h.paragraph_id, h.score);
        for line in h.text.lines() {
            println!("     {line}");
        }
    }
    Ok(())
}

fn run_stats(input: &str, top_terms: usize, analyzer: &AnalyzerArgs) -> Result<()> {
    let retriever = TfidfRetriever::with_vectorizer(FileSource::new(input), analyzer.vectorizer()?);
    let summary = retriever.fit()?;
    tracing::info!(input, "fitted documents");
    println!("documents:  {}", summary.documents);
    println!("paragraphs: {}", summary.paragraphs);
    println!("vocabulary: {}", summary.vocabulary);

    if top_terms > 0 {
        let index = retriever.snapshot()?;
        let mut df: Vec<(&str, usize)> = index.document_frequencies().into_iter().collect();
        df.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        for (term, n) in df.into_iter().take(top_terms) {
            println!("{n:>8}  {term}");
        }
    }
    Ok(())
}
