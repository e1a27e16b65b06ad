//! On-disk corpus and index fixtures built with the stub embedder.

use std::path::{Path, PathBuf};

use grader::config::Config;
use grader::corpus::Corpus;
use grader::embedding::SentenceEmbedder;
use grader::index::{ElementType, Metric};
use grader::pipeline::build_index;

pub const PASSAGES: [&str; 5] = [
    "photosynthesis converts light to energy.",
    "mitosis is cell division.",
    "paris is the capital of france.",
    "water boils at one hundred degrees celsius at sea level.",
    "the heart pumps blood through the body.",
];

pub struct Artifacts {
    pub corpus_path: PathBuf,
    pub index_path: PathBuf,
}

impl Artifacts {
    /// A default config pointing at these artifacts (stub models).
    pub fn config(&self) -> Config {
        Config {
            index_path: self.index_path.clone(),
            corpus_path: self.corpus_path.clone(),
            ..Default::default()
        }
    }
}

/// Writes `processed_dataset.csv` and `corpus.index` for `passages` into `dir`.
pub fn write_artifacts(dir: &Path, passages: &[&str], element: ElementType) -> Artifacts {
    let corpus_path = dir.join("processed_dataset.csv");
    let mut writer = csv::Writer::from_path(&corpus_path).expect("create corpus csv");
    writer
        .write_record(["id", "processed_sentence"])
        .expect("write header");
    for (i, passage) in passages.iter().enumerate() {
        writer
            .write_record([i.to_string().as_str(), *passage])
            .expect("write row");
    }
    writer.flush().expect("flush corpus csv");

    let embedder = SentenceEmbedder::stub().expect("stub embedder");
    let corpus = Corpus::from_passages(passages.iter().copied());
    let index_path = dir.join("corpus.index");
    build_index(&embedder, &corpus, Metric::L2)
        .expect("build index")
        .write_to(&index_path, element)
        .expect("write index");

    Artifacts {
        corpus_path,
        index_path,
    }
}
