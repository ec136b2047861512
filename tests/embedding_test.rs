use std::path::Path;

use news_classifier::{
    corpus::{CorpusRecord, DatasetRole},
    embedding::{DocumentEmbedder, EmbeddableDocument, FeatureSizer, VectorTable},
    text::{LemmaNormalizer, STOPWORDS, is_stopword},
};

fn fixture_table() -> VectorTable {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/vectors.csv");
    VectorTable::load(&path, &STOPWORDS).expect("vector fixture loads")
}

fn normalized(text: &str) -> EmbeddableDocument {
    let mut document = EmbeddableDocument::new(CorpusRecord::new(
        "article",
        text,
        DatasetRole::Testing,
        "-1",
    ));
    document.normalize_with(&LemmaNormalizer::new());
    document
}

#[test]
fn fixture_table_drops_stopwords_and_duplicates() {
    let table = fixture_table();

    assert_eq!(table.dimension(), 4);
    assert_eq!(table.len(), 24);
    assert!(table.find("the").is_none());
    assert!(table.find("with").is_none());
    assert!(table.iter().all(|entry| !is_stopword(entry.word())));
    assert_eq!(
        table.find("VIRUS").expect("virus").vector(),
        &[0.92, 0.08, 0.10, 0.02]
    );
}

#[test]
fn embedding_is_idempotent() {
    let table = fixture_table();
    let embedder = DocumentEmbedder::new(&table);
    let mut document = normalized("Doctors treat patients with virus symptoms in hospital");
    document.set_row_count(6);

    let first: Vec<u32> = embedder
        .embed(&mut document)
        .expect("embeds")
        .iter()
        .map(|v| v.to_bits())
        .collect();
    document.set_row_count(6);
    let second: Vec<u32> = embedder
        .embed(&mut document)
        .expect("embeds")
        .iter()
        .map(|v| v.to_bits())
        .collect();

    let mut fresh = normalized("Doctors treat patients with virus symptoms in hospital");
    fresh.set_row_count(6);
    let third: Vec<u32> = embedder
        .embed(&mut fresh)
        .expect("embeds")
        .iter()
        .map(|v| v.to_bits())
        .collect();

    assert_eq!(first, second);
    assert_eq!(first, third);
}

#[test]
fn text_without_known_words_embeds_to_zero() {
    let table = fixture_table();
    let mut document = normalized("Quarterly earnings beat expectations");
    document.set_row_count(9);

    let features = DocumentEmbedder::new(&table)
        .embed(&mut document)
        .expect("embeds");
    assert_eq!(features.len(), 4);
    assert!(features.iter().all(|&v| v == 0.0));
}

#[test]
fn exactly_sized_document_fills_every_row() {
    let table = fixture_table();
    let embedder = DocumentEmbedder::new(&table);
    let sizer = FeatureSizer::new(&table);
    let document = normalized("The virus outbreak sent patients and doctors to hospital");
    let text = document.normalized_text().expect("normalized");

    let size = sizer.in_vocabulary_count(text);
    assert_eq!(size, 5);

    let matrix = embedder.matrix(text, size);
    assert_eq!(matrix.dim(), (5, 4));
    assert!(
        matrix
            .rows()
            .into_iter()
            .all(|row| row.iter().any(|&v| v != 0.0))
    );

    let padded = embedder.matrix(text, size + 1);
    assert!(padded.row(size).iter().all(|&v| v == 0.0));
}
