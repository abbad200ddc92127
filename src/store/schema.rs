// file: src/store/schema.rs
// description: Arrow schema and record batch conversion for document tables
// reference: https://docs.rs/arrow-array

use crate::error::{QaError, Result};
use crate::models::{Document, DocumentMetadata, SearchResult};
use arrow::datatypes::Float32Type;
use arrow_array::{
    Array, BooleanArray, FixedSizeListArray, Float32Array, RecordBatch, StringArray, UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const EMBEDDING_COLUMN: &str = "embedding";
pub const DISTANCE_COLUMN: &str = "_distance";

/// Arrow schema shared by the summary and detailed tables.
pub fn documents_schema(embedding_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("page_content", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("page", DataType::UInt32, false),
        Field::new("summary", DataType::Boolean, false),
        Field::new("chunk_index", DataType::UInt32, true),
        Field::new(
            EMBEDDING_COLUMN,
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                embedding_dim as i32,
            ),
            false,
        ),
    ]))
}

pub fn documents_to_batch(
    schema: Arc<Schema>,
    documents: &[Document],
    embeddings: &[Vec<f32>],
    embedding_dim: usize,
) -> Result<RecordBatch> {
    if documents.len() != embeddings.len() {
        return Err(QaError::VectorStore(format!(
            "{} documents but {} embeddings",
            documents.len(),
            embeddings.len()
        )));
    }

    if let Some(bad) = embeddings.iter().find(|e| e.len() != embedding_dim) {
        return Err(QaError::VectorStore(format!(
            "Embedding dimension {} does not match table dimension {}",
            bad.len(),
            embedding_dim
        )));
    }

    let ids: StringArray = documents.iter().map(|doc| Some(doc.id())).collect();
    let contents: StringArray = documents
        .iter()
        .map(|doc| Some(doc.page_content.as_str()))
        .collect();
    let sources: StringArray = documents
        .iter()
        .map(|doc| Some(doc.metadata.source.as_str()))
        .collect();
    let pages: UInt32Array = documents.iter().map(|doc| Some(doc.metadata.page)).collect();
    let summaries: BooleanArray = documents
        .iter()
        .map(|doc| Some(doc.metadata.summary))
        .collect();
    let chunk_indices: UInt32Array = documents
        .iter()
        .map(|doc| doc.metadata.chunk_index)
        .collect();

    let embedding_list = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        embeddings
            .iter()
            .map(|embedding| Some(embedding.iter().copied().map(Some))),
        embedding_dim as i32,
    );

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(ids),
            Arc::new(contents),
            Arc::new(sources),
            Arc::new(pages),
            Arc::new(summaries),
            Arc::new(chunk_indices),
            Arc::new(embedding_list),
        ],
    )
    .map_err(|e| QaError::VectorStore(format!("Failed to create record batch: {}", e)))
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| QaError::VectorStore(format!("Missing '{}' column", name)))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| QaError::VectorStore(format!("Invalid '{}' column type", name)))
}

/// Rows of a query result; rows without a distance column get distance 0.
pub fn batch_to_results(batch: &RecordBatch) -> Result<Vec<SearchResult>> {
    let contents = column::<StringArray>(batch, "page_content")?;
    let sources = column::<StringArray>(batch, "source")?;
    let pages = column::<UInt32Array>(batch, "page")?;
    let summaries = column::<BooleanArray>(batch, "summary")?;
    let chunk_indices = column::<UInt32Array>(batch, "chunk_index")?;
    let distances = batch
        .column_by_name(DISTANCE_COLUMN)
        .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

    Ok((0..batch.num_rows())
        .map(|i| {
            let document = Document {
                page_content: contents.value(i).to_string(),
                metadata: DocumentMetadata {
                    source: sources.value(i).to_string(),
                    page: pages.value(i),
                    summary: summaries.value(i),
                    chunk_index: (!chunk_indices.is_null(i)).then(|| chunk_indices.value(i)),
                },
            };
            let distance = distances.map_or(0.0, |d| d.value(i));
            SearchResult::new(document, distance)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_schema_generation() {
        let schema = documents_schema(384);
        assert_eq!(schema.fields().len(), 7);

        let embedding_field = schema.field_with_name(EMBEDDING_COLUMN).unwrap();
        assert!(matches!(
            embedding_field.data_type(),
            DataType::FixedSizeList(_, 384)
        ));
        assert!(schema.field_with_name("chunk_index").unwrap().is_nullable());
    }

    #[test]
    fn test_batch_round_trip_keeps_metadata() {
        let page = Document::page("book.pdf", 3, "page text");
        let docs = vec![
            Document::summary_of(&page, "short"),
            Document::chunk_of(&page, 1, "page text"),
        ];
        let embeddings = vec![vec![0.5, 0.5], vec![1.0, 0.0]];

        let batch = documents_to_batch(documents_schema(2), &docs, &embeddings, 2).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let results = batch_to_results(&batch).unwrap();
        let restored: Vec<Document> = results.into_iter().map(|r| r.document).collect();
        assert_eq!(restored, docs);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let docs = vec![Document::page("a", 0, "x")];
        let err = documents_to_batch(documents_schema(3), &docs, &[vec![1.0]], 3).unwrap_err();
        assert!(matches!(err, QaError::VectorStore(_)));
    }
}
