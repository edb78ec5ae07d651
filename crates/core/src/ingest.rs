use crate::chunking::chunk_text;
use crate::embeddings::FallbackEmbedder;
use crate::error::IngestError;
use crate::extractor::extract_text;
use crate::models::{IngestionOptions, VectorMetadata, VectorRecord};
use crate::traits::VectorIndex;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

/// Regular files directly inside `folder`, sorted for a deterministic run
/// order. A documents directory is flat, so the walk does not recurse.
pub fn discover_document_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

#[derive(Debug)]
pub struct FileReport {
    pub file_name: String,
    pub chunk_count: usize,
}

#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct IngestionReport {
    pub files_found: usize,
    pub ingested: Vec<FileReport>,
    pub skipped: Vec<SkippedFile>,
    pub dry_run: bool,
}

/// Extracts, chunks, embeds, and upserts a documents directory into the
/// vector index, one batch upsert per file.
///
/// Re-running against the same namespace inserts new records under fresh
/// random-suffixed ids rather than replacing earlier ones; clearing the
/// namespace between runs is the operator's job. Not designed for
/// concurrent invocation against one namespace.
pub struct IngestionPipeline<V: VectorIndex> {
    embedder: FallbackEmbedder,
    index: V,
    options: IngestionOptions,
}

impl<V> IngestionPipeline<V>
where
    V: VectorIndex + Send + Sync,
{
    pub fn new(embedder: FallbackEmbedder, index: V, options: IngestionOptions) -> Self {
        Self {
            embedder,
            index,
            options,
        }
    }

    /// Processes every regular file in `folder`; a missing directory is
    /// the one run-level error. In dry-run mode each
    /// chunk gets a placeholder vector of the index dimension and neither
    /// the embedding provider nor the index is called; per-file chunk
    /// counts are still reported. A file that fails to extract, embed, or
    /// upsert lands in the skipped list with its reason and the run
    /// continues; files whose text yields no chunks are passed over
    /// silently.
    pub async fn run(&self, folder: &Path, dry_run: bool) -> Result<IngestionReport, IngestError> {
        if !folder.is_dir() {
            return Err(IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("documents directory not found: {}", folder.display()),
            )));
        }

        let files = discover_document_files(folder);
        let mut report = IngestionReport {
            files_found: files.len(),
            ingested: Vec::new(),
            skipped: Vec::new(),
            dry_run,
        };

        for path in files {
            match self.ingest_file(&path, dry_run).await {
                Ok(Some(file_report)) => report.ingested.push(file_report),
                Ok(None) => {}
                Err(error) => report.skipped.push(SkippedFile {
                    path,
                    reason: error.to_string(),
                }),
            }
        }

        Ok(report)
    }

    async fn ingest_file(
        &self,
        path: &Path,
        dry_run: bool,
    ) -> Result<Option<FileReport>, IngestError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))?
            .to_string();

        let text = extract_text(path)?;
        let chunks = chunk_text(&text, self.options.chunking);
        if chunks.is_empty() {
            return Ok(None);
        }

        let url = self
            .options
            .doc_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), file_name));

        let mut records = Vec::with_capacity(chunks.len());
        for (chunk_index, chunk) in chunks.into_iter().enumerate() {
            let values = if dry_run {
                vec![0.0; self.options.index_dim]
            } else {
                self.embedder.embed(&chunk).await?
            };

            records.push(VectorRecord {
                id: record_id(&file_name, chunk_index),
                values,
                metadata: VectorMetadata {
                    source_file: file_name.clone(),
                    chunk_index: chunk_index as u32,
                    chunk_text: chunk,
                    url: url.clone(),
                },
            });
        }

        let chunk_count = records.len();
        if !dry_run {
            self.index.upsert(&self.options.namespace, &records).await?;
        }

        Ok(Some(FileReport {
            file_name,
            chunk_count,
        }))
    }
}

/// `{file}#{index}-{suffix}`. The random suffix keeps ids from colliding
/// across repeated ingestion runs.
fn record_id(file_name: &str, chunk_index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{file_name}#{chunk_index}-{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::{discover_document_files, record_id, IngestionPipeline};
    use crate::chunking::ChunkingConfig;
    use crate::embeddings::FallbackEmbedder;
    use crate::error::{EmbeddingError, IndexError, IngestError};
    use crate::models::{IngestionOptions, ScoredMatch, VectorRecord};
    use crate::traits::{EmbeddingBackend, VectorIndex};
    use async_trait::async_trait;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    struct CountingBackend {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EmbeddingBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.25; 8])
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        upserts: Arc<Mutex<Vec<(String, Vec<VectorRecord>)>>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn upsert(
            &self,
            namespace: &str,
            records: &[VectorRecord],
        ) -> Result<(), IndexError> {
            self.upserts
                .lock()
                .unwrap()
                .push((namespace.to_string(), records.to_vec()));
            Ok(())
        }

        async fn query(
            &self,
            _namespace: &str,
            _vector: &[f32],
            _top_k: usize,
        ) -> Result<Vec<ScoredMatch>, IndexError> {
            Ok(Vec::new())
        }
    }

    fn options() -> IngestionOptions {
        IngestionOptions {
            namespace: "hr".to_string(),
            index_dim: 8,
            chunking: ChunkingConfig {
                max_chars: 1_200,
                overlap_chars: 200,
            },
            doc_base_url: Some("https://docs.example.com/hr/".to_string()),
        }
    }

    fn embedder(calls: Arc<AtomicUsize>) -> FallbackEmbedder {
        FallbackEmbedder::new(Box::new(CountingBackend { calls }), None, 8)
    }

    #[test]
    fn discovery_is_flat_and_sorted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.txt"), "b")?;
        fs::write(dir.path().join("a.txt"), "a")?;
        fs::create_dir(dir.path().join("nested"))?;
        fs::write(dir.path().join("nested").join("c.txt"), "c")?;

        let files = discover_document_files(dir.path());
        let names: Vec<_> = files
            .iter()
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
        Ok(())
    }

    #[test]
    fn record_ids_carry_file_chunk_and_random_suffix() {
        let id = record_id("handbook.pdf", 4);
        assert!(id.starts_with("handbook.pdf#4-"));
        assert_eq!(id.len(), "handbook.pdf#4-".len() + 8);
        assert_ne!(id, record_id("handbook.pdf", 4));
    }

    #[tokio::test]
    async fn dry_run_reports_chunks_without_any_network_calls() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempdir()?;
        fs::write(dir.path().join("policy.txt"), "x".repeat(3_000))?;

        let embed_calls = Arc::new(AtomicUsize::new(0));
        let index = RecordingIndex::default();
        let upserts = index.upserts.clone();
        let pipeline = IngestionPipeline::new(embedder(embed_calls.clone()), index, options());

        let report = pipeline.run(dir.path(), true).await?;

        assert_eq!(report.files_found, 1);
        assert_eq!(report.ingested.len(), 1);
        assert_eq!(report.ingested[0].chunk_count, 3);
        assert!(report.dry_run);
        assert_eq!(embed_calls.load(Ordering::SeqCst), 0);
        assert!(upserts.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn live_run_upserts_one_batch_per_file_with_metadata() -> Result<(), Box<dyn std::error::Error>>
    {
        let dir = tempdir()?;
        fs::write(dir.path().join("leave.txt"), "y".repeat(2_000))?;

        let embed_calls = Arc::new(AtomicUsize::new(0));
        let index = RecordingIndex::default();
        let upserts = index.upserts.clone();
        let pipeline = IngestionPipeline::new(embedder(embed_calls.clone()), index, options());

        let report = pipeline.run(dir.path(), false).await?;
        assert_eq!(report.ingested[0].chunk_count, 2);
        assert_eq!(embed_calls.load(Ordering::SeqCst), 2);

        let upserts = upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        let (namespace, records) = &upserts[0];
        assert_eq!(namespace, "hr");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].metadata.source_file, "leave.txt");
        assert_eq!(records[0].metadata.chunk_index, 0);
        assert_eq!(records[1].metadata.chunk_index, 1);
        assert_eq!(
            records[0].metadata.url.as_deref(),
            Some("https://docs.example.com/hr/leave.txt")
        );
        assert!(records[0].id.starts_with("leave.txt#0-"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_directory_is_a_run_level_error() {
        let pipeline = IngestionPipeline::new(
            embedder(Arc::new(AtomicUsize::new(0))),
            RecordingIndex::default(),
            options(),
        );

        let result = pipeline.run(Path::new("/nonexistent/documents"), true).await;
        assert!(matches!(result, Err(IngestError::Io(_))));
    }

    #[tokio::test]
    async fn empty_files_are_passed_over_and_bad_files_are_skipped(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("empty.txt"), "")?;
        fs::write(dir.path().join("broken.pdf"), b"%PDF-1.4\n%garbage")?;
        fs::write(dir.path().join("ok.txt"), "real content")?;

        let index = RecordingIndex::default();
        let pipeline =
            IngestionPipeline::new(embedder(Arc::new(AtomicUsize::new(0))), index, options());

        let report = pipeline.run(dir.path(), false).await?;

        assert_eq!(report.files_found, 3);
        assert_eq!(report.ingested.len(), 1);
        assert_eq!(report.ingested[0].file_name, "ok.txt");
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0]
            .path
            .file_name()
            .is_some_and(|name| name == "broken.pdf"));
        Ok(())
    }
}
