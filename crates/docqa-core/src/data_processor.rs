use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::chunker::chunk_text;
use crate::settings::RetrievalSettings;
use crate::types::Chunk;

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50 }
    }
}

impl From<&RetrievalSettings> for ChunkingConfig {
    fn from(r: &RetrievalSettings) -> Self {
        Self { chunk_size: r.chunk_size, chunk_overlap: r.chunk_overlap }
    }
}

/// Turns a directory of `.md` / `.txt` documents into [`Chunk`]s.
#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

const EXTENSIONS: &[&str] = &["md", "txt"];

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        self.process_files(data_dir, self.list_document_files(data_dir))
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<Chunk>> {
        let mut files = self.list_document_files(data_dir);
        if files.len() > limit { files.truncate(limit); tracing::info!(limit, "limited to first files"); }
        self.process_files(data_dir, files)
    }

    fn process_files(&self, data_dir: &Path, files: Vec<PathBuf>) -> Result<Vec<Chunk>> {
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .md or .txt documents found");
            return Ok(vec![]);
        }
        let sources = source_names(data_dir, &files);
        let mut all_chunks = Vec::new();
        for (file_index, (file_path, source)) in files.iter().zip(&sources).enumerate() {
            let content = collapse_blank_lines(&self.read_file_content(file_path)?);
            let chunks = self.chunk_document(&content, source);
            tracing::info!(file = %file_path.display(), n = file_index + 1, of = files.len(), chunks = chunks.len(), "chunked document");
            all_chunks.extend(chunks);
        }
        tracing::info!(files = files.len(), chunks = all_chunks.len(), "processed documents");
        Ok(all_chunks)
    }

    pub fn chunk_document(&self, content: &str, source: &str) -> Vec<Chunk> {
        chunk_text(content, self.chunking_config.chunk_size, self.chunking_config.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, text)| Chunk { text: text.trim().to_string(), source: source.to_string(), chunk_id })
            .collect()
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn list_document_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            let ext = path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
            if ext.as_deref().is_some_and(|e| EXTENSIONS.contains(&e)) { files.push(path.to_path_buf()); }
        }
        files.sort(); files
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "unknown".to_string())
}

/// Source name per file: the file stem, or the `/`-separated path relative to
/// `data_dir` (extension kept) when several files share that stem.
pub fn source_names(data_dir: &Path, files: &[PathBuf]) -> Vec<String> {
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for f in files { *stem_counts.entry(file_stem(f)).or_default() += 1; }
    files
        .iter()
        .map(|f| {
            let stem = file_stem(f);
            if stem_counts[&stem] == 1 { return stem; }
            let rel = f.strip_prefix(data_dir).unwrap_or(f);
            rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
        })
        .collect()
}

/// Replace any run of blank (whitespace-only) lines with a single empty line.
pub fn collapse_blank_lines(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut pending_blank = false;
    for line in content.lines() {
        if line.trim().is_empty() { pending_blank = !out.is_empty(); continue; }
        if pending_blank { out.push('\n'); pending_blank = false; }
        if !out.is_empty() { out.push('\n'); }
        out.push_str(line);
    }
    out
}
