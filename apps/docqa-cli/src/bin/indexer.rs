use std::{env, fs, path::PathBuf};

use docqa_cli::{flag_value, init_logging, load_settings};
use docqa_core::data_processor::{ChunkingConfig, DataProcessor};
use docqa_embed::get_default_embedder;
use docqa_vector::{embed_chunks, IndexPaths, VectorStore, DEFAULT_BATCH_SIZE};

fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    init_logging(&settings.logging);

    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir = None;
    let mut limit = None;
    let mut batch_size = DEFAULT_BATCH_SIZE;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => { limit = Some(flag_value::<usize>(&args, i, "--limit")); i += 1; }
            "--batch-size" => { batch_size = flag_value::<usize>(&args, i, "--batch-size").max(1); i += 1; }
            "--help" | "-h" => {
                println!("Usage: docqa-indexer [DATA_DIR] [--limit N] [--batch-size N]");
                return Ok(());
            }
            a if !a.starts_with('-') => data_dir = Some(PathBuf::from(a)),
            other => { eprintln!("Unknown flag: {other}"); std::process::exit(1); }
        }
        i += 1;
    }
    let kb = &settings.knowledge_base;
    let data_dir = data_dir.unwrap_or_else(|| kb.raw_dir());
    println!("Knowledge Base Builder\n======================");
    println!("Data directory: {}", data_dir.display());

    let processor = DataProcessor::with_config(ChunkingConfig::from(&settings.retrieval));
    let chunks = match limit {
        Some(limit) => { println!("Limiting to {} files", limit); processor.process_directory_limited(&data_dir, limit)? }
        None => processor.process_directory(&data_dir)?,
    };
    if chunks.is_empty() {
        anyhow::bail!("no chunks to index: {} has no .md or .txt documents with content", data_dir.display());
    }
    let documents = chunks.iter().filter(|c| c.chunk_id == 0).count();

    let chunks_path = kb.chunks_path();
    if let Some(parent) = chunks_path.parent() { fs::create_dir_all(parent)?; }
    fs::write(&chunks_path, serde_json::to_vec_pretty(&chunks)?)?;
    tracing::info!(path = %chunks_path.display(), chunks = chunks.len(), "chunks written");

    let embedder = get_default_embedder(&settings.embedding)?;
    let vectors = embed_chunks(embedder.as_ref(), &chunks, batch_size, true)?;

    let store = VectorStore::new(embedder.dim());
    let chunk_count = chunks.len();
    store.build(&vectors, chunks)?;
    let paths = IndexPaths::from_settings(kb);
    let manifest = store.persist(&paths)?;
    tracing::info!(documents, chunks = chunk_count, dim = manifest.dim, vectors = manifest.count, "index built");

    println!("\nIndexing completed successfully!");
    println!("Documents: {}", documents);
    println!("Chunks:    {}", chunk_count);
    println!("Dimension: {}", manifest.dim);
    println!("Vectors:   {} -> {}", manifest.count, paths.vectors.display());
    println!("Metadata:  {}", paths.metadata.display());
    println!("\nStart the tool server with: cargo run --bin docqa-tool-server");
    Ok(())
}
