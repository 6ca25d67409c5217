//! Session-scoped conversational memory for multi-agent orchestration runs.
//!
//! metamem stores utterances from chat-style runs together with a vector
//! embedding of their cleaned text, and recalls the most relevant earlier
//! utterances of the same session for a new query. Terminal artifacts (ANSI
//! escapes, spinner glyphs, control bytes) are stripped before anything is
//! embedded, and orchestration scaffolding (role headers, turn markers,
//! timestamps) is kept out of both storage and recall results.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   computing cosine distances, or a process-local in-memory backend
//! - **Embeddings**: Local ONNX Runtime with all-MiniLM-L6-v2 (384 dimensions),
//!   or a feature-hashing provider that needs no model files
//! - **Recall**: session-scoped nearest neighbours, over-fetched, gated by a
//!   maximum cosine distance and filtered for noise and block terms
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`db`] — SQLite initialization, schema, metadata, and health checks
//! - [`embedding`] — Text-to-vector embedding providers
//! - [`memory`] — Core memory engine: cleaning, noise policy, backends, remember and recall
//! - [`ingest`] — Bulk ingestion of `.txt` run logs

pub mod config;
pub mod db;
pub mod embedding;
pub mod ingest;
pub mod memory;
