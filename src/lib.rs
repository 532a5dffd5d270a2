//! # Paperchat
//!
//! A personal RAG chatbot backend. Accepts PDF uploads, extracts and chunks
//! their text, computes embeddings via the Cohere API, stores vectors in a
//! hosted Pinecone index, retrieves relevant chunks for a query, and
//! persists chat history in a local SQLite store.
//!
//! ## Architecture
//!
//! ```text
//! upload:  PDF ──▶ extract ──▶ clean+chunk ──▶ Cohere embed ──▶ Pinecone upsert
//! query:   text ──▶ Cohere embed ──▶ Pinecone top-k ──▶ scored chunks
//! chat:    HTTP ──▶ SQLite chat_history / sessions
//! ```
//!
//! Everything non-trivial is delegated: PDF parsing to `pdf-extract`,
//! embeddings and similarity search to hosted services over plain HTTP,
//! persistence to SQLite via sqlx. The one piece of original logic is the
//! sliding-window chunker in [`chunk`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment-variable configuration |
//! | [`models`] | Core data types and API bodies |
//! | [`chunk`] | Text cleanup and sliding-window chunking |
//! | [`extract`] | PDF text extraction |
//! | [`embedding`] | Cohere embedding client |
//! | [`vector_index`] | Pinecone upsert/query client |
//! | [`store`] | Chat history and session CRUD |
//! | [`server`] | Axum HTTP server and routes |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod chat;
pub mod chunk;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod migrate;
pub mod models;
pub mod query;
pub mod server;
pub mod sessions;
pub mod store;
pub mod upload;
pub mod vector_index;
