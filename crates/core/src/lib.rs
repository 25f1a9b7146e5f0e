//! # nimbusdb-core
//!
//! Embeddable in-memory approximate nearest-neighbor vector index.
//!
//! Vectors are inserted under string identifiers and queried by cosine
//! similarity through a concurrent HNSW graph. Durability comes from an
//! append-only write-ahead log that is replayed through the normal insert
//! path on startup. This crate has zero async dependencies; the HTTP
//! surface lives in `nimbusdb-server`.

/// Compile-time defaults: HNSW tuning parameters, limits, and server defaults.
pub mod config;
/// Crate-wide error type and `Result` alias.
pub mod error;
/// Concurrent HNSW graph index: structure, insertion, search, and scratch pooling.
pub mod hnsw;
/// The `Match` result type and the `VectorIndex` contract shared by all indexes.
pub mod index;
/// Linear-scan index used as a ground-truth oracle in recall tests.
pub mod naive;
/// Priority-queue abstractions backing graph traversal and top-k selection.
pub mod queue;
/// Storage layer: the write-ahead log.
pub mod storage;
/// Vector math primitives: dot product, magnitude, cosine similarity.
pub mod vector;
