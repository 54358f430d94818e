//! Catalog gRPC Server
//!
//! Serves the laptop catalog as the `catalog.v1.LaptopService` gRPC service
//! with one method per call shape:
//!
//! - `CreateLaptop` (unary) stores a laptop and returns its ID.
//! - `SearchLaptop` (server streaming) sends every laptop matching a filter.
//! - `UploadImage` (client streaming) assembles an image from chunks.
//! - `RateLaptop` (bidirectional) answers each score with a running average.
//!
//! # Cancellation
//!
//! Each call gets a [`catalog::CallContext`] carrying the client's
//! `grpc-timeout`. Streaming responses are fed through a channel; when the
//! client stops listening the channel closes and the context is cancelled, so
//! a long search or rating exchange stops at its next step.
//!
//! # Example Flow
//!
//! ```text
//! Client                                    Server
//! │                                           │
//! │  RateLaptopRequest{id: A, score: 8}       │
//! │ ─────────────────────────────────────────>│
//! │                                           │
//! │  RateLaptopResponse{A, count: 1, avg: 8}  │
//! │<───────────────────────────────────────── │
//! │                                           │
//! │  RateLaptopRequest{id: A, score: 6}       │
//! │ ─────────────────────────────────────────>│
//! │                                           │
//! │  RateLaptopResponse{A, count: 2, avg: 7}  │
//! │<───────────────────────────────────────── │
//! │                                           │
//! │  (end of input)                           │
//! │ ─────────────────────────────────────────>│
//! │                                 status OK │
//! │<───────────────────────────────────────── │
//! ```

pub mod config;
pub mod proto;

mod metadata;
mod server;
mod status;

pub use config::{ConfigError, ServerConfig};
pub use server::{CatalogServer, CatalogService};

// Re-export proto types for convenience
pub use proto::{LaptopServiceClient, LaptopServiceServer};
