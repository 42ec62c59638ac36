//! # News Portal
//!
//! A read-only news portal that aggregates articles and sidebar data from a
//! schema-less DynamoDB table and resolves article images stored in S3 into
//! short-lived presigned URLs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐
//! │ DynamoDB │──▶│ Normalize │──▶│  Project  │──▶│  Filter  │──┐
//! │   Scan   │   │           │   │ + S3 URLs │   │          │  │   ┌──────────┐
//! └──────────┘   └─────┬─────┘   └───────────┘   └──────────┘  ├──▶│   HTTP   │
//!                      │         ┌───────────┐                 │   │  / CLI   │
//!                      └────────▶│ Aggregate │─────────────────┘   └──────────┘
//!                                │  Sidebar  │
//!                                └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! portal serve                          # HTTP server on :3000
//! portal articles --search monsoon      # filtered articles as JSON
//! portal article 42                     # one article
//! portal sidebar                        # sidebar as JSON
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Canonical entities |
//! | [`normalize`] | Typed-attribute and plain value normalization |
//! | [`storage`] | Storage backend trait and DynamoDB client |
//! | [`resolver`] | Image key → presigned URL |
//! | [`projector`] | Raw record → [`models::Article`] |
//! | [`sidebar`] | Sidebar convention detection and aggregation |
//! | [`filter`] | Search and category filtering |
//! | [`service`] | The content service consumed by the HTTP layer and CLI |
//! | [`server`] | HTTP server |
//! | [`sigv4`] | AWS Signature V4 |
//! | [`error`] | Error types |

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod projector;
pub mod resolver;
pub mod server;
pub mod service;
pub mod sidebar;
pub mod sigv4;
pub mod storage;
