//! # Takeout Harness
//!
//! A local-first Google Takeout normalizer and viewer.
//!
//! Takeout Harness ingests a personal data export (YouTube watch and
//! search history in two format vintages, HTML and JSON, YouTube comments,
//! and Keep notes), normalizes every source into one canonical record shape
//! per category, deduplicates across re-ingestion and across formats, and
//! stores the result in SQLite for a read-only browser viewer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Export root  │──▶│  Extractors   │──▶│  SQLite   │
//! │ zip / dir    │   │ HTML / JSON  │   │ keyed     │
//! └──────────────┘   └──────────────┘   └────┬─────┘
//!                                            │
//!                          ┌─────────────────┤
//!                          ▼                 ▼
//!                     ┌──────────┐     ┌──────────┐
//!                     │   CLI    │     │   HTTP   │
//!                     │  (tko)   │     │ (viewer) │
//!                     └──────────┘     └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tko init                          # create database
//! tko parse ~/takeout-2024.zip      # ingest an export archive
//! tko parse ~/Takeout               # or an extracted directory
//! tko status                        # per-category record counts
//! tko serve                         # start the viewer API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Canonical record types and identity keys |
//! | [`timefmt`] | Timestamp normalization |
//! | [`archive`] | Export root location, zip unpacking |
//! | [`extractor_html`] | Markup-format activity extraction |
//! | [`extractor_activity`] | Structured-format activity extraction |
//! | [`extractor_comments`] | Comment payload extraction |
//! | [`extractor_keep`] | Keep note extraction |
//! | [`ingest`] | Ingestion orchestration |
//! | [`store`] | Keyed upsert store and database connection |
//! | [`server`] | Viewer HTTP API |
//! | [`migrate`] | Schema migrations |

pub mod admin;
pub mod archive;
pub mod config;
pub mod error;
pub mod extractor_activity;
pub mod extractor_comments;
pub mod extractor_html;
pub mod extractor_keep;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod server;
pub mod store;
pub mod timefmt;
