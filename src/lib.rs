//! # charity-rag
//!
//! Convert tabular charity records into natural-language paragraphs for
//! retrieval-augmented generation.
//!
//! Rows come from a CSV file, a JSON file, or an SQLite table. Each row is
//! normalized through a field alias table, rendered into one paragraph, and
//! the paragraphs are batched into a single document with an optional
//! overview header. The document can be printed, written to a file, or
//! stored in a `rag_contexts` table for later retrieval.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────────────────────┐   ┌────────────────┐
//! │   Sources   │──▶│       TextConverter        │──▶│     Sinks      │
//! │ CSV/JSON/DB │   │ aliases→paragraphs→batches │   │ stdout/file/DB │
//! └─────────────┘   └────────────────────────────┘   └────────────────┘
//! ```
//!
//! ## Library use
//!
//! ```rust
//! use charity_rag::convert::{format_for_rag, FormatOptions};
//! use charity_rag::models::RawRow;
//!
//! let row: RawRow = [
//!     ("Name of Organisation", "Helping Hands"),
//!     ("Type", "registered charity"),
//!     ("UEN", "T1234"),
//!     ("Sector", "Health"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let options = FormatOptions { include_metadata: false, batch_size: 100 };
//! let text = format_for_rag(&[row], options).unwrap();
//! assert!(text.starts_with(
//!     "Helping Hands is a registered charity with the UEN identifier T1234. \
//!      It operates within the Health sector."
//! ));
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Rows, records, batches |
//! | [`fields`] | Field alias table and value resolution |
//! | [`paragraph`] | Paragraph template |
//! | [`batch`] | Index-based batching |
//! | [`header`] | Overview header |
//! | [`convert`] | `format_for_rag` and document assembly |
//! | [`convert_cmd`] | `convert`, `inspect` and `preview` commands |
//! | [`progress`] | Progress reporting on stderr |
//! | [`sources`] | CSV, JSON, and SQLite row sources |
//! | [`import`] | CSV import into the charities table |
//! | [`inspect`] | Column coverage and row previews |
//! | [`export`] | Output files and elapsed time |
//! | [`store`] | Stored RAG contexts |
//! | [`stats`] | Database summary |
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod batch;
pub mod config;
pub mod convert;
pub mod convert_cmd;
pub mod db;
pub mod export;
pub mod fields;
pub mod header;
pub mod import;
pub mod inspect;
pub mod migrate;
pub mod models;
pub mod paragraph;
pub mod progress;
pub mod sources;
pub mod stats;
pub mod store;
