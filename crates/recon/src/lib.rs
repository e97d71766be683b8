//! `rollcall-recon`: roster reconciliation engine.
//!
//! Pure engine crate: adapters turn delimited text or raw rows into a
//! report table and a roster ordering; [`reconcile`] projects report values
//! onto that ordering. No spreadsheet or CLI dependencies.

pub mod config;
pub mod engine;
pub mod error;
pub mod load;
pub mod model;

pub use config::{CanonicalOptions, ColumnRef, EmptyKeyPolicy, ReconConfig, ReconcileOptions, SourceOptions};
pub use engine::reconcile;
pub use error::{InputRole, ReconError, SchemaError};
pub use load::{CanonicalFormat, SourceFormat};
pub use model::{CanonicalSequence, OutputTable, ReconResult, ReconWarning, Record, SourceTable};
