//! Builds Volatility ISF symbol files from distribution kernel packages.
//!
//! For each kernel published by a supported distribution, this crate
//! locates the runtime kernel package and its debug-symbol counterpart on
//! the public mirrors, extracts the `System.map` and debug `vmlinux` from
//! them, and hands both to the external `dwarf2json` generator. The
//! resulting ISF JSON document is persisted xz-compressed under
//! `symbol_files/<os>/<kernel>/`, next to the kernel's banner string.
//!
//! # Architecture
//!
//! ```text
//! distro::resolve ──▶ Catalog (kernel id ▶ package pair)
//!                         │
//!                         ▼
//! pipeline::run ── per kernel ──▶ fetch::validate_links
//!                                 archive::extract_member (×2)
//!                                 generator (dwarf2json)
//!                                 store::publish_isf
//! ```
//!
//! The catalog is immutable once resolved; kernels are processed by a
//! bounded worker pool with per-kernel failure isolation. Only an
//! unsupported distribution/branch combination aborts a run.

pub mod archive;
pub mod catalog;
pub mod distro;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod pipeline;
pub mod store;

pub use catalog::{Catalog, KernelFilter, PackagePair};
pub use distro::Distro;
pub use error::BuilderError;
pub use pipeline::{CancelToken, PipelineOptions};
pub use store::SymbolStore;
