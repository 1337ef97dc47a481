//! ppdcache - PPD to PWG/IPP capability mapping and cache engine
//!
//! This crate derives a [`PpdCache`] from a PPD document: the mapping
//! between the PPD's page sizes, input slots, media types, output bins,
//! presets and finishings and their PWG/IPP counterparts. The cache can be
//! written to disk and loaded again without re-reading the PPD, and is used
//! to translate print job options into IPP job attributes.
//!
//! # Example
//!
//! ```rust,no_run
//! use ppdcache::{JobRequest, OptionList, PpdCache, convert_options, ppd::PpdDocument};
//!
//! fn main() -> ppdcache::Result<()> {
//!     let mut doc = PpdDocument::new();
//!     // ... populate the document from a PPD parser ...
//!     doc.mark_defaults();
//!
//!     let pc = PpdCache::from_ppd(&doc)?;
//!     pc.save("/var/cache/ppdcache/office.data", None)?;
//!
//!     let pc = PpdCache::load("/var/cache/ppdcache/office.data")?;
//!     let job = JobRequest::new(OptionList::parse("media=iso_a4_210x297mm sides=one-sided"), 1);
//!     let converted = convert_options(&pc, &doc, &job);
//!     println!("{} attributes, {} copies", converted.attributes.len(), converted.copies);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod convert;
pub mod error;
pub mod ipp;
pub mod keyword;
pub mod media;
pub mod options;
pub mod ppd;
pub mod telemetry;

// Re-export main types at crate root
pub use cache::{
    CACHE_VERSION, ColorMode, ContentOptimize, CustomSizeRange, FinishingEntry, KeywordMap,
    LoadedCaches, OptimizeGrid, PageSizeMatch, PpdCache, PresetGrid, Quality, SizeEntry,
};
pub use config::Config;
pub use convert::{ConvertedJob, JobRequest, convert_options};
pub use error::{PpdCacheError, Result, last_error};
pub use ipp::{Group, IppAttribute, IppAttributes, IppValue};
pub use media::PwgMedia;
pub use options::OptionList;
