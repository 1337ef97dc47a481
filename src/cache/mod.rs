//! PPD mapping cache.
//!
//! [`PpdCache`] holds everything derived from a PPD document that is needed
//! to translate between PPD options and IPP attributes: keyword maps for
//! bins, sources, types and sizes, the preset grids, finishings, filters and
//! job metadata. It is built once, either from a document
//! ([`PpdCache::from_ppd`]) or from a cache file ([`PpdCache::load`]), and
//! is read-only afterwards. Share it across threads behind an `Arc`, for
//! instance through [`LoadedCaches`].
//!
//! Submodules:
//!
//! - [`builder`]: derive a cache from a document
//! - [`sizes`]: page size lookups
//! - [`presets`]: color/quality and content-optimize preset scoring
//! - [`finishings`]: finishings table and lookups
//! - [`store`]: cache file reader and writer
//! - [`loaded`]: memoized loading by path

pub mod builder;
pub mod finishings;
pub mod loaded;
pub mod presets;
pub mod sizes;
pub mod store;

pub use finishings::FinishingEntry;
pub use loaded::LoadedCaches;
pub use presets::{ColorMode, ContentOptimize, OptimizeGrid, PresetGrid, Quality};
pub use sizes::{CustomSizeRange, JobSize, PageSizeMatch, SizeEntry, SizeVariant};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::ipp::IppAttributes;

/// Cache file format version; files of any other version are out of date.
pub const CACHE_VERSION: u32 = 11;

/// A PWG keyword and the PPD choice it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordMap {
    pub pwg: String,
    pub ppd: String,
}

impl KeywordMap {
    pub fn new(pwg: impl Into<String>, ppd: impl Into<String>) -> Self {
        Self {
            pwg: pwg.into(),
            ppd: ppd.into(),
        }
    }
}

/// Mapping data derived from a PPD document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PpdCache {
    pub(crate) bins: Vec<KeywordMap>,
    pub(crate) sizes: Vec<SizeEntry>,
    pub(crate) custom: Option<CustomSizeRange>,
    pub(crate) source_option: Option<String>,
    pub(crate) sources: Vec<KeywordMap>,
    pub(crate) types: Vec<KeywordMap>,
    pub(crate) presets: PresetGrid,
    pub(crate) optimize_presets: OptimizeGrid,
    pub(crate) sides_option: Option<String>,
    pub(crate) sides_1sided: Option<String>,
    pub(crate) sides_2sided_long: Option<String>,
    pub(crate) sides_2sided_short: Option<String>,
    pub(crate) product: Option<String>,
    pub(crate) filters: Vec<String>,
    pub(crate) prefilters: Vec<String>,
    pub(crate) single_file: bool,
    pub(crate) finishings: Vec<FinishingEntry>,
    pub(crate) templates: Vec<String>,
    pub(crate) max_copies: i32,
    pub(crate) charge_info_uri: Option<String>,
    pub(crate) account_id: bool,
    pub(crate) accounting_user_id: bool,
    pub(crate) password: Option<String>,
    pub(crate) mandatory: Vec<String>,
    pub(crate) support_files: Vec<String>,
    pub(crate) strings: BTreeMap<String, String>,
}

impl Default for PpdCache {
    fn default() -> Self {
        Self {
            bins: Vec::new(),
            sizes: Vec::new(),
            custom: None,
            source_option: None,
            sources: Vec::new(),
            types: Vec::new(),
            presets: PresetGrid::default(),
            optimize_presets: OptimizeGrid::default(),
            sides_option: None,
            sides_1sided: None,
            sides_2sided_long: None,
            sides_2sided_short: None,
            product: None,
            filters: Vec::new(),
            prefilters: Vec::new(),
            single_file: false,
            finishings: Vec::new(),
            templates: Vec::new(),
            max_copies: 9999,
            charge_info_uri: None,
            account_id: false,
            accounting_user_id: false,
            password: None,
            mandatory: Vec::new(),
            support_files: Vec::new(),
            strings: BTreeMap::new(),
        }
    }
}

impl PpdCache {
    pub fn bins(&self) -> &[KeywordMap] {
        &self.bins
    }

    pub fn sizes(&self) -> &[SizeEntry] {
        &self.sizes
    }

    /// Custom size range, when the printer accepts custom sizes.
    pub fn custom_sizes(&self) -> Option<&CustomSizeRange> {
        self.custom.as_ref()
    }

    /// PPD option used for media sources (`InputSlot` or a vendor option).
    pub fn source_option(&self) -> Option<&str> {
        self.source_option.as_deref()
    }

    pub fn sources(&self) -> &[KeywordMap] {
        &self.sources
    }

    pub fn types(&self) -> &[KeywordMap] {
        &self.types
    }

    pub fn presets(&self) -> &PresetGrid {
        &self.presets
    }

    pub fn optimize_presets(&self) -> &OptimizeGrid {
        &self.optimize_presets
    }

    /// PPD option controlling duplex.
    pub fn sides_option(&self) -> Option<&str> {
        self.sides_option.as_deref()
    }

    /// Choices of the sides option: one-sided, two-sided long edge, two-sided
    /// short edge.
    pub fn sides_choices(&self) -> [Option<&str>; 3] {
        [
            self.sides_1sided.as_deref(),
            self.sides_2sided_long.as_deref(),
            self.sides_2sided_short.as_deref(),
        ]
    }

    /// Sides option choice for a PWG `sides` keyword.
    pub fn sides_choice(&self, sides: &str) -> Option<&str> {
        match sides {
            "one-sided" => self.sides_1sided.as_deref(),
            "two-sided-long-edge" => self.sides_2sided_long.as_deref(),
            "two-sided-short-edge" => self.sides_2sided_short.as_deref(),
            _ => None,
        }
    }

    pub fn product(&self) -> Option<&str> {
        self.product.as_deref()
    }

    /// Filter chain, `source/type cost program` lines.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn prefilters(&self) -> &[String] {
        &self.prefilters
    }

    pub fn single_file(&self) -> bool {
        self.single_file
    }

    /// Finishings table, highest value first.
    pub fn finishings(&self) -> &[FinishingEntry] {
        &self.finishings
    }

    /// `finishing-template` names offered by the PPD.
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn max_copies(&self) -> i32 {
        self.max_copies
    }

    pub fn charge_info_uri(&self) -> Option<&str> {
        self.charge_info_uri.as_deref()
    }

    /// True when jobs should carry a `job-account-id`.
    pub fn account_id(&self) -> bool {
        self.account_id
    }

    /// True when jobs should carry a `job-accounting-user-id`.
    pub fn accounting_user_id(&self) -> bool {
        self.accounting_user_id
    }

    /// Password prompt text, when the printer takes a job password.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Attributes every job must supply.
    pub fn mandatory(&self) -> &[String] {
        &self.mandatory
    }

    pub fn support_files(&self) -> &[String] {
        &self.support_files
    }

    /// Localized UI string for a key such as `media-source.tray-1`.
    pub fn ui_string(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }

    pub fn ui_strings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.strings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // ---- keyword lookups --------------------------------------------------

    /// PWG `output-bin` for a PPD `OutputBin` choice or PWG keyword.
    pub fn bin_for_legacy(&self, output_bin: &str) -> Option<&str> {
        legacy_lookup(&self.bins, output_bin)
    }

    /// PPD `OutputBin` choice for a PWG `output-bin` keyword.
    pub fn output_bin_for_keyword(&self, keyword: &str) -> Option<&str> {
        keyword_lookup(&self.bins, keyword)
    }

    /// PWG `media-source` for a PPD `InputSlot` choice or PWG keyword.
    pub fn source_for_legacy(&self, input_slot: &str) -> Option<&str> {
        legacy_lookup(&self.sources, input_slot)
    }

    /// PPD `InputSlot` choice for a PWG `media-source` keyword.
    pub fn input_slot_for_keyword(&self, keyword: &str) -> Option<&str> {
        keyword_lookup(&self.sources, keyword)
    }

    /// PPD `InputSlot` choice for a job.
    ///
    /// Uses the `media-source` of `media-col`. Without one, small media (up
    /// to 5x7in) asks for automatic selection, falling back to the photo
    /// tray.
    pub fn input_slot_for_job(&self, job: &IppAttributes) -> Option<&str> {
        if self.sources.is_empty() {
            return None;
        }

        let source = job
            .get_collection("media-col")
            .and_then(|col| col.get_str("media-source"));
        if let Some(source) = source {
            return self.input_slot_for_keyword(source);
        }

        let (size, _) = sizes::init_size(job)?;
        if size.width <= 5 * 2540 && size.length <= 7 * 2540 {
            return self
                .input_slot_for_keyword("auto")
                .or_else(|| self.input_slot_for_keyword("photo"));
        }
        None
    }

    /// PWG `media-type` for a PPD `MediaType` choice or PWG keyword.
    pub fn type_for_legacy(&self, media_type: &str) -> Option<&str> {
        legacy_lookup(&self.types, media_type)
    }

    /// PPD `MediaType` choice for a PWG `media-type` keyword.
    pub fn media_type_for_keyword(&self, keyword: &str) -> Option<&str> {
        keyword_lookup(&self.types, keyword)
    }

    /// PPD `MediaType` choice for the `media-type` of a job's `media-col`.
    pub fn media_type_for_job(&self, job: &IppAttributes) -> Option<&str> {
        let media_type = job
            .get_collection("media-col")
            .and_then(|col| col.get_str("media-type"))?;
        self.media_type_for_keyword(media_type)
    }

    /// Custom size keywords, `custom_max_...` and `custom_min_...`.
    pub fn custom_keywords(&self) -> Option<(String, String)> {
        self.custom.as_ref().map(|c| (c.max_keyword(), c.min_keyword()))
    }
}

fn legacy_lookup<'a>(maps: &'a [KeywordMap], name: &str) -> Option<&'a str> {
    maps.iter()
        .find(|m| m.ppd.eq_ignore_ascii_case(name) || m.pwg.eq_ignore_ascii_case(name))
        .map(|m| m.pwg.as_str())
}

fn keyword_lookup<'a>(maps: &'a [KeywordMap], keyword: &str) -> Option<&'a str> {
    maps.iter()
        .find(|m| m.pwg.eq_ignore_ascii_case(keyword))
        .map(|m| m.ppd.as_str())
}
