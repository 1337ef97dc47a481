//! Derive a [`PpdCache`] from a PPD document.

use std::collections::BTreeMap;

use metrics::counter;
use tracing::{debug, info};

use super::presets::{self, ColorMode, OptimizeGrid, PresetGrid, Quality};
use super::{CustomSizeRange, KeywordMap, PpdCache, SizeEntry, finishings};
use crate::error::{self, PpdCacheError, Result};
use crate::keyword;
use crate::media::{self, from_points};
use crate::ppd::PpdDocument;
use crate::telemetry;

// Two sizes within this distance are the same paper.
const SIZE_EQUIVALENT: i32 = 50;

const RAW_FILTER: &str = "application/vnd.cups-raw application/octet-stream 0 -";
const POSTSCRIPT_FILTER: &str = "application/vnd.cups-postscript 0 -";
const COMMAND_FILTER: &str = "application/vnd.cups-command application/postscript 100 commandtops";

const SIDES_OPTIONS: &[&str] = &["Duplex", "JCLDuplex", "EFDuplex", "EFDuplexing", "ARDuplex", "KD03Duplex"];

impl PpdCache {
    /// Build the mapping data for a document.
    ///
    /// Fails with [`PpdCacheError::InvalidInput`] when the document has
    /// neither page sizes nor custom size support.
    pub fn from_ppd(doc: &PpdDocument) -> Result<Self> {
        let result = build(doc);
        counter!(telemetry::BUILDS_TOTAL, "status" => telemetry::status(&result)).increment(1);
        error::track(result)
    }
}

fn build(doc: &PpdDocument) -> Result<PpdCache> {
    if doc.sizes.is_empty() && !doc.variable_sizes {
        return Err(PpdCacheError::InvalidInput("document has no page sizes".into()));
    }

    let mut strings = BTreeMap::new();
    let (source_option, sources) = map_sources(doc, &mut strings);
    let types = map_types(doc, &mut strings);
    let bins = map_bins(doc, &mut strings);

    let mut presets = PresetGrid::default();
    let mut optimize_presets = OptimizeGrid::default();
    if presets::apply_printer_presets(doc, &mut presets, &mut strings) {
        if Quality::ALL
            .iter()
            .all(|q| presets.get(ColorMode::Monochrome, *q).is_empty())
        {
            presets::synthesize_grayscale(doc, &mut presets);
        }
    } else {
        presets::assign_presets(doc, &mut presets, &mut optimize_presets);
    }

    let (sides_option, [sides_1sided, sides_2sided_long, sides_2sided_short]) = map_sides(doc);
    let (filters, prefilters) = map_filters(doc);

    let templates: Vec<String> = doc
        .find_option("cupsFinishingTemplate")
        .map(|opt| {
            opt.choices
                .iter()
                .map(|c| {
                    add_string(&mut strings, format!("finishing-template.{}", c.choice), &c.text);
                    c.choice.clone()
                })
                .collect()
        })
        .unwrap_or_default();

    let max_copies = match doc.attr_value("cupsMaxCopies") {
        Some(value) => keyword::atoi(value),
        None if doc.manual_copies => 1,
        None => 9999,
    };
    let is_true = |name: &str| doc.attr_value(name).is_some_and(|v| v.eq_ignore_ascii_case("true"));

    let mut support_files: Vec<String> = doc.find_attrs("cupsICCProfile").map(|a| a.value.clone()).collect();
    support_files.extend(doc.attr_value("APPrinterIconPath").map(str::to_string));

    let pc = PpdCache {
        bins,
        sizes: map_sizes(doc),
        custom: map_custom(doc),
        source_option,
        sources,
        types,
        presets,
        optimize_presets,
        sides_option,
        sides_1sided,
        sides_2sided_long,
        sides_2sided_short,
        product: doc.product.clone(),
        filters,
        prefilters,
        single_file: is_true("cupsSingleFile"),
        finishings: finishings::build(doc),
        templates,
        max_copies,
        charge_info_uri: doc.attr_value("cupsChargeInfoURI").map(str::to_string),
        account_id: is_true("cupsJobAccountId"),
        accounting_user_id: is_true("cupsJobAccountingUserId"),
        password: doc.attr_value("cupsJobPassword").map(str::to_string),
        mandatory: doc
            .attr_value("cupsMandatory")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        support_files,
        strings,
    };

    info!(
        product = pc.product.as_deref().unwrap_or(""),
        sizes = pc.sizes.len(),
        sources = pc.sources.len(),
        types = pc.types.len(),
        finishings = pc.finishings.len(),
        "built PPD cache"
    );
    Ok(pc)
}

// Localized strings keep the first text given for a key.
pub(crate) fn add_string(strings: &mut BTreeMap<String, String>, key: String, text: &str) {
    strings.entry(key).or_insert_with(|| text.to_string());
}

// ============================================================================
// Sizes
// ============================================================================

fn map_sizes(doc: &PpdDocument) -> Vec<SizeEntry> {
    let mut sizes: Vec<SizeEntry> = Vec::with_capacity(doc.sizes.len());

    for size in &doc.sizes {
        if size.name.eq_ignore_ascii_case("Custom") {
            continue;
        }

        let width = from_points(size.width);
        let length = from_points(size.length);
        let Some(media) = media::media_for_size(width, length) else {
            debug!(size = %size.name, "skipping page size without dimensions");
            continue;
        };

        // A standard name is used once; later sizes of the same paper get a
        // vendor name.
        let known = !media.is_custom() && !sizes.iter().any(|s| s.pwg == media.pwg);
        let pwg = if known {
            media.pwg.clone()
        } else {
            let name = keyword::unppdize_name(&size.name, Some("_."));
            keyword::format_size_name(None, Some(&name), width, length)
        };

        let entry = SizeEntry::new(
            pwg,
            size.name.clone(),
            media.width,
            media.length,
            [
                from_points(size.left),
                from_points(size.bottom),
                from_points(size.width - size.right),
                from_points(size.length - size.top),
            ],
        );

        let similar = sizes.iter().position(|old| {
            old.is_borderless() == entry.is_borderless()
                && (old.width - entry.width).abs() < SIZE_EQUIVALENT
                && (old.length - entry.length).abs() < SIZE_EQUIVALENT
        });
        match similar {
            None => sizes.push(entry),
            Some(i) => {
                let old = &sizes[i];
                let old_known = !old.pwg.starts_with("oe_") && !old.pwg.starts_with("om_");
                if known || (!old_known && entry.imageable_length() > old.imageable_length()) {
                    debug!(old = %old.ppd, new = %entry.ppd, "replacing similar page size");
                    sizes[i] = entry;
                } else {
                    debug!(kept = %old.ppd, dropped = %entry.ppd, "dropping similar page size");
                }
            }
        }
    }

    sizes
}

fn map_custom(doc: &PpdDocument) -> Option<CustomSizeRange> {
    if !doc.variable_sizes {
        return None;
    }
    let [left, bottom, right, top] = doc.custom_margins.map(from_points);
    Some(CustomSizeRange {
        min_width: from_points(doc.custom_min[0]),
        min_length: from_points(doc.custom_min[1]),
        max_width: from_points(doc.custom_max[0]),
        max_length: from_points(doc.custom_max[1]),
        margins: [left, bottom, right, top],
    })
}

// ============================================================================
// Sources, types and bins
// ============================================================================

fn prefix_eq(name: &str, prefix: &str) -> bool {
    name.get(..prefix.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(prefix))
}

fn source_keyword(choice: &str) -> String {
    let is = |name: &str| choice.eq_ignore_ascii_case(name);
    let pwg = if prefix_eq(choice, "Auto") || is("Default") {
        "auto"
    } else if is("Cassette") {
        "main"
    } else if is("PhotoTray") {
        "photo"
    } else if is("CDTray") {
        "disc"
    } else if prefix_eq(choice, "Multipurpose") || is("MP") || is("MPTray") {
        "by-pass-tray"
    } else if is("LargeCapacity") {
        "large-capacity"
    } else if prefix_eq(choice, "Lower") {
        "bottom"
    } else if prefix_eq(choice, "Middle") {
        "middle"
    } else if prefix_eq(choice, "Upper") {
        "top"
    } else if prefix_eq(choice, "Side") {
        "side"
    } else if is("Roll") {
        "main-roll"
    } else {
        return keyword::unppdize_name(choice, Some("_"));
    };
    pwg.to_string()
}

fn map_sources(doc: &PpdDocument, strings: &mut BTreeMap<String, String>) -> (Option<String>, Vec<KeywordMap>) {
    let Some(option) = doc.find_option("InputSlot").or_else(|| doc.find_option("HPPaperSource")) else {
        return (None, Vec::new());
    };

    let sources = option
        .choices
        .iter()
        .map(|c| {
            let map = KeywordMap::new(source_keyword(&c.choice), c.choice.clone());
            add_string(strings, format!("media-source.{}", map.pwg), &c.text);
            map
        })
        .collect();
    (Some(option.keyword.clone()), sources)
}

/// PPD name or prefix, and the standard `media-type` it maps to.
struct StandardType {
    ppd: &'static str,
    prefix: bool,
    pwg: &'static str,
}

const fn prefix(ppd: &'static str, pwg: &'static str) -> StandardType {
    StandardType { ppd, prefix: true, pwg }
}

const fn exact(ppd: &'static str, pwg: &'static str) -> StandardType {
    StandardType { ppd, prefix: false, pwg }
}

// The first three entries all map to "auto" and share one match count.
const STANDARD_TYPES: &[StandardType] = &[
    prefix("Auto", "auto"),
    exact("Any", "auto"),
    exact("Default", "auto"),
    prefix("Card", "cardstock"),
    prefix("Env", "envelope"),
    prefix("Gloss", "photographic-glossy"),
    exact("HighGloss", "photographic-high-gloss"),
    exact("Matte", "photographic-matte"),
    prefix("Plain", "stationery"),
    prefix("Coated", "stationery-coated"),
    exact("Inkjet", "stationery-inkjet"),
    exact("Letterhead", "stationery-letterhead"),
    prefix("Preprint", "stationery-preprinted"),
    exact("Recycled", "stationery-recycled"),
    prefix("Transparen", "transparency"),
];

impl StandardType {
    fn matches(&self, choice: &str) -> bool {
        if self.prefix {
            prefix_eq(choice, self.ppd)
        } else {
            choice.eq_ignore_ascii_case(self.ppd)
        }
    }
}

fn map_types(doc: &PpdDocument, strings: &mut BTreeMap<String, String>) -> Vec<KeywordMap> {
    let Some(option) = doc.find_option("MediaType") else {
        return Vec::new();
    };

    let mut counts = [0usize; STANDARD_TYPES.len()];
    let mut types: Vec<KeywordMap> = option
        .choices
        .iter()
        .map(|c| {
            // The last matching pattern names the type.
            let mut pwg = None;
            for (j, t) in STANDARD_TYPES.iter().enumerate() {
                if t.matches(&c.choice) {
                    pwg = Some(t.pwg);
                    counts[j] += 1;
                }
            }
            let pwg = pwg.map_or_else(|| keyword::unppdize_name(&c.choice, Some("_")), str::to_string);
            KeywordMap::new(pwg, c.choice.clone())
        })
        .collect();

    let auto = counts[..3].iter().sum();
    counts[..3].fill(auto);

    // Two choices claiming one standard type both fall back to their own names.
    for (map, choice) in types.iter_mut().zip(&option.choices) {
        let ambiguous = STANDARD_TYPES
            .iter()
            .zip(counts)
            .any(|(t, n)| n > 1 && map.pwg == t.pwg);
        if ambiguous {
            debug!(choice = %choice.choice, pwg = %map.pwg, "ambiguous media type");
            map.pwg = keyword::unppdize_name(&choice.choice, Some("_"));
        }
        add_string(strings, format!("media-type.{}", map.pwg), &choice.text);
    }

    types
}

fn map_bins(doc: &PpdDocument, strings: &mut BTreeMap<String, String>) -> Vec<KeywordMap> {
    let Some(option) = doc.find_option("OutputBin") else {
        return Vec::new();
    };

    option
        .choices
        .iter()
        .map(|c| {
            let pwg = keyword::unppdize_name(&c.choice, Some("_"));
            add_string(strings, format!("output-bin.{pwg}"), &c.text);
            KeywordMap::new(pwg, c.choice.clone())
        })
        .collect()
}

// ============================================================================
// Duplex and filters
// ============================================================================

fn map_sides(doc: &PpdDocument) -> (Option<String>, [Option<String>; 3]) {
    let Some(option) = SIDES_OPTIONS.iter().find_map(|name| doc.find_option(name)) else {
        return (None, [None, None, None]);
    };

    let mut sides: [Option<String>; 3] = [None, None, None];
    for c in &option.choices {
        let is = |names: &[&str]| names.iter().any(|n| c.choice.eq_ignore_ascii_case(n));
        let slot = if is(&["None", "False"]) {
            0
        } else if is(&["DuplexNoTumble", "LongEdge", "Top"]) {
            1
        } else if is(&["DuplexTumble", "ShortEdge", "Bottom"]) {
            2
        } else {
            continue;
        };
        sides[slot].get_or_insert_with(|| c.choice.clone());
    }

    (Some(option.keyword.clone()), sides)
}

fn has_filter(filters: &[String], mime_type: &str) -> bool {
    filters.iter().any(|f| {
        prefix_eq(f, mime_type)
            && f[mime_type.len()..].starts_with(|c: char| c.is_ascii_whitespace())
    })
}

fn map_filters(doc: &PpdDocument) -> (Vec<String>, Vec<String>) {
    let mut filters = vec![RAW_FILTER.to_string()];

    let filter2: Vec<String> = doc.find_attrs("cupsFilter2").map(|a| a.value.clone()).collect();
    if !filter2.is_empty() {
        filters.extend(filter2);
    } else if !doc.filters.is_empty() {
        filters.extend(doc.filters.iter().cloned());
    } else {
        filters.push(POSTSCRIPT_FILTER.to_string());
    }

    let commands_allowed = doc
        .attr_value("cupsCommands")
        .is_none_or(|v| !v.eq_ignore_ascii_case("none"));
    if commands_allowed
        && !has_filter(&filters, "application/vnd.cups-command")
        && has_filter(&filters, "application/vnd.cups-postscript")
    {
        filters.push(COMMAND_FILTER.to_string());
    }

    let prefilters = doc.find_attrs("cupsPreFilter").map(|a| a.value.clone()).collect();
    (filters, prefilters)
}
