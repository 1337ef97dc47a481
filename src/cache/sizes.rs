//! Page sizes: entries, custom ranges and PPD `PageSize` lookups.

use std::borrow::Cow;

use serde::Serialize;

use super::PpdCache;
use crate::ipp::IppAttributes;
use crate::keyword;
use crate::media::{self, PwgMedia};

/// Size tolerance of a page size match, about 5 points. Exclusive: a
/// difference of 176 or more does not match.
pub const SIZE_EPSILON: u32 = 176;

/// Margin tolerance of a page size match, about 1 point. Exclusive like
/// [`SIZE_EPSILON`].
pub const MARGIN_EPSILON: u32 = 35;

/// Kind of a PPD page size, from its name suffix and margins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeVariant {
    /// Plain size name (`A4`)
    Standard,
    /// Suffixed size with no margins (`A4.Fullbleed`)
    Borderless,
    /// Rotated size (`A4.Transverse`)
    Transverse,
    /// Any other suffixed size
    Other,
}

impl SizeVariant {
    pub fn classify(ppd: &str, margins: [i32; 4]) -> Self {
        let Some((_, suffix)) = ppd.split_once('.') else {
            return Self::Standard;
        };
        if margins == [0; 4] {
            Self::Borderless
        } else if suffix.eq_ignore_ascii_case("Transverse") {
            Self::Transverse
        } else {
            Self::Other
        }
    }

    /// True for suffixed sizes.
    pub fn is_variant(self) -> bool {
        self != Self::Standard
    }
}

/// A PPD page size with its PWG keyword, in 1/2540 inch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeEntry {
    pub pwg: String,
    pub ppd: String,
    pub width: i32,
    pub length: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
    pub variant: SizeVariant,
}

impl SizeEntry {
    /// Entry with margins in left, bottom, right, top order.
    pub fn new(pwg: impl Into<String>, ppd: impl Into<String>, width: i32, length: i32, margins: [i32; 4]) -> Self {
        let ppd = ppd.into();
        let [left, bottom, right, top] = margins;
        Self {
            pwg: pwg.into(),
            variant: SizeVariant::classify(&ppd, margins),
            ppd,
            width,
            length,
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn margins(&self) -> [i32; 4] {
        [self.left, self.bottom, self.right, self.top]
    }

    pub fn is_borderless(&self) -> bool {
        self.margins() == [0; 4]
    }

    /// Printable length between the top and bottom margins.
    pub fn imageable_length(&self) -> i32 {
        self.length.saturating_sub(self.top).saturating_sub(self.bottom)
    }

    // Positive for portrait, negative for landscape, zero for square.
    fn orientation(&self) -> i64 {
        (i64::from(self.length) - i64::from(self.width)).signum()
    }

    // `self` itself, or a `self.ppd` + `.suffix` sibling.
    fn is_sibling(&self, other: &SizeEntry) -> bool {
        other.ppd == self.ppd
            || (other.ppd.len() > self.ppd.len() + 1
                && other.ppd.starts_with(&self.ppd)
                && other.ppd.as_bytes()[self.ppd.len()] == b'.')
    }
}

/// Range of custom sizes the printer accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomSizeRange {
    pub min_width: i32,
    pub min_length: i32,
    pub max_width: i32,
    pub max_length: i32,
    /// Hardware margins: left, bottom, right, top
    pub margins: [i32; 4],
}

impl CustomSizeRange {
    pub fn contains(&self, width: i32, length: i32) -> bool {
        (self.min_width..=self.max_width).contains(&width) && (self.min_length..=self.max_length).contains(&length)
    }

    pub fn max_keyword(&self) -> String {
        keyword::format_size_name(Some("custom"), Some("max"), self.max_width, self.max_length)
    }

    pub fn min_keyword(&self) -> String {
        keyword::format_size_name(Some("custom"), Some("min"), self.min_width, self.min_length)
    }
}

/// Requested media dimensions and margins from job attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSize {
    pub width: i32,
    pub length: i32,
    /// Left, bottom, right, top
    pub margins: [i32; 4],
}

// Margins assumed when a job names its media without margins.
const DEFAULT_MARGINS: [i32; 4] = [635, 1270, 635, 1270];

/// Media size requested by a job.
///
/// Reads `media-col` (`media-size` or `media-size-name`, plus margins),
/// else the `media`, `PageSize` or `PageRegion` name. The flag tells
/// whether all four margins were given; otherwise default margins are
/// filled in.
pub fn init_size(job: &IppAttributes) -> Option<(JobSize, bool)> {
    if let Some(col) = job.get_collection("media-col") {
        let (width, length) = match col.get_collection("media-size") {
            Some(size) => (size.get_integer("x-dimension")?, size.get_integer("y-dimension")?),
            None => {
                let media = media_for_any_name(col.get_str("media-size-name")?)?;
                (media.width, media.length)
            }
        };

        let margin = |name: &str| col.get_integer(name);
        let given = [
            margin("media-left-margin"),
            margin("media-bottom-margin"),
            margin("media-right-margin"),
            margin("media-top-margin"),
        ];
        let (margins, margins_set) = match given {
            [Some(l), Some(b), Some(r), Some(t)] => ([l, b, r, t], true),
            _ => (DEFAULT_MARGINS, false),
        };
        if width <= 0 || length <= 0 {
            return None;
        }
        return Some((JobSize { width, length, margins }, margins_set));
    }

    let name = ["media", "PageSize", "PageRegion"]
        .into_iter()
        .find_map(|attr| job.get_str(attr))?;
    let media = media_for_any_name(name)?;
    Some((
        JobSize {
            width: media.width,
            length: media.length,
            margins: DEFAULT_MARGINS,
        },
        false,
    ))
}

fn media_for_any_name(name: &str) -> Option<PwgMedia> {
    media::media_for_pwg(name)
        .or_else(|| media::media_for_legacy(name))
        .or_else(|| media::media_for_ppd(name))
}

/// Result of a page size lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSizeMatch<'a> {
    /// PPD `PageSize` name
    pub name: Cow<'a, str>,
    /// False when only a nearby size was found
    pub exact: bool,
}

impl<'a> PageSizeMatch<'a> {
    fn exact(name: impl Into<Cow<'a, str>>) -> Self {
        Self { name: name.into(), exact: true }
    }

    fn closest(name: impl Into<Cow<'a, str>>) -> Self {
        Self { name: name.into(), exact: false }
    }
}

impl PpdCache {
    /// PPD `PageSize` for a media keyword (PWG, legacy or PPD name).
    pub fn page_size_for_keyword(&self, keyword: &str) -> Option<PageSizeMatch<'_>> {
        if let Some(entry) = self.find_size(keyword) {
            return Some(PageSizeMatch::exact(entry.ppd.as_str()));
        }
        let media = media_for_any_name(keyword)?;
        let size = JobSize {
            width: media.width,
            length: media.length,
            margins: [0; 4],
        };
        self.match_size(&size, false)
    }

    /// PPD `PageSize` for job attributes.
    ///
    /// A `PageSize`, `PageRegion` or `media` name matching a size entry is
    /// used as is; otherwise the requested dimensions and margins are
    /// matched against the entries and finally against the custom range.
    pub fn page_size_for_job(&self, job: &IppAttributes) -> Option<PageSizeMatch<'_>> {
        let name = ["PageSize", "PageRegion", "media"]
            .into_iter()
            .find_map(|attr| job.find(attr))
            .and_then(|attr| attr.first())
            .and_then(|v| v.as_str());
        if let Some(entry) = name.and_then(|n| self.find_size(n)) {
            return Some(PageSizeMatch::exact(entry.ppd.as_str()));
        }

        let (size, margins_set) = init_size(job)?;
        self.match_size(&size, margins_set)
    }

    /// Size entry for a PPD or PWG name, case-insensitively.
    pub fn find_size(&self, name: &str) -> Option<&SizeEntry> {
        self.sizes
            .iter()
            .find(|s| s.ppd.eq_ignore_ascii_case(name) || s.pwg.eq_ignore_ascii_case(name))
    }

    fn match_size(&self, job: &JobSize, margins_set: bool) -> Option<PageSizeMatch<'_>> {
        let mut closest: Option<(&SizeEntry, u64)> = None;

        for size in &self.sizes {
            if size.width.abs_diff(job.width) >= SIZE_EPSILON
                || size.length.abs_diff(job.length) >= SIZE_EPSILON
            {
                continue;
            }
            if !margins_set {
                return Some(PageSizeMatch::exact(size.ppd.as_str()));
            }

            // Check the size and its suffixed variants by margins only.
            for variant in self.sizes.iter().filter(|v| size.is_sibling(v)) {
                if size.orientation() * variant.orientation() < 0 {
                    continue;
                }
                if variant.variant.is_variant() && variant.is_borderless() && job.margins != [0; 4] {
                    continue;
                }

                let deltas: Vec<u32> = variant
                    .margins()
                    .iter()
                    .zip(job.margins)
                    .map(|(v, j)| v.abs_diff(j))
                    .collect();
                if deltas.iter().all(|d| *d < MARGIN_EPSILON) {
                    return Some(PageSizeMatch::exact(variant.ppd.as_str()));
                }

                let distance = deltas.iter().map(|d| u64::from(*d)).sum::<u64>()
                    + u64::from(variant.variant.is_variant());
                if closest.is_none_or(|(_, best)| distance < best) {
                    closest = Some((variant, distance));
                }
            }
        }

        if let Some((size, _)) = closest {
            return Some(PageSizeMatch::closest(size.ppd.as_str()));
        }

        let custom = self.custom.as_ref()?;
        if !custom.contains(job.width, job.length) {
            return None;
        }
        let name = format!(
            "Custom.{}x{}",
            media::to_points(job.width) as i32,
            media::to_points(job.length) as i32
        );
        let exact = !margins_set
            || custom
                .margins
                .iter()
                .zip(job.margins)
                .all(|(c, j)| c.abs_diff(j) < MARGIN_EPSILON);
        Some(PageSizeMatch { name: name.into(), exact })
    }

    /// Size entry for a PPD `PageSize` name.
    ///
    /// Accepts entry names, `Custom.WxH` with an optional `in`, `ft`, `cm`,
    /// `mm`, `m` or `pt` unit (points by default), and names of standard
    /// media the PPD does not list.
    pub fn size_for_name<'a>(&'a self, page_size: &str) -> Option<Cow<'a, SizeEntry>> {
        if page_size.eq_ignore_ascii_case("Custom") {
            return None;
        }
        let custom_dims = page_size
            .get(..7)
            .filter(|prefix| prefix.eq_ignore_ascii_case("Custom."))
            .map(|_| &page_size[7..]);
        if let Some(dims) = custom_dims {
            let (width, length) = parse_custom_dimensions(dims)?;
            let pwg = media::media_for_size(width, length).map(|m| m.pwg).unwrap_or_default();
            return Some(Cow::Owned(SizeEntry::new(pwg, page_size, width, length, [0; 4])));
        }

        if let Some(entry) = self.find_size(page_size) {
            return Some(Cow::Borrowed(entry));
        }

        let media = media::media_for_ppd(page_size)
            .or_else(|| media::media_for_legacy(page_size))
            .or_else(|| media::media_for_pwg(page_size))?;
        Some(Cow::Owned(SizeEntry::new(
            media.pwg,
            page_size,
            media.width,
            media.length,
            [0; 4],
        )))
    }
}

fn parse_custom_dimensions(dims: &str) -> Option<(i32, i32)> {
    let (w, rest) = dims.split_once('x')?;
    let unit_start = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    let (l, unit) = rest.split_at(unit_start);

    let w: f64 = w.parse().ok()?;
    let l: f64 = l.parse().ok()?;
    let factor = match unit.to_ascii_lowercase().as_str() {
        "in" => 2540.0,
        "ft" => 12.0 * 2540.0,
        "mm" => 100.0,
        "cm" => 1000.0,
        "m" => 100_000.0,
        _ => 2540.0 / 72.0,
    };
    Some(((w * factor) as i32, (l * factor) as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipp::{Group, IppValue};

    fn letter_cache() -> PpdCache {
        PpdCache {
            sizes: vec![
                SizeEntry::new("na_letter_8.5x11in", "Letter", 21590, 27940, [635, 1270, 635, 1270]),
                SizeEntry::new("oe_letter.fullbleed_8.5x11in", "Letter.Fullbleed", 21590, 27940, [0; 4]),
                SizeEntry::new("iso_a4_210x297mm", "A4", 21000, 29700, [635, 1270, 635, 1270]),
            ],
            custom: Some(CustomSizeRange {
                min_width: 7620,
                min_length: 12700,
                max_width: 30480,
                max_length: 45720,
                margins: [635, 1270, 635, 1270],
            }),
            ..PpdCache::default()
        }
    }

    fn job_with_size(width: i32, length: i32, margins: Option<[i32; 4]>) -> IppAttributes {
        let mut size = IppAttributes::new();
        size.add_member("x-dimension", IppValue::Integer(width))
            .add_member("y-dimension", IppValue::Integer(length));
        let mut col = IppAttributes::new();
        col.add_member("media-size", IppValue::Collection(size));
        if let Some([l, b, r, t]) = margins {
            col.add_member("media-left-margin", IppValue::Integer(l))
                .add_member("media-bottom-margin", IppValue::Integer(b))
                .add_member("media-right-margin", IppValue::Integer(r))
                .add_member("media-top-margin", IppValue::Integer(t));
        }
        let mut job = IppAttributes::new();
        job.add(Group::Job, "media-col", IppValue::Collection(col));
        job
    }

    #[test]
    fn variants_are_classified() {
        assert_eq!(SizeVariant::classify("A4", [0; 4]), SizeVariant::Standard);
        assert_eq!(SizeVariant::classify("A4.Fullbleed", [0; 4]), SizeVariant::Borderless);
        assert_eq!(SizeVariant::classify("A4.Transverse", [1, 1, 1, 1]), SizeVariant::Transverse);
        assert_eq!(SizeVariant::classify("A4.Duplex", [1, 1, 1, 1]), SizeVariant::Other);
    }

    #[test]
    fn keyword_lookup_by_name_is_exact() {
        let pc = letter_cache();
        let m = pc.page_size_for_keyword("na_letter_8.5x11in").unwrap();
        assert_eq!(m.name, "Letter");
        assert!(m.exact);
        assert_eq!(pc.page_size_for_keyword("a4").unwrap().name, "A4");
    }

    #[test]
    fn borderless_variant_only_on_request() {
        let pc = letter_cache();
        let job = job_with_size(21590, 27940, Some([0; 4]));
        let m = pc.page_size_for_job(&job).unwrap();
        assert_eq!(m.name, "Letter.Fullbleed");
        assert!(m.exact);

        let job = job_with_size(21590, 27940, Some([635, 1270, 635, 1270]));
        assert_eq!(pc.page_size_for_job(&job).unwrap().name, "Letter");
    }

    #[test]
    fn unmatched_margins_pick_closest() {
        let pc = letter_cache();
        let job = job_with_size(21590, 27940, Some([300, 300, 300, 300]));
        let m = pc.page_size_for_job(&job).unwrap();
        assert_eq!(m.name, "Letter");
        assert!(!m.exact);
    }

    #[test]
    fn size_tolerance_is_exclusive() {
        let pc = PpdCache {
            custom: None,
            ..letter_cache()
        };
        let lookup = |dw: i32, dl: i32| {
            pc.page_size_for_job(&job_with_size(21590 + dw, 27940 + dl, None))
                .map(|m| (m.name.into_owned(), m.exact))
        };

        assert_eq!(lookup(175, 0), Some(("Letter".to_string(), true)));
        assert_eq!(lookup(0, -175), Some(("Letter".to_string(), true)));
        assert_eq!(lookup(176, 0), None);
        assert_eq!(lookup(0, -176), None);
        assert_eq!(lookup(200, 200), None);
    }

    #[test]
    fn margin_tolerance_is_exclusive() {
        let pc = letter_cache();
        let near = job_with_size(21590, 27940, Some([635 + 34, 1270, 635, 1270 - 34]));
        let m = pc.page_size_for_job(&near).unwrap();
        assert_eq!(m.name, "Letter");
        assert!(m.exact);

        let off = job_with_size(21590, 27940, Some([635 + 35, 1270, 635, 1270]));
        let m = pc.page_size_for_job(&off).unwrap();
        assert_eq!(m.name, "Letter");
        assert!(!m.exact);
    }

    #[test]
    fn extreme_job_values_do_not_match() {
        let pc = letter_cache();
        assert!(pc.page_size_for_job(&job_with_size(i32::MIN, 27940, None)).is_none());
        assert!(pc.page_size_for_job(&job_with_size(21590, -27940, None)).is_none());
        assert!(pc.page_size_for_job(&job_with_size(0, 0, None)).is_none());
        assert!(pc.page_size_for_job(&job_with_size(i32::MAX, i32::MAX, None)).is_none());

        let margins = [i32::MIN, i32::MAX, i32::MIN, i32::MAX];
        let m = pc.page_size_for_job(&job_with_size(21590, 27940, Some(margins))).unwrap();
        assert_eq!(m.name, "Letter");
        assert!(!m.exact);
    }

    #[test]
    fn custom_range() {
        let pc = letter_cache();
        let job = job_with_size(10160, 15240, None);
        let m = pc.page_size_for_job(&job).unwrap();
        assert_eq!(m.name, "Custom.288x432");
        assert!(m.exact);

        let job = job_with_size(10160, 15240, Some([0; 4]));
        assert!(!pc.page_size_for_job(&job).unwrap().exact);

        assert!(pc.page_size_for_job(&job_with_size(5000, 5000, None)).is_none());
    }

    #[test]
    fn sizes_by_name() {
        let pc = letter_cache();
        assert!(matches!(pc.size_for_name("letter"), Some(Cow::Borrowed(_))));

        let custom = pc.size_for_name("Custom.4x6in").unwrap();
        assert_eq!((custom.width, custom.length), (10160, 15240));
        assert_eq!(custom.pwg, "na_index-4x6_4x6in");

        let points = pc.size_for_name("Custom.288x432").unwrap();
        assert_eq!((points.width, points.length), (10160, 15240));

        let b5 = pc.size_for_name("B5").unwrap();
        assert_eq!(b5.pwg, "jis_b5_182x257mm");

        assert!(pc.size_for_name("Custom").is_none());
        assert!(pc.size_for_name("Nonsense").is_none());
    }
}
