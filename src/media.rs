//! PWG standard media table and unit conversions.
//!
//! All dimensions are hundredths of a millimetre (1/2540 inch), the PWG
//! convention. PPD documents measure in PostScript points.

use crate::keyword;

/// Size matching tolerance for [`media_for_size`], about 0.02 inch.
pub const EPSILON: i32 = 50;

/// Convert PostScript points to PWG units, rounding half up.
pub fn from_points(points: f64) -> i32 {
    ((points * 2540.0 + 36.0) / 72.0) as i32
}

/// Convert PWG units to PostScript points.
pub fn to_points(pwg: i32) -> f64 {
    f64::from(pwg) * 72.0 / 2540.0
}

/// A named media size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PwgMedia {
    /// PWG self-describing name (`iso_a4_210x297mm`)
    pub pwg: String,
    /// Legacy IPP name (`iso-a4`)
    pub legacy: Option<String>,
    /// Adobe PPD name (`A4`)
    pub ppd: Option<String>,
    pub width: i32,
    pub length: i32,
}

impl PwgMedia {
    /// Unnamed media of the given size, named `custom_WxHuu`.
    pub fn custom(width: i32, length: i32) -> Self {
        Self {
            pwg: keyword::format_size_name(Some("custom"), None, width, length),
            legacy: None,
            ppd: None,
            width,
            length,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.pwg.starts_with("custom_")
    }

    fn standard(entry: &StandardMedia) -> Self {
        Self {
            pwg: entry.pwg.to_string(),
            legacy: entry.legacy.map(str::to_string),
            ppd: entry.ppd.map(str::to_string),
            width: entry.width,
            length: entry.length,
        }
    }
}

struct StandardMedia {
    pwg: &'static str,
    legacy: Option<&'static str>,
    ppd: Option<&'static str>,
    width: i32,
    length: i32,
}

const fn mm(pwg: &'static str, legacy: Option<&'static str>, ppd: Option<&'static str>, w: i32, l: i32) -> StandardMedia {
    StandardMedia {
        pwg,
        legacy,
        ppd,
        width: w * 100,
        length: l * 100,
    }
}

// Inch sizes are given in thousandths of an inch to stay integral.
const fn inch(pwg: &'static str, legacy: Option<&'static str>, ppd: Option<&'static str>, w: i32, l: i32) -> StandardMedia {
    StandardMedia {
        pwg,
        legacy,
        ppd,
        width: w * 2540 / 1000,
        length: l * 2540 / 1000,
    }
}

static MEDIA: &[StandardMedia] = &[
    // North American
    inch("na_index-3x5_3x5in", None, Some("3x5"), 3000, 5000),
    inch("na_index-4x6_4x6in", Some("na-index-4x6"), Some("4x6"), 4000, 6000),
    inch("na_5x7_5x7in", Some("na-5x7"), Some("5x7"), 5000, 7000),
    inch("na_govt-letter_8x10in", Some("na-8x10"), Some("8x10"), 8000, 10000),
    inch("na_invoice_5.5x8.5in", Some("invoice"), Some("Statement"), 5500, 8500),
    inch("na_executive_7.25x10.5in", Some("executive"), Some("Executive"), 7250, 10500),
    inch("na_letter_8.5x11in", Some("na-letter"), Some("Letter"), 8500, 11000),
    inch("na_legal_8.5x14in", Some("na-legal"), Some("Legal"), 8500, 14000),
    inch("na_ledger_11x17in", Some("tabloid"), Some("Tabloid"), 11000, 17000),
    inch("na_arch-a_9x12in", Some("arch-a"), Some("ARCHA"), 9000, 12000),
    inch("na_arch-b_12x18in", Some("arch-b"), Some("ARCHB"), 12000, 18000),
    inch("na_super-b_13x19in", Some("na-super-b"), Some("SuperB"), 13000, 19000),
    inch("na_number-10_4.125x9.5in", Some("na-number-10-envelope"), Some("Env10"), 4125, 9500),
    inch("na_monarch_3.875x7.5in", Some("monarch-envelope"), Some("EnvMonarch"), 3875, 7500),
    inch("oe_photo-l_3.5x5in", None, Some("3.5x5"), 3500, 5000),
    // ISO
    mm("iso_a0_841x1189mm", Some("iso-a0"), Some("A0"), 841, 1189),
    mm("iso_a1_594x841mm", Some("iso-a1"), Some("A1"), 594, 841),
    mm("iso_a2_420x594mm", Some("iso-a2"), Some("A2"), 420, 594),
    mm("iso_a3_297x420mm", Some("iso-a3"), Some("A3"), 297, 420),
    mm("iso_a4_210x297mm", Some("iso-a4"), Some("A4"), 210, 297),
    mm("iso_a5_148x210mm", Some("iso-a5"), Some("A5"), 148, 210),
    mm("iso_a6_105x148mm", Some("iso-a6"), Some("A6"), 105, 148),
    mm("iso_a7_74x105mm", Some("iso-a7"), Some("A7"), 74, 105),
    mm("iso_b4_250x353mm", Some("iso-b4"), Some("ISOB4"), 250, 353),
    mm("iso_b5_176x250mm", Some("iso-b5"), Some("ISOB5"), 176, 250),
    mm("iso_c4_229x324mm", Some("iso-c4"), Some("EnvC4"), 229, 324),
    mm("iso_c5_162x229mm", Some("iso-c5"), Some("EnvC5"), 162, 229),
    mm("iso_c6_114x162mm", Some("iso-c6"), Some("EnvC6"), 114, 162),
    mm("iso_dl_110x220mm", Some("iso-designated"), Some("EnvDL"), 110, 220),
    mm("om_small-photo_100x150mm", None, Some("om_small-photo"), 100, 150),
    // Japan
    mm("jis_b4_257x364mm", Some("jis-b4"), Some("B4"), 257, 364),
    mm("jis_b5_182x257mm", Some("jis-b5"), Some("B5"), 182, 257),
    mm("jis_b6_128x182mm", Some("jis-b6"), Some("B6"), 128, 182),
    mm("jpn_hagaki_100x148mm", Some("jpn_hagaki"), Some("Postcard"), 100, 148),
    mm("jpn_oufuku_148x200mm", Some("jpn_oufuku"), Some("DoublePostcardRotated"), 148, 200),
];

/// Find media by PWG name.
///
/// Names outside the table are accepted when they are self-describing
/// (`class_name_WxHin` or `class_name_WxHmm`); the dimensions are parsed out.
pub fn media_for_pwg(pwg: &str) -> Option<PwgMedia> {
    if let Some(entry) = MEDIA.iter().find(|m| m.pwg == pwg) {
        return Some(PwgMedia::standard(entry));
    }

    let (width, length) = parse_self_describing(pwg)?;
    Some(PwgMedia {
        pwg: pwg.to_string(),
        legacy: None,
        ppd: None,
        width,
        length,
    })
}

/// Find media by legacy IPP name (`na-letter`).
pub fn media_for_legacy(legacy: &str) -> Option<PwgMedia> {
    MEDIA
        .iter()
        .find(|m| m.legacy.is_some_and(|l| l.eq_ignore_ascii_case(legacy)))
        .map(PwgMedia::standard)
}

/// Find media by Adobe PPD name (`Letter`).
///
/// Also accepts `wNNNhNNN` point sizes and `WxH[units]` names such as
/// `4x6`, `10x15cm` or `100x150mm`; inches are the default unit.
pub fn media_for_ppd(ppd: &str) -> Option<PwgMedia> {
    if let Some(entry) = MEDIA
        .iter()
        .find(|m| m.ppd.is_some_and(|p| p.eq_ignore_ascii_case(ppd)))
    {
        return Some(PwgMedia::standard(entry));
    }

    let (width, length) = parse_point_name(ppd).or_else(|| parse_dimension_name(ppd))?;
    let mut media = media_for_size(width, length)?;
    if media.is_custom() {
        media.pwg = keyword::format_size_name(None, Some(&keyword::unppdize_name(ppd, Some("_."))), width, length);
        media.ppd = Some(ppd.to_string());
    }
    Some(media)
}

/// Find the standard media nearest to the given size.
///
/// A table entry matches when both dimensions are within [`EPSILON`]; an
/// exact match wins outright. Sizes that match no entry yield a
/// `custom_` media of exactly that size. Non-positive sizes yield `None`.
pub fn media_for_size(width: i32, length: i32) -> Option<PwgMedia> {
    if width <= 0 || length <= 0 {
        return None;
    }

    let mut best: Option<(&StandardMedia, i32)> = None;
    for entry in MEDIA {
        let dw = (entry.width - width).abs();
        let dl = (entry.length - length).abs();
        if dw == 0 && dl == 0 {
            return Some(PwgMedia::standard(entry));
        }
        if dw <= EPSILON && dl <= EPSILON && best.is_none_or(|(_, dist)| dw + dl < dist) {
            best = Some((entry, dw + dl));
        }
    }

    Some(
        best.map(|(entry, _)| PwgMedia::standard(entry))
            .unwrap_or_else(|| PwgMedia::custom(width, length)),
    )
}

/// True when `pwg` names an entry of the standard table.
pub fn is_standard_name(pwg: &str) -> bool {
    MEDIA.iter().any(|m| m.pwg == pwg)
}

fn parse_self_describing(pwg: &str) -> Option<(i32, i32)> {
    let mut parts = pwg.splitn(3, '_');
    let (_class, _name, dims) = (parts.next()?, parts.next()?, parts.next()?);

    let (dims, factor) = if let Some(d) = dims.strip_suffix("in") {
        (d, 2540.0)
    } else if let Some(d) = dims.strip_suffix("mm") {
        (d, 100.0)
    } else {
        return None;
    };

    parse_pair(dims, factor)
}

fn parse_point_name(ppd: &str) -> Option<(i32, i32)> {
    let rest = ppd.strip_prefix('w')?;
    let (w, l) = rest.split_once('h')?;
    let w: f64 = w.parse().ok()?;
    let l: f64 = l.parse().ok()?;
    Some((from_points(w), from_points(l)))
}

fn parse_dimension_name(ppd: &str) -> Option<(i32, i32)> {
    let lower = ppd.to_ascii_lowercase();
    let (dims, factor) = if let Some(d) = lower.strip_suffix("mm") {
        (d.to_string(), 100.0)
    } else if let Some(d) = lower.strip_suffix("cm") {
        (d.to_string(), 1000.0)
    } else if let Some(d) = lower.strip_suffix("in") {
        (d.to_string(), 2540.0)
    } else {
        (lower, 2540.0)
    };

    parse_pair(&dims, factor)
}

fn parse_pair(dims: &str, factor: f64) -> Option<(i32, i32)> {
    let (w, l) = dims.split_once('x')?;
    let w: f64 = w.parse().ok()?;
    let l: f64 = l.parse().ok()?;
    if w <= 0.0 || l <= 0.0 {
        return None;
    }
    Some(((w * factor) as i32, (l * factor) as i32))
}
