//! Keyword normalization between PPD names and PWG/IPP keywords.
//!
//! PPD names are mixed-case identifiers (`MultiPurposeTray`, `A4.Fullbleed`);
//! IPP keywords are lowercase and dash separated (`multi-purpose-tray`).

use crate::media::{self, PwgMedia};

/// Largest PPD keyword length kept when ppdizing.
pub const MAX_NAME: usize = 41;

/// Convert a PPD keyword to a lowercase IPP keyword.
///
/// `dash_chars` lists the characters that become dashes; `None` turns every
/// non-alphanumeric character into a dash. Dashes are inserted at
/// lower-to-upper case transitions and before a digit run, collapsed, and
/// trimmed from the end. Names that are already valid lowercase keywords are
/// returned verbatim.
pub fn unppdize_name(ppd: &str, dash_chars: Option<&str>) -> String {
    let bytes = ppd.as_bytes();
    let is_dash_char = |b: u8| match dash_chars {
        Some(set) => set.as_bytes().contains(&b),
        None => !b.is_ascii_alphanumeric(),
    };

    if bytes.first().is_some_and(u8::is_ascii_lowercase) {
        let verbatim = (1..bytes.len()).all(|i| {
            let b = bytes[i];
            !(b.is_ascii_uppercase()
                || is_dash_char(b)
                || (b == b'-' && bytes[i - 1] == b'-')
                || (b == b'-' && i + 1 == bytes.len()))
        });
        if verbatim {
            return ppd.to_string();
        }
    }

    let mut out = String::with_capacity(ppd.len() + 4);
    let mut nodash = true;

    for (i, &b) in bytes.iter().enumerate() {
        let next = bytes.get(i + 1).copied().unwrap_or(0);

        if b.is_ascii_alphanumeric() {
            out.push(b.to_ascii_lowercase() as char);
            nodash = false;
        } else if b == b'-' || is_dash_char(b) {
            let negative_number = i == 0 && b == b'-' && next.is_ascii_digit();
            if !nodash || negative_number {
                out.push('-');
                nodash = true;
            }
        } else {
            out.push(b as char);
            nodash = false;
        }

        if !nodash {
            if !b.is_ascii_uppercase() && b.is_ascii_alphanumeric() && next.is_ascii_uppercase() {
                out.push('-');
                nodash = true;
            } else if !b.is_ascii_digit() && next.is_ascii_digit() {
                out.push('-');
                nodash = true;
            }
        }
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Convert an IPP keyword to a PPD keyword (`by-pass-tray` -> `ByPassTray`).
///
/// Returns an empty string when the keyword does not start with an
/// alphanumeric character.
pub fn ppdize_name(ipp: &str) -> String {
    let bytes = ipp.as_bytes();
    let Some(&first) = bytes.first().filter(|b| b.is_ascii_alphanumeric()) else {
        return String::new();
    };

    let mut out = String::with_capacity(ipp.len());
    out.push(first.to_ascii_uppercase() as char);

    let mut i = 1;
    while i < bytes.len() && out.len() < MAX_NAME - 1 {
        let b = bytes[i];
        if b == b'-' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphanumeric) {
            out.push(bytes[i + 1].to_ascii_uppercase() as char);
            i += 2;
        } else {
            if b == b'_' || b == b'.' || b == b'-' || b.is_ascii_alphanumeric() {
                out.push(b as char);
            }
            i += 1;
        }
    }
    out
}

/// PPD `InputSlot` choice name for a PWG `media-source` keyword.
pub fn input_slot_for_source(media_source: &str) -> String {
    const SOURCES: &[(&str, &str)] = &[
        ("main", "Cassette"),
        ("alternate", "Multipurpose"),
        ("large-capacity", "LargeCapacity"),
        ("bottom", "Lower"),
        ("middle", "Middle"),
        ("top", "Upper"),
        ("rear", "Rear"),
        ("side", "Side"),
        ("envelope", "Envelope"),
        ("main-roll", "Roll"),
        ("alternate-roll", "Roll2"),
    ];

    SOURCES
        .iter()
        .find(|(pwg, _)| pwg.eq_ignore_ascii_case(media_source))
        .map(|(_, ppd)| (*ppd).to_string())
        .unwrap_or_else(|| ppdize_name(media_source))
}

/// PPD `MediaType` choice name for a PWG `media-type` keyword.
pub fn media_type_for_type(media_type: &str) -> String {
    const TYPES: &[(&str, &str)] = &[
        ("auto", "Auto"),
        ("cardstock", "Cardstock"),
        ("envelope", "Envelope"),
        ("photographic-glossy", "Glossy"),
        ("photographic-high-gloss", "HighGloss"),
        ("photographic-matte", "Matte"),
        ("stationery", "Plain"),
        ("stationery-coated", "Coated"),
        ("stationery-inkjet", "Inkjet"),
        ("stationery-letterhead", "Letterhead"),
        ("stationery-preprinted", "Preprinted"),
        ("transparency", "Transparency"),
    ];

    TYPES
        .iter()
        .find(|(pwg, _)| pwg.eq_ignore_ascii_case(media_type))
        .map(|(_, ppd)| (*ppd).to_string())
        .unwrap_or_else(|| ppdize_name(media_type))
}

/// PPD `PageSize` name for a media entry.
///
/// Uses the Adobe name when there is one, else the `name` part of a
/// `class_name_dims` self-describing PWG name, else `wNNNhNNN` in points.
pub fn page_size_for_media(media: &PwgMedia) -> String {
    if let Some(ppd) = media.ppd.as_deref() {
        return ppd.to_string();
    }

    let pwg = media.pwg.as_str();
    if !pwg.is_empty() && !pwg.starts_with("custom_") {
        let mut parts = pwg.splitn(3, '_');
        if let (Some(_), Some(name), Some(_)) = (parts.next(), parts.next(), parts.next()) {
            if name.len() < MAX_NAME {
                return name.to_string();
            }
        }
    }

    format!(
        "w{}h{}",
        media::to_points(media.width) as i32,
        media::to_points(media.length) as i32
    )
}

/// Self-describing PWG size name, `prefix_name_WxHunits`.
///
/// Without a prefix the class is `oe` for inch sizes and `om` for metric
/// ones; without a name the dimensions stand in for it. Inches are used
/// when both dimensions are multiples of 1/4 inch (635 units).
pub fn format_size_name(prefix: Option<&str>, name: Option<&str>, width: i32, length: i32) -> String {
    let inches = width % 635 == 0 && length % 635 == 0;
    let (units, default_prefix) = if inches { ("in", "oe") } else { ("mm", "om") };
    let format = if inches { format_inches } else { format_millimeters };

    let dims = format!("{}x{}", format(width), format(length));
    let name = match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => dims.clone(),
    };

    format!("{}_{}_{}{}", prefix.unwrap_or(default_prefix), name, dims, units)
}

fn format_inches(val: i32) -> String {
    let thousandths = (i64::from(val) * 1000 + 1270) / 2540;
    let (integer, fraction) = (thousandths / 1000, thousandths % 1000);

    if fraction == 0 {
        format!("{integer}")
    } else if fraction % 100 == 0 {
        format!("{integer}.{}", fraction / 100)
    } else if fraction % 10 == 0 {
        format!("{integer}.{:02}", fraction / 10)
    } else {
        format!("{integer}.{fraction:03}")
    }
}

fn format_millimeters(val: i32) -> String {
    let (integer, fraction) = (val / 100, (val % 100).abs());

    if fraction == 0 {
        format!("{integer}")
    } else if fraction % 10 == 0 {
        format!("{integer}.{}", fraction / 10)
    } else {
        format!("{integer}.{fraction:02}")
    }
}

/// Leading integer of `s` and the text after it, like `strtol`.
///
/// Leading whitespace is skipped and one sign is accepted. Values beyond
/// the `i64` range saturate. `None` when no digits follow.
pub(crate) fn leading_int(s: &str) -> Option<(i64, &str)> {
    let s = s.trim_start();
    let sign = usize::from(s.starts_with(['-', '+']));
    let end = s[sign..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |i| i + sign);
    if end == sign {
        return None;
    }
    let n = s[..end]
        .parse()
        .unwrap_or(if s.starts_with('-') { i64::MIN } else { i64::MAX });
    Some((n, &s[end..]))
}

/// [`leading_int`] saturated to the `i32` range.
pub(crate) fn leading_i32(s: &str) -> Option<(i32, &str)> {
    leading_int(s).map(|(n, rest)| (saturate_i32(n), rest))
}

/// Leading integer saturated to `i32`, 0 when there is none.
pub(crate) fn atoi(s: &str) -> i32 {
    leading_i32(s).map_or(0, |(n, _)| n)
}

fn saturate_i32(n: i64) -> i32 {
    i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_integers() {
        assert_eq!(leading_int("20"), Some((20, "")));
        assert_eq!(leading_int(" -7abc"), Some((-7, "abc")));
        assert_eq!(leading_int("+3 rest"), Some((3, " rest")));
        assert_eq!(leading_int("x"), None);
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int("99999999999999999999999"), Some((i64::MAX, "")));
        assert_eq!(atoi("4294967296"), i32::MAX);
        assert_eq!(atoi("-4294967296"), i32::MIN);
        assert_eq!(atoi("nope"), 0);
        assert_eq!(leading_i32("1-5"), Some((1, "-5")));
    }

    #[test]
    fn unppdize_splits_case_and_digits() {
        assert_eq!(unppdize_name("MultiPurposeTray", Some("_")), "multi-purpose-tray");
        assert_eq!(unppdize_name("Tray2", Some("_")), "tray-2");
        assert_eq!(unppdize_name("Upper_Tray", Some("_")), "upper-tray");
    }

    #[test]
    fn unppdize_keeps_lowercase_keywords() {
        assert_eq!(unppdize_name("face-down", Some("_")), "face-down");
        assert_eq!(unppdize_name("stacker-1", None), "stacker-1");
    }

    #[test]
    fn unppdize_collapses_and_trims_dashes() {
        assert_eq!(unppdize_name("A4.Fullbleed", Some("_.")), "a-4-fullbleed");
        assert_eq!(unppdize_name("Foo__Bar_", Some("_")), "foo-bar");
        assert_eq!(unppdize_name("-10Offset", None), "-10-offset");
    }

    #[test]
    fn ppdize_capitalizes_segments() {
        assert_eq!(ppdize_name("by-pass-tray"), "ByPassTray");
        assert_eq!(ppdize_name("tray-1"), "Tray1");
        assert_eq!(ppdize_name("-bad"), "");
    }

    #[test]
    fn reverse_tables() {
        assert_eq!(input_slot_for_source("main"), "Cassette");
        assert_eq!(input_slot_for_source("MAIN-ROLL"), "Roll");
        assert_eq!(input_slot_for_source("tray-3"), "Tray3");
        assert_eq!(media_type_for_type("stationery"), "Plain");
        assert_eq!(media_type_for_type("photographic-satin"), "PhotographicSatin");
    }

    #[test]
    fn size_names() {
        assert_eq!(format_size_name(None, Some("foo"), 21590, 27940), "oe_foo_8.5x11in");
        assert_eq!(format_size_name(Some("custom"), Some("min"), 7620, 12700), "custom_min_3x5in");
        assert_eq!(format_size_name(None, Some("bar"), 21000, 29700), "om_bar_210x297mm");
        assert_eq!(format_size_name(None, None, 10050, 20000), "om_100.5x200_100.5x200mm");
    }

    #[test]
    fn page_size_names() {
        let a4 = media::media_for_pwg("iso_a4_210x297mm").unwrap();
        assert_eq!(page_size_for_media(&a4), "A4");

        let vendor = media::media_for_pwg("oe_photo-card_4x8in").unwrap();
        assert_eq!(page_size_for_media(&vendor), "photo-card");

        let custom = PwgMedia::custom(7200, 7200);
        assert_eq!(page_size_for_media(&custom), "w204h204");
    }
}
