//! Narrow resolution extraction from choice code and names.
//!
//! Only two code patterns are recognized: a PostScript page device
//! dictionary entry `/HWResolution [x y]` and a PJL `@PJL SET RESOLUTION=x`
//! command. Nothing is interpreted beyond that.

use super::PpdDocument;

/// Horizontal and vertical resolution in dots per inch.
pub type Resolution = (u32, u32);

// Raster header default; code that leaves this in place sets no resolution.
const UNSET: Resolution = (100, 100);

/// Resolution set by a choice's PostScript or PJL code.
pub fn code_resolution(code: &str) -> Option<Resolution> {
    postscript_resolution(code)
        .or_else(|| pjl_resolution(code))
        .filter(|res| *res != UNSET)
}

fn postscript_resolution(code: &str) -> Option<Resolution> {
    // The last setting wins, as it would when the code runs.
    let (_, rest) = code.rsplit_once("/HWResolution")?;
    let rest = rest.trim_start().strip_prefix('[')?;
    let (inner, _) = rest.split_once(']')?;
    let mut values = inner.split_whitespace().map(|v| v.parse::<f64>().ok());
    let x = values.next()??;
    let y = values.next()??;
    if x <= 0.0 || y <= 0.0 {
        return None;
    }
    Some((x as u32, y as u32))
}

fn pjl_resolution(code: &str) -> Option<Resolution> {
    let set = code.find("SET")?;
    let after = &code[set + 3..];
    if !after.starts_with(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    let start = after.find("RESOLUTION=")? + "RESOLUTION=".len();
    let rest = &after[start..];

    let (x, rest) = leading_number(rest)?;
    let y = rest
        .strip_prefix('X')
        .and_then(leading_number)
        .map_or(x, |(y, _)| y);
    Some((x, y))
}

/// Resolution spelled out in a choice name, as in `600dpi` or `300x600 DPI`.
pub fn name_resolution(choice: &str) -> Option<Resolution> {
    let dpi = choice.to_ascii_lowercase().find("dpi")?;
    let before = choice[..dpi].trim_end();
    let bytes = before.as_bytes();

    // Walk back over `[digits[xX]]digits`.
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    if start == bytes.len() {
        return None;
    }
    if start > 0 && matches!(bytes[start - 1], b'x' | b'X') {
        let mut first = start - 1;
        while first > 0 && bytes[first - 1].is_ascii_digit() {
            first -= 1;
        }
        if first < start - 1 {
            start = first;
        }
    }

    let (x, rest) = leading_number(&before[start..])?;
    let y = rest
        .strip_prefix(['x', 'X'])
        .and_then(leading_number)
        .map_or(x, |(y, _)| y);
    if x == 0 || y == 0 {
        return None;
    }
    Some((x, y))
}

/// Resolution the document prints at with its default choices.
///
/// Taken from the code of the default choices, else from the
/// `DefaultResolution` attribute (`600dpi` or `600x1200dpi`).
pub fn base_resolution(doc: &PpdDocument) -> Option<Resolution> {
    let from_code = doc
        .options()
        .filter_map(|o| o.default_choice())
        .filter_map(|c| postscript_resolution(&c.code))
        .filter(|res| *res != UNSET)
        .last();
    if from_code.is_some() {
        return from_code;
    }

    let value = doc.attr_value("DefaultResolution")?;
    let (x, rest) = leading_number(value.trim_start())?;
    let y = rest
        .strip_prefix('x')
        .and_then(leading_number)
        .map_or(x, |(y, _)| y);
    (x > 0 && y > 0).then_some((x, y))
}

fn leading_number(s: &str) -> Option<(u32, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let n = s[..end].parse().ok()?;
    Some((n, &s[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppd::PpdOption;

    #[test]
    fn postscript_code() {
        let code = "<</HWResolution[600 600]>>setpagedevice";
        assert_eq!(code_resolution(code), Some((600, 600)));
        let code = "<< /HWResolution [ 300 600 ] /cupsBitsPerColor 1 >> setpagedevice";
        assert_eq!(code_resolution(code), Some((300, 600)));
        assert_eq!(code_resolution("<</HWResolution[100 100]>>setpagedevice"), None);
        assert_eq!(code_resolution("<</Duplex true>>setpagedevice"), None);
    }

    #[test]
    fn pjl_code() {
        assert_eq!(code_resolution("@PJL SET RESOLUTION=1200\n"), Some((1200, 1200)));
        assert_eq!(code_resolution("@PJL SET RESOLUTION=600X300\n"), Some((600, 300)));
        assert_eq!(code_resolution("@PJL SETRESOLUTION=600\n"), None);
    }

    #[test]
    fn choice_names() {
        assert_eq!(name_resolution("600dpi"), Some((600, 600)));
        assert_eq!(name_resolution("300x600dpi"), Some((300, 600)));
        assert_eq!(name_resolution("Fine 1200 DPI"), Some((1200, 1200)));
        assert_eq!(name_resolution("HighDPI"), None);
        assert_eq!(name_resolution("Letter"), None);
    }

    #[test]
    fn base_resolution_sources() {
        let mut doc = PpdDocument::new();
        doc.add_attr("DefaultResolution", "", "300dpi");
        assert_eq!(base_resolution(&doc), Some((300, 300)));

        doc.add_option(
            "General",
            PpdOption::new("Resolution", ["600dpi", "1200dpi"])
                .with_code("600dpi", "<</HWResolution[600 600]>>setpagedevice")
                .with_code("1200dpi", "<</HWResolution[1200 1200]>>setpagedevice"),
        );
        assert_eq!(base_resolution(&doc), Some((600, 600)));

        assert_eq!(base_resolution(&PpdDocument::new()), None);
    }
}
