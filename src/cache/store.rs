//! Cache file reader and writer.
//!
//! The file is line oriented: a `#CUPS-PPD-CACHE-<version>` header followed
//! by `Name value` declarations. `NumBins`, `NumSizes`, `NumSources` and
//! `NumTypes` announce how many `Bin`, `Size`, `Source` and `Type` lines
//! follow. An `IPP <length>` line is followed by that many bytes of encoded
//! IPP attributes. Unknown declarations are skipped.

use std::fmt;
use std::path::Path;

use metrics::counter;
use tracing::{debug, info};

use super::{CACHE_VERSION, ColorMode, ContentOptimize, CustomSizeRange, FinishingEntry, KeywordMap, PpdCache, Quality, SizeEntry};
use crate::error::{self, PpdCacheError, Result};
use crate::ipp::{IppAttributes, codec};
use crate::keyword;
use crate::options::OptionList;
use crate::telemetry;

const MAGIC: &str = "#CUPS-PPD-CACHE-";

// Largest accepted Num* declaration.
const MAX_ENTRIES: i64 = 65536;

impl PpdCache {
    /// Load a cache file, skipping any IPP attributes it carries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_file(path.as_ref(), false).map(|(pc, _)| pc)
    }

    /// Load a cache file together with its IPP attributes.
    pub fn load_with_attributes(path: impl AsRef<Path>) -> Result<(Self, Option<IppAttributes>)> {
        load_file(path.as_ref(), true)
    }

    /// Parse cache file contents.
    ///
    /// The IPP attributes are decoded when `with_attributes` is set and
    /// skipped otherwise.
    pub fn from_bytes(data: &[u8], with_attributes: bool) -> Result<(Self, Option<IppAttributes>)> {
        error::track(parse(data, with_attributes))
    }

    /// Write the cache file, replacing any previous one atomically.
    pub fn save(&self, path: impl AsRef<Path>, attrs: Option<&IppAttributes>) -> Result<()> {
        let path = path.as_ref();
        let result = self.to_bytes(attrs).and_then(|data| write_atomic(path, &data));
        counter!(telemetry::SAVES_TOTAL, "status" => telemetry::status(&result)).increment(1);
        if result.is_ok() {
            info!(path = %path.display(), sizes = self.sizes.len(), "saved PPD cache");
        }
        error::track(result)
    }

    /// Cache file contents.
    pub fn to_bytes(&self, attrs: Option<&IppAttributes>) -> Result<Vec<u8>> {
        let mut out = String::with_capacity(4096);
        self.write_text(&mut out)
            .map_err(|e| PpdCacheError::InvalidInput(e.to_string()))?;

        let mut data = out.into_bytes();
        if let Some(attrs) = attrs {
            let encoded = codec::encode(attrs)?;
            data.extend_from_slice(format!("IPP {}\n", encoded.len()).as_bytes());
            data.extend_from_slice(&encoded);
        }
        Ok(data)
    }

    fn write_text(&self, w: &mut impl fmt::Write) -> fmt::Result {
        writeln!(w, "{MAGIC}{CACHE_VERSION}")?;

        if !self.bins.is_empty() {
            writeln!(w, "NumBins {}", self.bins.len())?;
            for map in &self.bins {
                writeln!(w, "Bin {} {}", map.pwg, map.ppd)?;
            }
        }

        writeln!(w, "NumSizes {}", self.sizes.len())?;
        for s in &self.sizes {
            writeln!(
                w,
                "Size {} {} {} {} {} {} {} {}",
                s.pwg, s.ppd, s.width, s.length, s.left, s.bottom, s.right, s.top
            )?;
        }
        if let Some(c) = self.custom.as_ref().filter(|c| c.max_width > 0) {
            let [left, bottom, right, top] = c.margins;
            writeln!(
                w,
                "CustomSize {} {} {} {} {left} {bottom} {right} {top}",
                c.max_width, c.max_length, c.min_width, c.min_length
            )?;
        }

        if let Some(option) = &self.source_option {
            writeln!(w, "SourceOption {option}")?;
        }
        if !self.sources.is_empty() {
            writeln!(w, "NumSources {}", self.sources.len())?;
            for map in &self.sources {
                writeln!(w, "Source {} {}", map.pwg, map.ppd)?;
            }
        }

        if !self.types.is_empty() {
            writeln!(w, "NumTypes {}", self.types.len())?;
            for map in &self.types {
                writeln!(w, "Type {} {}", map.pwg, map.ppd)?;
            }
        }

        for (color, quality, cell) in self.presets.iter().filter(|(_, _, cell)| !cell.is_empty()) {
            put_conf(w, "Preset", &format!("{} {} {cell}", color as i32, quality as i32))?;
        }
        for (optimize, cell) in self.optimize_presets.iter().filter(|(_, cell)| !cell.is_empty()) {
            put_conf(w, "OptimizePreset", &format!("{} {cell}", optimize as i32))?;
        }

        for (name, value) in [
            ("SidesOption", &self.sides_option),
            ("Sides1Sided", &self.sides_1sided),
            ("Sides2SidedLong", &self.sides_2sided_long),
            ("Sides2SidedShort", &self.sides_2sided_short),
        ] {
            if let Some(value) = value {
                writeln!(w, "{name} {value}")?;
            }
        }

        if let Some(product) = &self.product {
            put_conf(w, "Product", product)?;
        }
        for filter in &self.filters {
            put_conf(w, "Filter", filter)?;
        }
        for filter in &self.prefilters {
            put_conf(w, "PreFilter", filter)?;
        }
        writeln!(w, "SingleFile {}", self.single_file)?;

        for f in &self.finishings {
            if f.options.is_empty() {
                writeln!(w, "Finishings {}", f.value)?;
            } else {
                put_conf(w, "Finishings", &format!("{} {}", f.value, f.options))?;
            }
        }
        for template in &self.templates {
            put_conf(w, "FinishingTemplate", template)?;
        }

        writeln!(w, "MaxCopies {}", self.max_copies)?;

        if let Some(uri) = &self.charge_info_uri {
            put_conf(w, "ChargeInfoURI", uri)?;
        }
        writeln!(w, "JobAccountId {}", self.account_id)?;
        writeln!(w, "JobAccountingUserId {}", self.accounting_user_id)?;
        if let Some(password) = &self.password {
            put_conf(w, "JobPassword", password)?;
        }
        for name in &self.mandatory {
            put_conf(w, "Mandatory", name)?;
        }
        for file in &self.support_files {
            put_conf(w, "SupportFile", file)?;
        }

        for (key, text) in &self.strings {
            put_conf(w, "UIString", &format!("{key} {text}"))?;
        }

        Ok(())
    }
}

// `#` starts a comment when read back, so it is escaped.
fn put_conf(w: &mut impl fmt::Write, name: &str, value: &str) -> fmt::Result {
    w.write_str(name)?;
    w.write_char(' ')?;
    for c in value.chars() {
        if c == '#' {
            w.write_char('\\')?;
        }
        w.write_char(c)?;
    }
    w.write_char('\n')
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PpdCacheError::io(parent, e))?;
    }

    // Write to a sibling file first, then rename over the target.
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".N");
    let tmp = std::path::PathBuf::from(tmp);

    std::fs::write(&tmp, data).map_err(|e| PpdCacheError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        PpdCacheError::io(path, e)
    })
}

fn load_file(path: &Path, with_attributes: bool) -> Result<(PpdCache, Option<IppAttributes>)> {
    let result = std::fs::read(path)
        .map_err(|e| PpdCacheError::io(path, e))
        .and_then(|data| parse(&data, with_attributes));
    counter!(telemetry::LOADS_TOTAL, "status" => telemetry::status(&result)).increment(1);
    if let Ok((pc, _)) = &result {
        info!(path = %path.display(), sizes = pc.sizes.len(), "loaded PPD cache");
    }
    error::track(result)
}

// ============================================================================
// Reader
// ============================================================================

/// Byte cursor handing out text lines and raw blocks.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, line: 0 }
    }

    fn next_line(&mut self) -> Option<Result<&'a str>> {
        if self.pos >= self.data.len() {
            return None;
        }
        let data = self.data;
        let rest = &data[self.pos..];
        let end = rest.iter().position(|b| *b == b'\n').unwrap_or(rest.len());
        self.pos += (end + 1).min(rest.len());
        self.line += 1;

        let raw = rest[..end].strip_suffix(b"\r").unwrap_or(&rest[..end]);
        Some(std::str::from_utf8(raw).map_err(|_| PpdCacheError::bad_format(self.line, "invalid UTF-8")))
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let data = self.data;
        let block = data.get(self.pos..self.pos.checked_add(len)?)?;
        self.pos += len;
        Some(block)
    }
}

/// A `Name value` declaration with comments stripped, or `None` for blank
/// and comment lines.
///
/// Trailing whitespace of the value is kept so text values survive a
/// round trip; it is dropped only in front of a comment.
fn split_conf(line: &str) -> Option<(String, String)> {
    let mut text = String::with_capacity(line.len());
    let mut commented = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                text.push('#');
                chars.next();
            }
            '#' => {
                commented = true;
                break;
            }
            _ => text.push(c),
        }
    }

    let text = if commented { text.trim() } else { text.trim_start() };
    if text.trim_end().is_empty() {
        return None;
    }
    let (name, value) = text
        .split_once(|c: char| c.is_ascii_whitespace())
        .map_or((text, ""), |(n, v)| (n, v.trim_start()));
    Some((name.to_string(), value.to_string()))
}

/// Count declared by a `Num*` line and the entries seen so far.
#[derive(Default)]
struct Section {
    declared: Option<usize>,
}

impl Section {
    fn declare(&mut self, line: usize, value: &str, allow_zero: bool) -> Result<()> {
        if self.declared.is_some_and(|n| n > 0) {
            return Err(PpdCacheError::bad_format(line, "duplicate count declaration"));
        }
        let n = keyword::leading_int(value).map_or(0, |(n, _)| n);
        let min = if allow_zero { 0 } else { 1 };
        if n < min || n > MAX_ENTRIES {
            return Err(PpdCacheError::bad_format(line, format!("bad count {n}")));
        }
        self.declared = Some(n as usize);
        Ok(())
    }

    fn check_room(&self, line: usize, seen: usize) -> Result<()> {
        if seen >= self.declared.unwrap_or(0) {
            return Err(PpdCacheError::bad_format(line, "more entries than declared"));
        }
        Ok(())
    }

    fn check_complete(&self, what: &str, seen: usize) -> Result<()> {
        match self.declared {
            Some(n) if seen < n => Err(PpdCacheError::bad_format(
                0,
                format!("{what}: {seen} entries, {n} declared"),
            )),
            _ => Ok(()),
        }
    }
}

fn keyword_pair(line: usize, value: &str) -> Result<KeywordMap> {
    let mut words = value.split_whitespace();
    match (words.next(), words.next()) {
        (Some(pwg), Some(ppd)) => Ok(KeywordMap::new(pwg, ppd)),
        _ => Err(PpdCacheError::bad_format(line, "expected two keywords")),
    }
}

fn integers<const N: usize>(line: usize, words: &[&str]) -> Result<[i32; N]> {
    let mut out = [0; N];
    if words.len() < N {
        return Err(PpdCacheError::bad_format(line, format!("expected {N} numbers")));
    }
    for (slot, word) in out.iter_mut().zip(words) {
        *slot = word
            .parse()
            .map_err(|_| PpdCacheError::bad_format(line, format!("bad number {word:?}")))?;
    }
    Ok(out)
}

fn is_true(value: &str) -> bool {
    value.trim_end().eq_ignore_ascii_case("true")
}

fn parse(data: &[u8], with_attributes: bool) -> Result<(PpdCache, Option<IppAttributes>)> {
    let mut cursor = Cursor::new(data);

    let header = match cursor.next_line() {
        Some(line) => line?,
        None => return Err(PpdCacheError::bad_format(1, "empty file")),
    };
    let Some(version) = header.strip_prefix(MAGIC) else {
        return Err(PpdCacheError::bad_format(1, "missing cache file header"));
    };
    if keyword::leading_int(version).map(|(n, _)| n) != Some(i64::from(CACHE_VERSION)) {
        return Err(PpdCacheError::OutOfDate {
            found: version.trim().to_string(),
            expected: CACHE_VERSION,
        });
    }

    let mut pc = PpdCache::default();
    let mut attrs: Option<IppAttributes> = None;
    let (mut bins, mut sizes, mut sources, mut types) =
        (Section::default(), Section::default(), Section::default(), Section::default());

    while let Some(text) = cursor.next_line() {
        let text = text?;
        let line = cursor.line;
        let Some((name, value)) = split_conf(text) else {
            continue;
        };
        if value.is_empty() {
            return Err(PpdCacheError::bad_format(line, format!("{name} without a value")));
        }
        let is = |keyword: &str| name.eq_ignore_ascii_case(keyword);

        if is("Filter") {
            pc.filters.push(value);
        } else if is("PreFilter") {
            pc.prefilters.push(value);
        } else if is("Product") && pc.product.is_none() {
            pc.product = Some(value);
        } else if is("SingleFile") {
            pc.single_file = is_true(&value);
        } else if is("IPP") {
            let length = keyword::leading_int(&value).map_or(0, |(n, _)| n);
            if length <= 0 || (with_attributes && attrs.is_some()) {
                return Err(PpdCacheError::bad_format(line, "bad IPP block"));
            }
            let block = cursor
                .take(length as usize)
                .ok_or_else(|| PpdCacheError::bad_format(line, "truncated IPP block"))?;
            if with_attributes {
                let (decoded, used) = codec::decode(block)?;
                if used != block.len() {
                    return Err(PpdCacheError::bad_format(line, "IPP block length mismatch"));
                }
                attrs = Some(decoded);
            }
        } else if is("NumBins") {
            bins.declare(line, &value, false)?;
        } else if is("Bin") {
            let map = keyword_pair(line, &value)?;
            bins.check_room(line, pc.bins.len())?;
            pc.bins.push(map);
        } else if is("NumSizes") {
            sizes.declare(line, &value, true)?;
        } else if is("Size") {
            sizes.check_room(line, pc.sizes.len())?;
            let words: Vec<&str> = value.split_whitespace().collect();
            if words.len() < 8 {
                return Err(PpdCacheError::bad_format(line, "incomplete size"));
            }
            let [width, length, left, bottom, right, top] = integers::<6>(line, &words[2..])?;
            pc.sizes
                .push(SizeEntry::new(words[0], words[1], width, length, [left, bottom, right, top]));
        } else if is("CustomSize") {
            if pc.custom.as_ref().is_some_and(|c| c.max_width > 0) {
                return Err(PpdCacheError::bad_format(line, "duplicate custom size"));
            }
            let words: Vec<&str> = value.split_whitespace().collect();
            let [max_width, max_length, min_width, min_length, left, bottom, right, top] =
                integers::<8>(line, &words)?;
            pc.custom = Some(CustomSizeRange {
                min_width,
                min_length,
                max_width,
                max_length,
                margins: [left, bottom, right, top],
            });
        } else if is("SourceOption") {
            pc.source_option = Some(value);
        } else if is("NumSources") {
            sources.declare(line, &value, false)?;
        } else if is("Source") {
            let map = keyword_pair(line, &value)?;
            sources.check_room(line, pc.sources.len())?;
            pc.sources.push(map);
        } else if is("NumTypes") {
            types.declare(line, &value, false)?;
        } else if is("Type") {
            let map = keyword_pair(line, &value)?;
            types.check_room(line, pc.types.len())?;
            pc.types.push(map);
        } else if is("Preset") {
            let cell = keyword::leading_int(&value).and_then(|(color, rest)| {
                let (quality, rest) = keyword::leading_int(rest)?;
                let color = ColorMode::from_index(usize::try_from(color).ok()?)?;
                let quality = Quality::from_index(usize::try_from(quality).ok()?)?;
                Some((color, quality, rest))
            });
            match cell {
                Some((color, quality, rest)) if !rest.trim().is_empty() => {
                    *pc.presets.get_mut(color, quality) = OptionList::parse(rest);
                }
                _ => return Err(PpdCacheError::bad_format(line, "bad preset")),
            }
        } else if is("OptimizePreset") {
            let cell = keyword::leading_int(&value).and_then(|(optimize, rest)| {
                Some((ContentOptimize::from_index(usize::try_from(optimize).ok()?)?, rest))
            });
            match cell {
                Some((optimize, rest)) if !rest.trim().is_empty() => {
                    *pc.optimize_presets.get_mut(optimize) = OptionList::parse(rest);
                }
                _ => return Err(PpdCacheError::bad_format(line, "bad optimize preset")),
            }
        } else if is("SidesOption") {
            pc.sides_option = Some(value);
        } else if is("Sides1Sided") {
            pc.sides_1sided = Some(value);
        } else if is("Sides2SidedLong") {
            pc.sides_2sided_long = Some(value);
        } else if is("Sides2SidedShort") {
            pc.sides_2sided_short = Some(value);
        } else if is("Finishings") {
            let (finishing, rest) = keyword::leading_i32(&value).unwrap_or((0, value.as_str()));
            pc.finishings.push(FinishingEntry::new(finishing, OptionList::parse(rest)));
        } else if is("FinishingTemplate") {
            pc.templates.push(value);
        } else if is("MaxCopies") {
            pc.max_copies = keyword::atoi(&value);
        } else if is("ChargeInfoURI") {
            pc.charge_info_uri = Some(value);
        } else if is("JobAccountId") {
            pc.account_id = is_true(&value);
        } else if is("JobAccountingUserId") {
            pc.accounting_user_id = is_true(&value);
        } else if is("JobPassword") {
            pc.password = Some(value);
        } else if is("Mandatory") {
            pc.mandatory.extend(value.split_whitespace().map(str::to_string));
        } else if is("SupportFile") {
            pc.support_files.push(value);
        } else if is("UIString") {
            let (key, text) = value.split_once(' ').unwrap_or((&value, ""));
            pc.strings.insert(key.to_string(), text.to_string());
        } else {
            debug!(line, name = %name, "unknown cache file declaration");
        }
    }

    bins.check_complete("bins", pc.bins.len())?;
    sizes.check_complete("sizes", pc.sizes.len())?;
    sources.check_complete("sources", pc.sources.len())?;
    types.check_complete("types", pc.types.len())?;

    // Highest value first, as built.
    pc.finishings.sort_by(|a, b| b.value.cmp(&a.value));

    Ok((pc, attrs))
}
