//! Job option translation.
//!
//! Turns the options of a print job, together with the choices marked in
//! its PPD document, into the IPP job attributes sent to the printer.
//! Translation never fails: options that cannot be resolved are left out.

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use tracing::{debug, warn};

use crate::cache::{PpdCache, Quality, SizeEntry};
use crate::ipp::{Group, IppAttribute, IppAttributes, IppValue, ValueTag, option_value_tag};
use crate::keyword::{atoi, leading_i32};
use crate::options::OptionList;
use crate::ppd::PpdDocument;

/// Default cap on the `finishings` values inferred from marked choices.
pub const DEFAULT_MAX_FINISHINGS: usize = 10;

// Mandatory attributes that get dedicated handling below.
const HANDLED_MANDATORY: &[&str] = &[
    "copies",
    "destination-uris",
    "finishing-template",
    "finishings",
    "finishings-col",
    "job-account-id",
    "job-accounting-user-id",
    "job-password",
    "job-password-encryption",
    "media",
    "multiple-document-handling",
    "output-bin",
    "print-color-mode",
    "print-quality",
    "sides",
];

/// A job to translate and what the receiving printer supports.
///
/// The `*_supported` lists hold the printer's supported values; `None`
/// means the printer does not report the attribute at all.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub options: OptionList,
    /// Requesting user, used for `job-accounting-user-id`
    pub user: Option<String>,
    /// `document-format` of the job
    pub format: Option<String>,
    pub copies: i32,
    /// Validate-Job requests carry no password.
    pub validate_only: bool,
    pub media_col_supported: Option<Vec<String>>,
    pub doc_handling_supported: Option<Vec<String>>,
    pub color_mode_supported: Option<Vec<String>>,
    pub max_finishings: usize,
}

impl JobRequest {
    pub fn new(options: OptionList, copies: i32) -> Self {
        Self {
            options,
            user: None,
            format: None,
            copies,
            validate_only: false,
            media_col_supported: None,
            doc_handling_supported: None,
            color_mode_supported: None,
            max_finishings: DEFAULT_MAX_FINISHINGS,
        }
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }

    pub fn max_finishings(mut self, max: usize) -> Self {
        self.max_finishings = max;
        self
    }

    /// Take the supported-value lists from a printer's attributes:
    /// `media-col-supported`, `multiple-document-handling-supported` and
    /// `print-color-mode-supported`.
    pub fn printer_attributes(mut self, printer: &IppAttributes) -> Self {
        let strings = |attr: &IppAttribute| -> Vec<String> { attr.strings().map(str::to_string).collect() };
        self.media_col_supported = printer.find("media-col-supported").map(strings);
        self.doc_handling_supported = printer
            .find("multiple-document-handling-supported")
            .map(strings);
        self.color_mode_supported = printer.find("print-color-mode-supported").map(strings);
        self
    }
}

/// Translated job attributes and the copy count to send with them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedJob {
    pub attributes: IppAttributes,
    pub copies: i32,
}

/// Translate a job's options into IPP job attributes.
///
/// `doc` must have its choices marked for the job.
pub fn convert_options(pc: &PpdCache, doc: &PpdDocument, job: &JobRequest) -> ConvertedJob {
    let options = &job.options;
    let mut attrs = IppAttributes::new();
    let mut copies = job.copies;

    if pc.password().is_some() && !job.validate_only {
        if let Some(password) = options.get("job-password") {
            let encryption = options.get("job-password-encryption").unwrap_or("none");
            add_password(&mut attrs, password, encryption);
        }
    }

    if pc.account_id() {
        if let Some(id) = options.get("job-account-id").or_else(|| options.get("job-billing")) {
            attrs.add(Group::Job, "job-account-id", IppValue::Name(id.to_string()));
        }
    }

    if pc.accounting_user_id() {
        if let Some(user) = options.get("job-accounting-user-id").or(job.user.as_deref()) {
            attrs.add(Group::Job, "job-accounting-user-id", IppValue::Name(user.to_string()));
        }
    }

    for name in pc.mandatory() {
        if HANDLED_MANDATORY.contains(&name.as_str()) || name.starts_with("media-col") {
            continue;
        }
        if let Some(value) = options.get(name) {
            attrs.add(Group::Job, name.as_str(), typed_value(name, value));
        }
    }

    add_media_col(pc, job, &mut attrs);

    let output_bin = options.get("output-bin").or_else(|| {
        doc.find_marked_choice("OutputBin")
            .and_then(|choice| pc.bin_for_legacy(&choice.choice))
    });
    if let Some(bin) = output_bin {
        attrs.add(Group::Job, "output-bin", IppValue::Keyword(bin.to_string()));
    }

    let color_attr = if job.color_mode_supported.is_some() {
        "print-color-mode"
    } else {
        "output-mode"
    };
    let color = match options.get("ColorModel") {
        Some(model) => Some(color_for_model(model)),
        None => match doc.find_marked_choice("ColorModel") {
            Some(choice) => Some(color_for_model(&choice.choice)),
            None => options.get("print-color-mode"),
        },
    };
    if let Some(color) = color {
        let color = refine_monochrome(color, job.color_mode_supported.as_deref());
        attrs.add(Group::Job, color_attr, IppValue::Keyword(color.to_string()));
    }

    if let Some(quality) = options.get("print-quality") {
        attrs.add(Group::Job, "print-quality", IppValue::Enum(atoi(quality)));
    } else if let Some(quality) = doc
        .find_marked_choice("cupsPrintQuality")
        .and_then(|choice| quality_for_choice(&choice.choice))
    {
        attrs.add(Group::Job, "print-quality", IppValue::Enum(quality.ipp_value()));
    }

    if let Some(sides) = options.get("sides") {
        attrs.add(Group::Job, "sides", IppValue::Keyword(sides.to_string()));
    } else if let Some(sides) = marked_sides(pc, doc) {
        attrs.add(Group::Job, "sides", IppValue::Keyword(sides.to_string()));
    }

    // Copies and collation
    let mut collate = match options.get("multiple-document-handling") {
        Some(handling) => !handling.contains("uncollated"),
        None => options.get("collate").is_none_or(|c| c.eq_ignore_ascii_case("true")),
    };

    if let Some(format) = job.format.as_deref() {
        let format = format.to_ascii_lowercase();
        if is_single_page_image(&format) {
            collate = false;
        } else if format.starts_with("image/") || format == "application/vnd.cups-raster" {
            // upstream filters produce the copies
            copies = 1;
        }
    }

    if let Some(supported) = &job.doc_handling_supported {
        let handling = if collate {
            "separate-documents-collated-copies"
        } else {
            "separate-documents-uncollated-copies"
        };
        if supported.iter().any(|s| s == handling) {
            attrs.add(
                Group::Job,
                "multiple-document-handling",
                IppValue::Keyword(handling.to_string()),
            );
        } else {
            copies = 1;
        }
    }

    // Finishings
    let pages_per_set = if copies != job.copies {
        job_pages_per_set(options)
    } else {
        0
    };

    let template = options
        .get("cupsFinishingTemplate")
        .or_else(|| options.get("finishing-template"))
        .filter(|t| *t != "none");

    let finishing_added = match template {
        Some(template) => {
            let mut col = IppAttributes::new();
            col.add_member("finishing-template", IppValue::Keyword(template.to_string()));
            attrs.add(Group::Job, "finishings-col", IppValue::Collection(col));
            true
        }
        None => {
            let values = pc.finishing_values(doc, job.max_finishings);
            let added = !values.is_empty();
            if added {
                attrs.add_values(
                    Group::Job,
                    "finishings",
                    values.into_iter().map(IppValue::Enum).collect(),
                );
            }
            added
        }
    };
    if finishing_added && pages_per_set > 0 {
        attrs.add(Group::Job, "job-pages-per-set", IppValue::Integer(pages_per_set));
    }

    debug!(attributes = attrs.len(), copies, "translated job options");
    ConvertedJob {
        attributes: attrs,
        copies,
    }
}

fn add_password(attrs: &mut IppAttributes, password: &str, encryption: &str) {
    let value = if encryption == "none" {
        Some(password.as_bytes().to_vec())
    } else {
        hash_password(encryption, password.as_bytes())
    };

    match value {
        Some(value) => {
            attrs
                .add(Group::Operation, "job-password", IppValue::OctetString(value))
                .add(
                    Group::Operation,
                    "job-password-encryption",
                    IppValue::Keyword(encryption.to_string()),
                );
        }
        None => warn!(encryption, "unsupported job-password-encryption, password dropped"),
    }
}

/// Digest of `data` for a `job-password-encryption` keyword.
pub fn hash_password(algorithm: &str, data: &[u8]) -> Option<Vec<u8>> {
    let digest = match algorithm {
        "sha2-224" => Sha224::digest(data).to_vec(),
        "sha2-256" => Sha256::digest(data).to_vec(),
        "sha2-384" => Sha384::digest(data).to_vec(),
        "sha2-512" => Sha512::digest(data).to_vec(),
        _ => return None,
    };
    Some(digest)
}

// A mandatory attribute's value in the syntax the attribute takes.
fn typed_value(name: &str, value: &str) -> IppValue {
    match option_value_tag(name) {
        ValueTag::Integer => IppValue::Integer(atoi(value)),
        ValueTag::Enum => IppValue::Enum(atoi(value)),
        ValueTag::Boolean => IppValue::Boolean(value.eq_ignore_ascii_case("true")),
        ValueTag::Range => {
            let (lower, upper) = parse_range(value);
            IppValue::Range { lower, upper }
        }
        ValueTag::OctetString => IppValue::OctetString(value.as_bytes().to_vec()),
        ValueTag::Keyword => IppValue::Keyword(value.to_string()),
        ValueTag::Uri => IppValue::Uri(value.to_string()),
        ValueTag::Name => IppValue::Name(value.to_string()),
    }
}

// `lower-upper`, or a single number for both bounds.
fn parse_range(value: &str) -> (i32, i32) {
    let range = leading_i32(value).and_then(|(lower, rest)| {
        let (upper, _) = leading_i32(rest.strip_prefix('-')?)?;
        Some((lower, upper))
    });
    range.unwrap_or_else(|| {
        let n = atoi(value);
        (n, n)
    })
}

fn add_media_col(pc: &PpdCache, job: &JobRequest, attrs: &mut IppAttributes) {
    let options = &job.options;
    let size = options
        .get("PageSize")
        .or_else(|| options.get("media"))
        .and_then(|name| pc.size_for_name(name));
    let source = options
        .get("InputSlot")
        .and_then(|slot| pc.source_for_legacy(slot));
    let media_type = options
        .get("MediaType")
        .and_then(|t| pc.type_for_legacy(t));

    if size.is_none() && source.is_none() && media_type.is_none() {
        return;
    }

    let mut col = IppAttributes::new();
    if let Some(size) = &size {
        let mut dims = IppAttributes::new();
        dims.add_member("x-dimension", IppValue::Integer(size.width))
            .add_member("y-dimension", IppValue::Integer(size.length));
        col.add_member("media-size", IppValue::Collection(dims));
    }

    for member in job.media_col_supported.iter().flatten() {
        let margin = |pick: fn(&SizeEntry) -> i32| size.as_deref().map(|s| IppValue::Integer(pick(s)));
        let value = match member.as_str() {
            "media-left-margin" => margin(|s| s.left),
            "media-bottom-margin" => margin(|s| s.bottom),
            "media-right-margin" => margin(|s| s.right),
            "media-top-margin" => margin(|s| s.top),
            "media-source" => source.map(|s| IppValue::Keyword(s.to_string())),
            "media-type" => media_type.map(|t| IppValue::Keyword(t.to_string())),
            _ => None,
        };
        if let Some(value) = value {
            col.add_member(member.as_str(), value);
        }
    }

    attrs.add(Group::Job, "media-col", IppValue::Collection(col));
}

fn color_for_model(model: &str) -> &'static str {
    match model {
        "Gray" | "FastGray" | "DeviceGray" => "monochrome",
        _ => "color",
    }
}

// Printers listing these keywords want them instead of plain monochrome.
fn refine_monochrome<'a>(color: &'a str, supported: Option<&[String]>) -> &'a str {
    if color != "monochrome" {
        return color;
    }
    let supports = |keyword: &str| supported.is_some_and(|s| s.iter().any(|v| v == keyword));
    if supports("auto-monochrome") {
        "auto-monochrome"
    } else if supports("process-monochrome") && !supports("monochrome") {
        "process-monochrome"
    } else {
        color
    }
}

fn quality_for_choice(choice: &str) -> Option<Quality> {
    Quality::ALL
        .into_iter()
        .find(|q| choice.eq_ignore_ascii_case(q.keyword()))
}

fn marked_sides(pc: &PpdCache, doc: &PpdDocument) -> Option<&'static str> {
    let choice = doc.find_marked_choice(pc.sides_option()?)?;
    let [one, long, short] = pc.sides_choices();
    let matches = |c: Option<&str>| c.is_some_and(|c| c.eq_ignore_ascii_case(&choice.choice));
    if matches(one) {
        Some("one-sided")
    } else if matches(long) {
        Some("two-sided-long-edge")
    } else if matches(short) {
        Some("two-sided-short-edge")
    } else {
        None
    }
}

fn is_single_page_image(format: &str) -> bool {
    matches!(
        format,
        "image/gif" | "image/jp2" | "image/jpeg" | "image/png" | "image/tiff"
    ) || format.starts_with("image/x-")
}

// Pages in one copy of the job, for finishing each set when the printer
// makes the copies. Two-sided output pads odd page counts.
fn job_pages_per_set(options: &OptionList) -> i32 {
    let job_pages = options
        .get("job-pages")
        .or_else(|| options.get("com.apple.print.PrintSettings.PMTotalBeginPages..n."))
        .map_or(0, |pages| i64::from(atoi(pages).max(1)));
    let number_up = options.get("number-up").map_or(1, |n| i64::from(atoi(n).max(1)));

    let mut pages = (job_pages + number_up - 1) / number_up;
    if pages % 2 == 1 && options.get("sides").is_some_and(|s| s != "one-sided") {
        pages += 1;
    }
    i32::try_from(pages).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        assert_eq!(parse_range("1-5"), (1, 5));
        assert_eq!(parse_range("7"), (7, 7));
        assert_eq!(parse_range("x"), (0, 0));
    }

    #[test]
    fn mandatory_values_take_their_syntax() {
        assert_eq!(typed_value("copies", "3"), IppValue::Integer(3));
        assert_eq!(typed_value("fit-to-page", "TRUE"), IppValue::Boolean(true));
        assert_eq!(typed_value("page-ranges", "2-4"), IppValue::Range { lower: 2, upper: 4 });
        assert_eq!(typed_value("job-name", "report"), IppValue::Name("report".into()));
        assert_eq!(typed_value("print-scaling", "fit"), IppValue::Keyword("fit".into()));
    }

    #[test]
    fn monochrome_keywords() {
        let auto = vec!["auto-monochrome".to_string(), "monochrome".to_string()];
        let process = vec!["process-monochrome".to_string()];
        let both = vec!["process-monochrome".to_string(), "monochrome".to_string()];
        assert_eq!(refine_monochrome("monochrome", Some(&auto)), "auto-monochrome");
        assert_eq!(refine_monochrome("monochrome", Some(&process)), "process-monochrome");
        assert_eq!(refine_monochrome("monochrome", Some(&both)), "monochrome");
        assert_eq!(refine_monochrome("monochrome", None), "monochrome");
        assert_eq!(refine_monochrome("color", Some(&auto)), "color");
    }

    #[test]
    fn password_digests() {
        assert_eq!(hash_password("sha2-256", b"secret").map(|h| h.len()), Some(32));
        assert_eq!(hash_password("sha2-224", b"secret").map(|h| h.len()), Some(28));
        assert_eq!(hash_password("sha2-512", b"secret").map(|h| h.len()), Some(64));
        assert!(hash_password("md5", b"secret").is_none());
    }

    #[test]
    fn pages_per_set() {
        let options = OptionList::parse("job-pages=5 number-up=2");
        assert_eq!(job_pages_per_set(&options), 3);
        let options = OptionList::parse("job-pages=5 sides=two-sided-long-edge");
        assert_eq!(job_pages_per_set(&options), 6);
        assert_eq!(job_pages_per_set(&OptionList::new()), 0);
    }

    #[test]
    fn pages_per_set_saturates() {
        let options = OptionList::parse("job-pages=2147483647 number-up=2");
        assert_eq!(job_pages_per_set(&options), 1_073_741_824);
        let options = OptionList::parse("job-pages=99999999999 sides=two-sided-short-edge");
        assert_eq!(job_pages_per_set(&options), i32::MAX);
    }

    #[test]
    fn image_formats() {
        assert!(is_single_page_image("image/jpeg"));
        assert!(is_single_page_image("image/x-photocd"));
        assert!(!is_single_page_image("image/pwg-raster"));
    }
}
