//! Color/quality and content-optimize presets.
//!
//! A preset is the set of PPD option choices that realizes one combination
//! of `print-color-mode` and `print-quality` ([`PresetGrid`]) or one
//! `print-content-optimize` value ([`OptimizeGrid`]). PPDs may declare them
//! through `APPrinterPreset` attributes; otherwise every option is scored
//! by name and the best choice per cell is picked.
//!
//! Scores come from ordered rule tables. Each table is a list of tiers; the
//! first tier with a matching predicate gives the score. All names are
//! compared in lowercase.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::builder::add_string;
use crate::options::OptionList;
use crate::ppd::raster::{self, Resolution};
use crate::ppd::{self, ParseMode, PpdDocument, PpdOption};

/// `print-color-mode` axis of the preset grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    Monochrome = 0,
    Color = 1,
}

impl ColorMode {
    pub const ALL: [ColorMode; 2] = [ColorMode::Monochrome, ColorMode::Color];

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Monochrome => "monochrome",
            Self::Color => "color",
        }
    }
}

/// `print-quality` axis of the preset grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quality {
    Draft = 0,
    Normal = 1,
    High = 2,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Draft, Quality::Normal, Quality::High];

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// IPP `print-quality` enum value.
    pub fn ipp_value(self) -> i32 {
        self as i32 + 3
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

/// `print-content-optimize` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentOptimize {
    Auto = 0,
    Photo = 1,
    Graphics = 2,
    Text = 3,
    TextAndGraphics = 4,
}

impl ContentOptimize {
    pub const ALL: [ContentOptimize; 5] = [
        ContentOptimize::Auto,
        ContentOptimize::Photo,
        ContentOptimize::Graphics,
        ContentOptimize::Text,
        ContentOptimize::TextAndGraphics,
    ];

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Photo => "photo",
            Self::Graphics => "graphics",
            Self::Text => "text",
            Self::TextAndGraphics => "text-and-graphics",
        }
    }
}

/// Option sets per color mode and quality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PresetGrid([[OptionList; 3]; 2]);

impl PresetGrid {
    pub fn get(&self, color: ColorMode, quality: Quality) -> &OptionList {
        &self.0[color as usize][quality as usize]
    }

    pub(crate) fn get_mut(&mut self, color: ColorMode, quality: Quality) -> &mut OptionList {
        &mut self.0[color as usize][quality as usize]
    }

    /// Cells in color-major order.
    pub fn iter(&self) -> impl Iterator<Item = (ColorMode, Quality, &OptionList)> {
        ColorMode::ALL.into_iter().flat_map(move |color| {
            Quality::ALL
                .into_iter()
                .map(move |quality| (color, quality, self.get(color, quality)))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, _, cell)| cell.is_empty())
    }
}

/// Option sets per content-optimize value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeGrid([OptionList; 5]);

impl OptimizeGrid {
    pub fn get(&self, optimize: ContentOptimize) -> &OptionList {
        &self.0[optimize as usize]
    }

    pub(crate) fn get_mut(&mut self, optimize: ContentOptimize) -> &mut OptionList {
        &mut self.0[optimize as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContentOptimize, &OptionList)> {
        ContentOptimize::ALL.into_iter().map(move |o| (o, self.get(o)))
    }
}

// ============================================================================
// APPrinterPreset
// ============================================================================

const PRESET_QUALITY: &str = "com.apple.print.preset.quality";
const PRESET_OUTPUT_MODE: &str = "com.apple.print.preset.output-mode";
const PRESET_GRAPHICS_TYPE: &str = "com.apple.print.preset.graphicsType";
const PRESET_COATING: &str = "com.apple.print.preset.media-front-coating";

/// Fill the grid from `APPrinterPreset` attributes.
///
/// The first preset for a cell wins. Presets without a quality property
/// are ignored, as are non-high-quality presets for photos or coated media.
/// Returns true when any preset was used.
pub(crate) fn apply_printer_presets(
    doc: &PpdDocument,
    grid: &mut PresetGrid,
    strings: &mut BTreeMap<String, String>,
) -> bool {
    let mut added = false;

    for attr in doc.find_attrs("APPrinterPreset") {
        add_string(strings, format!("preset-name.{}", attr.spec), &attr.text);

        let props = ppd::parse_options(&attr.value, ParseMode::All);
        let Some(quality) = props.get(PRESET_QUALITY) else {
            continue;
        };
        let quality = match quality {
            "low" => Quality::Draft,
            "high" => Quality::High,
            _ => Quality::Normal,
        };

        if quality != Quality::High {
            if props.get(PRESET_GRAPHICS_TYPE) == Some("Photo") {
                debug!(preset = %attr.spec, "skipping photo preset below high quality");
                continue;
            }
            if props
                .get(PRESET_COATING)
                .is_some_and(|c| c != "none" && c != "autodetect")
            {
                debug!(preset = %attr.spec, "skipping coated media preset below high quality");
                continue;
            }
        }

        let color = match (props.get(PRESET_OUTPUT_MODE), props.get("ColorModel")) {
            (Some("monochrome"), _) => ColorMode::Monochrome,
            (Some(_), _) => ColorMode::Color,
            (None, Some(model)) if model.eq_ignore_ascii_case("Gray") => ColorMode::Monochrome,
            _ => ColorMode::Color,
        };

        let cell = grid.get_mut(color, quality);
        if cell.is_empty() {
            *cell = ppd::parse_options(&attr.value, ParseMode::Options);
        }
        added = true;
    }

    added
}

// Options that force grayscale output, most common first.
const GRAYSCALE_CHOICES: &[(&str, &str)] = &[
    ("ColorModel", "Gray"),
    ("HPColorMode", "grayscale"),
    ("BRMonoColor", "Mono"),
    ("CNIJSGrayScale", "1"),
    ("HPColorAsGray", "True"),
];

/// Derive monochrome presets from the color ones.
///
/// Each color preset is copied with a grayscale choice added; without a
/// color preset only the normal quality cell gets the grayscale choice.
pub(crate) fn synthesize_grayscale(doc: &PpdDocument, grid: &mut PresetGrid) {
    let Some((option, choice)) = GRAYSCALE_CHOICES
        .iter()
        .find(|(option, choice)| doc.find_choice(option, choice).is_some())
    else {
        return;
    };

    for quality in Quality::ALL {
        let color = grid.get(ColorMode::Color, quality).clone();
        if color.is_empty() && quality != Quality::Normal {
            continue;
        }
        let mono = grid.get_mut(ColorMode::Monochrome, quality);
        if !color.is_empty() {
            *mono = color;
        }
        mono.add(*option, *choice);
    }
}

// ============================================================================
// Heuristic scoring
// ============================================================================

/// Weight of the color score against the quality score.
const COLOR_FACTOR: i32 = 1000;
/// Weight of quality scores derived from option and choice names.
const NAME_FACTOR: i32 = 10;
/// Weight of quality scores derived from resolution changes.
const RES_FACTOR: i32 = 1;

// Options handled elsewhere or meaningless in presets.
const EXCLUDED_OPTIONS: &[&str] = &[
    "PageSize",
    "PageRegion",
    "InputSlot",
    "MediaSource",
    "MediaType",
    "OutputBin",
    "Duplex",
    "JCLDuplex",
    "EFDuplex",
    "EFDuplexing",
    "ARDuplex",
    "KD03Duplex",
    "Collate",
];

type Pred = fn(&str) -> bool;

struct Tier {
    score: i32,
    any: &'static [Pred],
}

/// Score of the first tier with a matching predicate, else 0.
fn cascade(tiers: &[Tier], name: &str) -> i32 {
    tiers
        .iter()
        .find(|t| t.any.iter().any(|p| p(name)))
        .map_or(0, |t| t.score)
}

/// True when `b` occurs in `s` at or after the first `a`.
fn followed_by(s: &str, a: &str, b: &str) -> bool {
    s.find(a).is_some_and(|i| s[i..].contains(b))
}

fn is_truthy(c: &str) -> bool {
    matches!(c, "true" | "on" | "yes" | "1" | "medium")
}

fn is_falsy(c: &str) -> bool {
    matches!(c, "false" | "off" | "no" | "0")
}

// ---- color ---------------------------------------------------------------

fn is_color_option(o: &str) -> bool {
    matches!(o, "colormodel" | "outputmode" | "printoutmode" | "arcmode" | "colorrestype")
        || o.contains("colormode")
        || o.contains("monocolor")
}

static MONO_TIERS: &[Tier] = &[
    Tier {
        score: 2,
        any: &[
            |c| c.contains("mono"),
            |c| c == "black",
            |c| followed_by(c, "black", "white"),
            |c| c.starts_with("bw") && !c[2..].starts_with(|ch: char| ch.is_ascii_alphabetic()),
        ],
    },
    Tier {
        score: 3,
        any: &[|c| c.contains("gray"), |c| c.contains("grey"), |c| c == "blackonly"],
    },
];

static COLOR_TIERS: &[Tier] = &[
    Tier {
        score: 2,
        any: &[
            |c| c.find("cmy").is_some_and(|i| !c[i..].contains("gray")),
            |c| c == "coloronly",
            |c| followed_by(c, "adobe", "rgb"),
        ],
    },
    Tier {
        score: 4,
        any: &[|c| c.contains("srgb")],
    },
    Tier {
        score: 3,
        any: &[|c| c.contains("rgb"), |c| c.contains("color")],
    },
];

/// Mono and color affinity of a choice; both zero for non-color options.
fn color_scores(o: &str, c: &str) -> (i32, i32) {
    match o {
        "cnijsgrayscale" => {
            if c == "1" {
                (2, 0)
            } else {
                (0, 1)
            }
        }
        "hpcolorasgray" | "hppjlcolorasgray" => {
            if c == "true" || c == "yes" {
                (2, 0)
            } else {
                (0, 1)
            }
        }
        _ if is_color_option(o) => (cascade(MONO_TIERS, c), cascade(COLOR_TIERS, c)),
        _ => (0, 0),
    }
}

// ---- quality -------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct QualityScores {
    draft: i32,
    normal: i32,
    high: i32,
}

impl QualityScores {
    const fn high(n: i32) -> Self {
        Self { draft: 0, normal: 0, high: n }
    }

    const fn draft(n: i32) -> Self {
        Self { draft: n, normal: 0, high: 0 }
    }

    const fn normal(n: i32) -> Self {
        Self { draft: 0, normal: n, high: 0 }
    }
}

// Vendor options with fixed choice names.
struct VendorOption {
    option: Pred,
    choices: &'static [(&'static str, QualityScores)],
}

static VENDOR_QUALITY: &[VendorOption] = &[
    // Sharp
    VendorOption {
        option: |o| o == "arcppriority",
        choices: &[("quality", QualityScores::high(10)), ("speed", QualityScores::draft(10))],
    },
    // Brother
    VendorOption {
        option: |o| o == "brjpeg",
        choices: &[
            ("qualityprior", QualityScores::high(10)),
            ("speedprior", QualityScores::draft(10)),
        ],
    },
    // Fuji Xerox
    VendorOption {
        option: |o| o == "fxoutputmode",
        choices: &[
            ("quality2", QualityScores::high(10)),
            ("speed", QualityScores::draft(10)),
            ("standard", QualityScores::normal(10)),
        ],
    },
    // Ricoh
    VendorOption {
        option: |o| o == "riprintmode",
        choices: &[
            ("1rhit", QualityScores::high(7)),
            ("6rhit", QualityScores::high(10)),
            ("3rhit", QualityScores::draft(10)),
            ("4rhit", QualityScores::draft(10)),
            ("5rhit", QualityScores::draft(10)),
            ("0rhit", QualityScores::normal(10)),
        ],
    },
    // Foomatic
    VendorOption {
        option: |o| o == "economode" || o == "econofast",
        choices: &[
            ("off", QualityScores::high(1)),
            ("false", QualityScores::high(1)),
            ("on", QualityScores::draft(10)),
            ("true", QualityScores::draft(10)),
            ("low", QualityScores::draft(10)),
            ("high", QualityScores::draft(11)),
        ],
    },
    // Gutenprint
    VendorOption {
        option: |o| o.contains("colorprecision"),
        choices: &[("best", QualityScores::high(10))],
    },
];

// Boolean options that raise quality when enabled.
static ENHANCING_OPTIONS: &[Pred] = &[
    |o| followed_by(o, "slow", "dry"),
    |o| followed_by(o, "color", "enhance"),
    |o| o.find("resolution").is_some_and(|i| !o[i..].contains("enhance")),
    |o| o == "ret",
    |o| o == "smoothing",
    |o| followed_by(o, "uni", "direction"),
];

// Boolean options that lower quality when enabled.
static REDUCING_OPTIONS: &[Pred] = &[
    |o| o.contains("draft"),
    |o| o.contains("economy"),
    |o| followed_by(o, "eco", "mode"),
    |o| followed_by(o, "toner", "sav"),
    |o| followed_by(o, "bi", "direction"),
    |o| o == "ecoblack",
    |o| o == "bidi",
    |o| o == "bi-di",
];

// Options whose enumerated choice names carry quality hints.
static QUALITY_OPTIONS: &[Pred] = &[
    |o| {
        matches!(
            o,
            "colormodel" | "outputmode" | "printoutmode" | "printquality" | "printmode" | "colorrestype"
        )
    },
    |o| o.contains("colormode"),
    |o| o.contains("halftone"),
    |o| o.contains("monocolor"),
    |o| o.contains("quality"),
    |o| o.contains("resolution"),
    |o| o.contains("precision"),
    |o| o.contains("printingdirection"),
];

static HIGH_TIERS: &[Tier] = &[
    Tier {
        score: 1,
        any: &[|c| c == "quality", |c| c == "5"],
    },
    Tier {
        score: 2,
        any: &[
            |c| c.contains("photo"),
            |c| c.contains("enhance"),
            |c| c.contains("slow"),
            |c| c.starts_with("prores"),
            |c| c.starts_with("imageret"),
            |c| followed_by(c, "low", "speed"),
        ],
    },
    Tier {
        score: 3,
        any: &[
            |c| c.contains("fine"),
            |c| c.contains("deep"),
            |c| c.find("high").is_some_and(|i| !c[i..].contains("speed")),
            |c| c.contains("hq"),
        ],
    },
    Tier {
        score: 4,
        any: &[|c| c.contains("best"), |c| c == "cmygray", |c| c.contains("unidir")],
    },
    Tier {
        score: 5,
        any: &[|c| c == "monolowdetail"],
    },
];

static DRAFT_TIERS: &[Tier] = &[
    Tier {
        score: 1,
        any: &[|c| c == "monolowdetail", |c| c == "3"],
    },
    Tier {
        score: 2,
        any: &[
            |c| followed_by(c, "fast", "draft"),
            |c| followed_by(c, "high", "speed"),
            |c| c.contains("speed") && !c.contains("low"),
        ],
    },
    Tier {
        score: 3,
        any: &[
            |c| c.contains("quick"),
            // FastRes600, FastRes1200 are resolutions, not draft modes
            |c| c.contains("fast") && !(c.starts_with("fastres") && c[7..].starts_with(|ch: char| ch.is_ascii_digit())),
        ],
    },
    Tier {
        score: 4,
        any: &[
            |c| c.contains("draft"),
            |c| c.contains("low") && !c.contains("slow"),
            |c| c.contains("coarse"),
        ],
    },
    Tier {
        score: 5,
        any: &[|c| c.contains("bidir")],
    },
];

static NORMAL_TIERS: &[Tier] = &[
    Tier {
        score: 1,
        any: &[|c| c.contains("automatic"), |c| c == "none", |c| c == "4", |c| c == "fastres1200"],
    },
    Tier {
        score: 2,
        any: &[
            |c| c.contains("normal"),
            |c| c.contains("standard"),
            |c| c.contains("default"),
            |c| c == "fastres600",
        ],
    },
];

/// Quality affinity of a choice from option and choice names.
fn quality_scores(o: &str, c: &str) -> QualityScores {
    if let Some(vendor) = VENDOR_QUALITY.iter().find(|v| (v.option)(o)) {
        return vendor
            .choices
            .iter()
            .find(|(choice, _)| *choice == c)
            .map(|(_, scores)| *scores)
            .unwrap_or_default();
    }

    if ENHANCING_OPTIONS.iter().any(|p| p(o)) {
        return if is_truthy(c) {
            QualityScores::high(3)
        } else if is_falsy(c) {
            QualityScores::draft(3)
        } else {
            QualityScores::default()
        };
    }

    if REDUCING_OPTIONS.iter().any(|p| p(o)) {
        return if is_truthy(c) {
            QualityScores::draft(3)
        } else if is_falsy(c) {
            QualityScores::high(3)
        } else {
            QualityScores::default()
        };
    }

    if QUALITY_OPTIONS.iter().any(|p| p(o)) {
        let mut scores = QualityScores {
            draft: cascade(DRAFT_TIERS, c),
            normal: cascade(NORMAL_TIERS, c),
            high: cascade(HIGH_TIERS, c),
        };
        // Prefer the less extreme choices.
        if c.contains("ultra") || c.contains("very") || c.contains("super") {
            if scores.high > 1 {
                scores.high -= 1;
            }
            if scores.draft > 1 {
                scores.draft -= 1;
            }
        }
        return scores;
    }

    QualityScores::default()
}

/// Quality affinity of a resolution relative to the base resolution.
fn resolution_scores(res: Resolution, base: Resolution) -> QualityScores {
    let pixels = u64::from(res.0) * u64::from(res.1);
    let base_pixels = u64::from(base.0) * u64::from(base.1);
    if pixels == 0 || base_pixels == 0 {
        return QualityScores::default();
    }

    match pixels / base_pixels {
        1 => QualityScores::normal(RES_FACTOR * 4),
        2 => QualityScores::high(RES_FACTOR * 3),
        3..=8 => QualityScores::high(RES_FACTOR * 4),
        9..=32 => QualityScores::high(RES_FACTOR * 2),
        0 => match base_pixels / pixels {
            1 => QualityScores::normal(RES_FACTOR),
            2 => QualityScores::draft(RES_FACTOR * 3),
            3..=7 => QualityScores::draft(RES_FACTOR * 4),
            8..=31 => QualityScores::draft(RES_FACTOR * 2),
            _ => QualityScores::draft(RES_FACTOR),
        },
        _ => QualityScores::high(RES_FACTOR),
    }
}

// ---- content optimization ------------------------------------------------

use ContentOptimize::{Graphics, Photo, Text, TextAndGraphics};

struct OptimizeRule {
    when: Pred,
    set: &'static [(ContentOptimize, i32)],
}

static VENDOR_OPTIMIZE: &[(&str, &[(&str, &[(ContentOptimize, i32)])])] = &[
    // Sharp
    (
        "arcotype",
        &[
            ("cotdrawing", &[(Text, 3), (Graphics, 2), (TextAndGraphics, 2)]),
            ("cotgraphics", &[(Graphics, 3), (TextAndGraphics, 3)]),
            ("cotphoto", &[(Photo, 3)]),
        ],
    ),
    // HP
    (
        "hprgbemulation",
        &[
            ("defaultsrgb", &[(Text, 3)]),
            ("vividsrgb", &[(Graphics, 3), (TextAndGraphics, 3)]),
            ("photosrgb", &[(Photo, 3)]),
        ],
    ),
];

// Applied in order; later rules overwrite earlier scores.
static OPTIMIZE_RULES: &[OptimizeRule] = &[
    OptimizeRule {
        when: |c| c.contains("photo"),
        set: &[(Photo, 6)],
    },
    OptimizeRule {
        when: |c| c.contains("graphic"),
        set: &[(Graphics, 6)],
    },
    OptimizeRule {
        when: |c| c.contains("text") && c.contains("graphic"),
        set: &[(TextAndGraphics, 7)],
    },
    OptimizeRule {
        when: |c| c.contains("text") && !c.contains("graphic"),
        set: &[(Text, 6)],
    },
    OptimizeRule {
        when: |c| c.contains("presentation"),
        set: &[(Text, 4), (Graphics, 4), (TextAndGraphics, 4)],
    },
    OptimizeRule {
        when: |c| c.contains("lineart"),
        set: &[(Graphics, 2), (TextAndGraphics, 2)],
    },
    OptimizeRule {
        when: |c| c.contains("drawing"),
        set: &[(Graphics, 4), (TextAndGraphics, 4)],
    },
    OptimizeRule {
        when: |c| c.contains("natural"),
        set: &[(Photo, 2)],
    },
    OptimizeRule {
        when: |c| c.contains("vivid"),
        set: &[(Text, 2), (Graphics, 2), (TextAndGraphics, 2)],
    },
];

/// Content-optimize affinity of a choice, indexed by [`ContentOptimize`].
fn optimize_scores(o: &str, c: &str) -> [i32; 5] {
    let mut scores = [0; 5];

    if let Some((_, choices)) = VENDOR_OPTIMIZE.iter().find(|(option, _)| *option == o) {
        if let Some((_, set)) = choices.iter().find(|(choice, _)| *choice == c) {
            for (category, score) in *set {
                scores[*category as usize] = *score;
            }
        }
        return scores;
    }

    for rule in OPTIMIZE_RULES.iter().filter(|r| (r.when)(c)) {
        for (category, score) in rule.set {
            scores[*category as usize] = *score;
        }
    }
    scores
}

// ---- selection -----------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ChoiceScores {
    mono: i32,
    color: i32,
    quality: QualityScores,
    optimize: [i32; 5],
}

impl ChoiceScores {
    fn quality(&self, quality: Quality) -> i32 {
        match quality {
            Quality::Draft => self.quality.draft,
            Quality::Normal => self.quality.normal,
            Quality::High => self.quality.high,
        }
    }

    fn color_mode(&self, color: ColorMode) -> (i32, i32) {
        match color {
            ColorMode::Monochrome => (self.mono, self.color),
            ColorMode::Color => (self.color, self.mono),
        }
    }

    // Whether the choice may fill a quality cell in the given pass.
    fn eligible(&self, quality: Quality, pass: u8) -> bool {
        let q = &self.quality;
        match quality {
            Quality::Draft => q.high == 0 || pass > 0,
            Quality::Normal => (q.draft == 0 || pass > 1) && (q.high == 0 || pass > 0),
            Quality::High => q.draft == 0 || pass > 0,
        }
    }
}

fn score_choice(o: &str, choice: &str, code: &str, is_color: bool, base: Option<Resolution>) -> ChoiceScores {
    let c = choice.to_ascii_lowercase();
    let (mono, color) = if is_color { color_scores(o, &c) } else { (0, 0) };

    let mut quality = quality_scores(o, &c);
    quality.draft *= NAME_FACTOR;
    quality.normal *= NAME_FACTOR;
    quality.high *= NAME_FACTOR;

    if let Some(base) = base {
        let res = if code.is_empty() {
            None
        } else {
            raster::code_resolution(code)
        };
        if let Some(res) = res.or_else(|| raster::name_resolution(choice)) {
            let extra = resolution_scores(res, base);
            quality.draft += extra.draft;
            quality.normal += extra.normal;
            quality.high += extra.high;
        }
    }

    let mut optimize = optimize_scores(o, &c);
    // Optimization presets only apply at high quality.
    if quality.high != 0 && quality.draft == 0 {
        for score in optimize.iter_mut().filter(|s| **s != 0) {
            *score += 10;
        }
    }

    ChoiceScores {
        mono,
        color,
        quality,
        optimize,
    }
}

/// Assign presets by scoring every option of the document.
pub(crate) fn assign_presets(doc: &PpdDocument, grid: &mut PresetGrid, optimize: &mut OptimizeGrid) {
    let base = raster::base_resolution(doc);
    debug!(?base, color = doc.color_device, "scoring options for presets");

    let foomatic = doc.nickname.as_deref().is_some_and(|n| n.contains("Foomatic"));

    for group in &doc.groups {
        if group
            .name
            .get(..11)
            .is_some_and(|p| p.eq_ignore_ascii_case("Installable"))
        {
            continue;
        }

        for option in &group.options {
            if EXCLUDED_OPTIONS
                .iter()
                .any(|x| x.eq_ignore_ascii_case(&option.keyword))
            {
                continue;
            }

            if foomatic && link_composite_member(doc, option, grid, optimize) {
                continue;
            }

            assign_option(doc, option, base, grid, optimize);
        }
    }
}

// A Foomatic composite option's member keeps control at the composite: a
// member whose first choice is `From<Composite>` replaces the composite in
// every preset that sets it.
fn link_composite_member(doc: &PpdDocument, option: &PpdOption, grid: &mut PresetGrid, optimize: &mut OptimizeGrid) -> bool {
    let Some(first) = option.choices.first() else {
        return false;
    };
    let Some(composite) = first.choice.strip_prefix("From") else {
        return false;
    };
    if doc.find_option(composite).is_none() {
        return false;
    }

    for color in ColorMode::ALL {
        for quality in Quality::ALL {
            let cell = grid.get_mut(color, quality);
            if cell.contains(composite) {
                cell.add(option.keyword.clone(), first.choice.clone());
            }
        }
    }
    for category in ContentOptimize::ALL {
        let cell = optimize.get_mut(category);
        if cell.contains(composite) {
            cell.add(option.keyword.clone(), first.choice.clone());
        }
    }
    true
}

fn assign_option(doc: &PpdDocument, option: &PpdOption, base: Option<Resolution>, grid: &mut PresetGrid, optimize: &mut OptimizeGrid) {
    let o = option.keyword.to_ascii_lowercase();
    let scores: Vec<ChoiceScores> = option
        .choices
        .iter()
        .map(|c| score_choice(&o, &c.choice, &c.code, doc.color_device, base))
        .collect();
    let default = option.choices.iter().position(|c| c.choice == option.default_choice);

    let sets_color_mode = scores.iter().any(|s| s.mono != 0 || s.color != 0);
    let sets_quality = scores.iter().any(|s| s.quality.draft != 0 || s.quality.high != 0);

    // Best choice per cell, relaxing the quality constraints each pass and
    // locking cells once they have a winner.
    let mut best: [[(i32, Option<usize>); 3]; 2] = [[(0, None); 3]; 2];
    for pass in 0..3u8 {
        for (k, s) in scores.iter().enumerate() {
            for color in ColorMode::ALL {
                let (own, other) = s.color_mode(color);
                if other != 0 {
                    continue;
                }
                for quality in Quality::ALL {
                    let cell = &mut best[color as usize][quality as usize];
                    if cell.0 < 0 || !s.eligible(quality, pass) {
                        continue;
                    }
                    let score = COLOR_FACTOR * own + s.quality(quality);
                    if score > cell.0 {
                        *cell = (score, Some(k));
                    }
                }
            }
        }
        for cell in best.iter_mut().flatten() {
            if cell.1.is_some() {
                cell.0 = -1;
            }
        }
    }

    if sets_color_mode || sets_quality {
        for color in ColorMode::ALL {
            for quality in Quality::ALL {
                let chosen = best[color as usize][quality as usize].1.or(default);
                if let Some(k) = chosen {
                    grid.get_mut(color, quality)
                        .add(option.keyword.clone(), option.choices[k].choice.clone());
                }
            }
        }
    }

    for category in ContentOptimize::ALL.into_iter().skip(1) {
        let mut winner: Option<(i32, usize)> = None;
        for (k, s) in scores.iter().enumerate() {
            let score = s.optimize[category as usize];
            if score > winner.map_or(0, |(best, _)| best) {
                winner = Some((score, k));
            }
        }
        if let Some((_, k)) = winner {
            optimize
                .get_mut(category)
                .add(option.keyword.clone(), option.choices[k].choice.clone());
        }
    }
}
