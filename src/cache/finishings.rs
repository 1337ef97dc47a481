//! IPP `finishings` values and the PPD choices that produce them.

use serde::Serialize;
use tracing::debug;

use super::PpdCache;
use crate::ipp::{IppAttributes, IppValue};
use crate::keyword;
use crate::options::OptionList;
use crate::ppd::{self, ParseMode, PpdDocument};

pub const NONE: i32 = 3;
pub const STAPLE_TOP_LEFT: i32 = 20;
pub const STAPLE_BOTTOM_LEFT: i32 = 21;
pub const STAPLE_TOP_RIGHT: i32 = 22;
pub const STAPLE_DUAL_LEFT: i32 = 28;
pub const BIND_LEFT: i32 = 50;
pub const BIND_TOP: i32 = 51;
pub const BIND_RIGHT: i32 = 52;
pub const BIND_BOTTOM: i32 = 53;
pub const PUNCH_DUAL_LEFT: i32 = 74;
pub const PUNCH_DUAL_TOP: i32 = 75;
pub const PUNCH_DUAL_RIGHT: i32 = 76;
pub const PUNCH_TRIPLE_LEFT: i32 = 78;
pub const PUNCH_TRIPLE_TOP: i32 = 79;
pub const PUNCH_TRIPLE_RIGHT: i32 = 80;
pub const PUNCH_QUAD_LEFT: i32 = 82;
pub const PUNCH_QUAD_TOP: i32 = 83;
pub const PUNCH_QUAD_RIGHT: i32 = 84;
pub const FOLD_DOUBLE_GATE: i32 = 91;
pub const FOLD_HALF: i32 = 93;
pub const FOLD_LEFT_GATE: i32 = 95;
pub const FOLD_LETTER: i32 = 96;
pub const FOLD_POSTER: i32 = 98;
pub const FOLD_RIGHT_GATE: i32 = 99;
pub const FOLD_Z: i32 = 100;

/// A finishings value and the PPD choices that all have to be selected for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishingEntry {
    pub value: i32,
    pub options: OptionList,
}

impl FinishingEntry {
    pub fn new(value: i32, options: OptionList) -> Self {
        Self { value, options }
    }
}

// Well-known PPD options, used when the PPD has no cupsIPPFinishings.
const KNOWN_CHOICES: &[(&str, &[(&str, i32)])] = &[
    (
        "StapleLocation",
        &[
            ("SinglePortrait", STAPLE_TOP_LEFT),
            ("UpperLeft", STAPLE_TOP_LEFT),
            ("UpperRight", STAPLE_TOP_RIGHT),
            ("SingleLandscape", STAPLE_BOTTOM_LEFT),
            ("DualLandscape", STAPLE_DUAL_LEFT),
        ],
    ),
    (
        "RIPunch",
        &[
            ("Left2", PUNCH_DUAL_LEFT),
            ("Left3", PUNCH_TRIPLE_LEFT),
            ("Left4", PUNCH_QUAD_LEFT),
            ("Right2", PUNCH_DUAL_RIGHT),
            ("Right3", PUNCH_TRIPLE_RIGHT),
            ("Right4", PUNCH_QUAD_RIGHT),
            ("Upper2", PUNCH_DUAL_TOP),
            ("Upper3", PUNCH_TRIPLE_TOP),
            ("Upper4", PUNCH_QUAD_TOP),
        ],
    ),
    (
        "BindEdge",
        &[
            ("Left", BIND_LEFT),
            ("Right", BIND_RIGHT),
            ("Top", BIND_TOP),
            ("Bottom", BIND_BOTTOM),
        ],
    ),
    (
        "FoldType",
        &[
            ("ZFold", FOLD_Z),
            ("Saddle", FOLD_HALF),
            ("DoubleGate", FOLD_DOUBLE_GATE),
            ("LeftGate", FOLD_LEFT_GATE),
            ("RightGate", FOLD_RIGHT_GATE),
            ("Letter", FOLD_LETTER),
            ("XFold", FOLD_POSTER),
        ],
    ),
    ("RIFoldType", &[("OutsideTwoFold", FOLD_LETTER)]),
];

/// Build the finishings table of a document, highest value first.
///
/// `cupsIPPFinishings` attributes are used as given; without them entries
/// are synthesized from the choices of well-known options.
pub(crate) fn build(doc: &PpdDocument) -> Vec<FinishingEntry> {
    let mut table: Vec<FinishingEntry> = doc
        .find_attrs("cupsIPPFinishings")
        .map(|attr| {
            FinishingEntry::new(
                keyword::atoi(&attr.spec),
                ppd::parse_options(&attr.value, ParseMode::Options),
            )
        })
        .collect();

    if table.is_empty() {
        for (option, choices) in KNOWN_CHOICES {
            let Some(opt) = doc.find_option(option) else {
                continue;
            };
            for (choice, value) in *choices {
                if opt.find_choice(choice).is_some() {
                    let options = [(*option, *choice)].into_iter().collect();
                    table.push(FinishingEntry::new(*value, options));
                }
            }
        }
        debug!(entries = table.len(), "synthesized finishings");
    }

    // Stable, so entries with equal values keep document order.
    table.sort_by(|a, b| b.value.cmp(&a.value));
    table
}

impl PpdCache {
    /// Add the PPD choices for the requested finishings to `options`.
    ///
    /// The job's `finishings` enum values take precedence over `value`; a
    /// `finishings` attribute of another syntax is ignored. Values without a
    /// table entry, and [`NONE`], add nothing.
    pub fn apply_finishings(&self, job: Option<&IppAttributes>, value: i32, options: &mut OptionList) {
        if self.finishings.is_empty() {
            return;
        }

        let enums = job
            .and_then(|j| j.find("finishings"))
            .filter(|attr| matches!(attr.first(), Some(IppValue::Enum(_))));
        let requested: Vec<i32> = match enums {
            Some(attr) => attr
                .values
                .iter()
                .filter_map(|v| match v {
                    IppValue::Enum(n) => Some(*n),
                    _ => None,
                })
                .collect(),
            None if value != NONE => vec![value],
            None => return,
        };

        for value in requested {
            if let Some(entry) = self.finishings.iter().find(|f| f.value == value) {
                options.extend_from(&entry.options);
            }
        }
    }

    /// PPD choices for the requested finishings.
    pub fn finishing_options(&self, job: Option<&IppAttributes>, value: i32) -> OptionList {
        let mut options = OptionList::new();
        self.apply_finishings(job, value, &mut options);
        options
    }

    /// Finishings values selected by the marked choices of `doc`.
    ///
    /// Returns at most `max` values, most specific first, or just [`NONE`]
    /// when nothing matches. Without a finishings table the result is
    /// empty.
    pub fn finishing_values(&self, doc: &PpdDocument, max: usize) -> Vec<i32> {
        if self.finishings.is_empty() || max == 0 {
            return Vec::new();
        }

        let mut values: Vec<i32> = self
            .finishings
            .iter()
            .filter(|f| {
                f.options.iter().all(|o| {
                    doc.find_marked_choice(&o.name)
                        .is_some_and(|c| c.choice.eq_ignore_ascii_case(&o.value))
                })
            })
            .map(|f| f.value)
            .take(max)
            .collect();

        if values.is_empty() {
            values.push(NONE);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipp::Group;
    use crate::ppd::PpdOption;

    fn stapler() -> PpdDocument {
        let mut doc = PpdDocument::new();
        doc.add_option(
            "Finishing",
            PpdOption::new("StapleLocation", ["None", "SinglePortrait", "UpperLeft", "DualLandscape"])
                .with_default("None"),
        );
        doc.add_option("Finishing", PpdOption::new("FoldType", ["None", "ZFold"]).with_default("None"));
        doc
    }

    fn cache(doc: &PpdDocument) -> PpdCache {
        PpdCache {
            finishings: build(doc),
            ..PpdCache::default()
        }
    }

    #[test]
    fn synthesized_table_is_sorted() {
        let pc = cache(&stapler());
        let values: Vec<i32> = pc.finishings().iter().map(|f| f.value).collect();
        assert_eq!(values, vec![FOLD_Z, STAPLE_DUAL_LEFT, STAPLE_TOP_LEFT, STAPLE_TOP_LEFT]);
        assert_eq!(pc.finishings()[2].options.get("StapleLocation"), Some("SinglePortrait"));
    }

    #[test]
    fn explicit_mapping_wins() {
        let mut doc = stapler();
        doc.add_attr("cupsIPPFinishings", "4", "*StapleLocation SinglePortrait");
        doc.add_attr("cupsIPPFinishings", "90", "*FoldType ZFold *StapleLocation None");

        let pc = cache(&doc);
        assert_eq!(pc.finishings().len(), 2);
        assert_eq!(pc.finishings()[0].value, 90);
        assert_eq!(pc.finishings()[0].options.len(), 2);
    }

    #[test]
    fn forward_lookup() {
        let pc = cache(&stapler());
        assert_eq!(pc.finishing_options(None, FOLD_Z).to_string(), "FoldType=ZFold");
        assert!(pc.finishing_options(None, NONE).is_empty());
        assert!(pc.finishing_options(None, 1234).is_empty());

        let mut job = IppAttributes::new();
        job.add_values(
            Group::Job,
            "finishings",
            vec![IppValue::Enum(STAPLE_DUAL_LEFT), IppValue::Enum(FOLD_Z)],
        );
        assert_eq!(
            pc.finishing_options(Some(&job), NONE).to_string(),
            "StapleLocation=DualLandscape FoldType=ZFold"
        );
    }

    #[test]
    fn reverse_lookup() {
        let mut doc = stapler();
        let pc = cache(&doc);
        doc.mark_defaults();
        assert_eq!(pc.finishing_values(&doc, 10), vec![NONE]);

        doc.mark("StapleLocation", "UpperLeft");
        doc.mark("FoldType", "ZFold");
        assert_eq!(pc.finishing_values(&doc, 10), vec![FOLD_Z, STAPLE_TOP_LEFT]);
        assert_eq!(pc.finishing_values(&doc, 1), vec![FOLD_Z]);

        assert!(PpdCache::default().finishing_values(&doc, 10).is_empty());
    }

    #[test]
    fn every_entry_round_trips() {
        let base = stapler();
        let pc = cache(&base);
        for (i, entry) in pc.finishings().iter().enumerate() {
            let mut doc = base.clone();
            doc.mark_defaults();
            doc.mark_options(&entry.options);
            assert!(pc.finishing_values(&doc, 10).contains(&entry.value));

            // forward lookup resolves to the first entry with the value
            let first = pc.finishings().iter().position(|f| f.value == entry.value);
            if first == Some(i) {
                assert_eq!(pc.finishing_options(None, entry.value), entry.options);
            }
        }
    }
}
