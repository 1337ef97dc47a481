//! Finishings tables built from documents, looked up both ways.

use ppdcache::cache::finishings::{FOLD_Z, NONE, PUNCH_DUAL_LEFT, STAPLE_TOP_LEFT};
use ppdcache::ppd::{PpdDocument, PpdOption, PpdSize};
use ppdcache::{Group, IppAttributes, IppValue, OptionList, PpdCache};

fn finisher() -> PpdDocument {
    let mut doc = PpdDocument::new();
    doc.add_size(PpdSize::new("Letter", 612.0, 792.0, [18.0; 4]));
    doc.add_option(
        "Finishing",
        PpdOption::new("StapleLocation", ["None", "UpperLeft"]).with_default("None"),
    );
    doc.add_option("Finishing", PpdOption::new("RIPunch", ["None", "Left2"]).with_default("None"));
    doc.add_option("Finishing", PpdOption::new("FoldType", ["None", "ZFold"]).with_default("None"));
    doc.mark_defaults();
    doc
}

fn job_finishings(values: &[i32]) -> IppAttributes {
    let mut job = IppAttributes::new();
    job.add_values(
        Group::Job,
        "finishings",
        values.iter().copied().map(IppValue::Enum).collect(),
    );
    job
}

#[test]
fn known_options_are_synthesized_highest_first() {
    let pc = PpdCache::from_ppd(&finisher()).unwrap();
    let values: Vec<i32> = pc.finishings().iter().map(|f| f.value).collect();
    assert_eq!(values, vec![FOLD_Z, PUNCH_DUAL_LEFT, STAPLE_TOP_LEFT]);
}

#[test]
fn job_finishings_select_choices() {
    let pc = PpdCache::from_ppd(&finisher()).unwrap();

    let options = pc.finishing_options(Some(&job_finishings(&[STAPLE_TOP_LEFT, PUNCH_DUAL_LEFT])), NONE);
    assert_eq!(options.get("StapleLocation"), Some("UpperLeft"));
    assert_eq!(options.get("RIPunch"), Some("Left2"));

    // the job attribute wins over the requested value
    let options = pc.finishing_options(Some(&job_finishings(&[FOLD_Z])), STAPLE_TOP_LEFT);
    assert_eq!(options.to_string(), "FoldType=ZFold");

    let mut options = OptionList::new();
    pc.apply_finishings(None, STAPLE_TOP_LEFT, &mut options);
    assert_eq!(options.to_string(), "StapleLocation=UpperLeft");

    assert!(pc.finishing_options(None, NONE).is_empty());
    assert!(pc.finishing_options(None, 999).is_empty());
}

#[test]
fn non_enum_job_finishings_fall_back_to_the_value() {
    let pc = PpdCache::from_ppd(&finisher()).unwrap();

    let mut job = IppAttributes::new();
    job.add(Group::Job, "finishings", IppValue::Integer(STAPLE_TOP_LEFT));
    let options = pc.finishing_options(Some(&job), FOLD_Z);
    assert_eq!(options.to_string(), "FoldType=ZFold");

    assert!(pc.finishing_options(Some(&job), NONE).is_empty());
}

#[test]
fn marked_choices_report_values() {
    let mut doc = finisher();
    let pc = PpdCache::from_ppd(&doc).unwrap();
    assert_eq!(pc.finishing_values(&doc, 10), vec![NONE]);

    doc.mark("StapleLocation", "UpperLeft");
    doc.mark("FoldType", "ZFold");
    assert_eq!(pc.finishing_values(&doc, 10), vec![FOLD_Z, STAPLE_TOP_LEFT]);
    assert_eq!(pc.finishing_values(&doc, 1), vec![FOLD_Z]);
    assert!(pc.finishing_values(&doc, 0).is_empty());
}

#[test]
fn explicit_table_replaces_synthesis() {
    let mut doc = finisher();
    doc.add_attr("cupsIPPFinishings", "4", "*StapleLocation UpperLeft");
    doc.add_attr("cupsIPPFinishings", "5", "*RIPunch Left2");
    doc.add_attr("cupsIPPFinishings", "4", "*StapleLocation UpperLeft *FoldType ZFold");
    let pc = PpdCache::from_ppd(&doc).unwrap();

    let values: Vec<i32> = pc.finishings().iter().map(|f| f.value).collect();
    assert_eq!(values, vec![5, 4, 4]);
    // equal values keep document order
    assert_eq!(pc.finishings()[1].options.len(), 1);
    assert_eq!(pc.finishings()[2].options.len(), 2);

    doc.mark("StapleLocation", "UpperLeft");
    assert_eq!(pc.finishing_values(&doc, 10), vec![4]);
}

#[test]
fn table_order_survives_the_cache_file() {
    let mut doc = finisher();
    doc.add_attr("cupsIPPFinishings", "20", "*StapleLocation UpperLeft");
    doc.add_attr("cupsIPPFinishings", "100", "*FoldType ZFold");
    let pc = PpdCache::from_ppd(&doc).unwrap();

    let data = pc.to_bytes(None).unwrap();
    let (loaded, _) = PpdCache::from_bytes(&data, false).unwrap();
    assert_eq!(loaded.finishings(), pc.finishings());
    assert_eq!(loaded.finishings()[0].value, 100);
}

#[test]
fn documents_without_finishers_have_no_table() {
    let mut doc = PpdDocument::new();
    doc.add_size(PpdSize::new("Letter", 612.0, 792.0, [18.0; 4]));
    let pc = PpdCache::from_ppd(&doc).unwrap();

    assert!(pc.finishings().is_empty());
    assert!(pc.finishing_values(&doc, 10).is_empty());
}
