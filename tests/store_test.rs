//! Cache file round trips and rejection of damaged files.

use std::fs;

use ppdcache::ppd::{PpdDocument, PpdOption, PpdSize};
use ppdcache::{Group, IppAttributes, IppValue, PpdCache, last_error};

fn document() -> PpdDocument {
    let margins = [18.0, 36.0, 18.0, 36.0];
    let mut doc = PpdDocument::new();
    doc.color_device = true;
    doc.product = Some("(Acme LaserJet #5)".into());
    doc.add_size(PpdSize::new("Letter", 612.0, 792.0, margins));
    doc.add_size(PpdSize::new("A4", 595.0, 842.0, margins));
    doc.add_size(PpdSize::new("A4.Fullbleed", 595.0, 842.0, [0.0; 4]));
    doc.variable_sizes = true;
    doc.custom_min = [72.0, 72.0];
    doc.custom_max = [612.0, 1008.0];
    doc.add_option(
        "General",
        PpdOption::new("InputSlot", ["Auto", "Cassette", "Manual"]).with_choice_text("Cassette", "Main Tray"),
    );
    doc.add_option("General", PpdOption::new("MediaType", ["Plain", "Glossy"]));
    doc.add_option("General", PpdOption::new("OutputBin", ["FaceDown", "FaceUp"]));
    doc.add_option("General", PpdOption::new("Duplex", ["None", "DuplexNoTumble", "DuplexTumble"]));
    doc.add_option("Color", PpdOption::new("ColorModel", ["Gray", "RGB"]).with_default("RGB"));
    doc.add_option(
        "Finishing",
        PpdOption::new("StapleLocation", ["None", "UpperLeft", "UpperRight"]).with_default("None"),
    );
    doc.add_attr("cupsJobAccountId", "", "true");
    doc.add_attr("cupsJobPassword", "", "4444");
    doc.add_attr("cupsMandatory", "", "job-account-id job-name");
    doc.add_attr("cupsICCProfile", "RGB..", "/usr/share/color/acme.icc");
    doc.add_attr("cupsPreFilter", "", "image/png 0 pngfix");
    doc
}

fn printer_attributes() -> IppAttributes {
    let mut attrs = IppAttributes::new();
    attrs
        .add(Group::Printer, "printer-make-and-model", IppValue::Text("Acme LaserJet 5".into()))
        .add_values(
            Group::Printer,
            "sides-supported",
            vec![
                IppValue::Keyword("one-sided".into()),
                IppValue::Keyword("two-sided-long-edge".into()),
            ],
        );
    attrs
}

#[test]
fn built_cache_survives_a_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acme.data");

    let pc = PpdCache::from_ppd(&document()).unwrap();
    pc.save(&path, Some(&printer_attributes())).unwrap();

    let (loaded, attrs) = PpdCache::load_with_attributes(&path).unwrap();
    assert_eq!(loaded, pc);
    assert_eq!(attrs.unwrap().get_str("printer-make-and-model"), Some("Acme LaserJet 5"));

    // attributes are skipped, not lost
    assert_eq!(PpdCache::load(&path).unwrap(), pc);
    assert_eq!(loaded.product(), Some("(Acme LaserJet #5)"));
    assert_eq!(loaded.ui_string("media-source.main"), Some("Main Tray"));
}

#[test]
fn text_values_keep_trailing_whitespace() {
    let mut doc = document();
    doc.product = Some("(Acme LaserJet)  ".into());
    let pc = PpdCache::from_ppd(&doc).unwrap();

    let (loaded, _) = PpdCache::from_bytes(&pc.to_bytes(None).unwrap(), false).unwrap();
    assert_eq!(loaded.product(), Some("(Acme LaserJet)  "));
    assert_eq!(loaded, pc);
}

#[test]
fn save_replaces_the_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("printer.data");

    PpdCache::from_ppd(&document()).unwrap().save(&path, None).unwrap();
    PpdCache::default().save(&path, None).unwrap();

    assert_eq!(PpdCache::load(&path).unwrap(), PpdCache::default());
    let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
    assert_eq!(entries.len(), 1, "no temporary file left behind");
}

#[test]
fn written_file_starts_with_the_versioned_header() {
    let text = String::from_utf8(PpdCache::default().to_bytes(None).unwrap()).unwrap();
    assert!(text.starts_with("#CUPS-PPD-CACHE-11\n"));
    assert!(text.contains("\nNumSizes 0\n"));
    assert!(text.contains("\nMaxCopies 9999\n"));
}

#[test]
fn other_versions_are_out_of_date() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.data");
    fs::write(&path, "#CUPS-PPD-CACHE-10\nNumSizes 0\n").unwrap();

    let err = PpdCache::load(&path).unwrap_err();
    assert!(err.is_out_of_date());
    assert!(last_error().unwrap().contains("Out of date"));

    PpdCache::default().save(&path, None).unwrap();
    PpdCache::load(&path).unwrap();
    assert!(last_error().is_none());
}

#[test]
fn damaged_files_are_bad_format() {
    let cases = [
        "not a cache file\n",
        "#CUPS-PPD-CACHE-11\nNumSizes 1\n",
        "#CUPS-PPD-CACHE-11\nNumSources 1\nSource main Cassette\nSource manual Manual\n",
        "#CUPS-PPD-CACHE-11\nNumBins 2\nNumBins 2\n",
        "#CUPS-PPD-CACHE-11\nNumTypes 70000\n",
        "#CUPS-PPD-CACHE-11\nNumSizes 1\nSize iso_a4_210x297mm A4 21000\n",
        "#CUPS-PPD-CACHE-11\nCustomSize 1 2 3\n",
        "#CUPS-PPD-CACHE-11\nOptimizePreset 7 PrintMode=Photo\n",
        "#CUPS-PPD-CACHE-11\nIPP 0\n",
    ];
    for text in cases {
        let err = PpdCache::from_bytes(text.as_bytes(), false).unwrap_err();
        assert!(err.is_bad_format(), "{text:?}: {err}");
    }
}

#[test]
fn truncated_attributes_are_bad_format() {
    let data = PpdCache::default().to_bytes(Some(&printer_attributes())).unwrap();
    let err = PpdCache::from_bytes(&data[..data.len() - 5], true).unwrap_err();
    assert!(err.is_bad_format());
}

#[test]
fn unknown_declarations_are_ignored() {
    let text = "#CUPS-PPD-CACHE-11\n\
                NumSizes 1\n\
                Size iso_a4_210x297mm A4 21000 29700 635 1270 635 1270\n\
                HolographicMode enabled\n\
                Product (Acme)\n\
                Product (Ignored)\n";
    let (pc, attrs) = PpdCache::from_bytes(text.as_bytes(), true).unwrap();
    assert!(attrs.is_none());
    assert_eq!(pc.sizes().len(), 1);
    assert_eq!(pc.sizes()[0].bottom, 1270);
    assert_eq!(pc.product(), Some("(Acme)"));
}

#[test]
fn missing_files_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = PpdCache::load(dir.path().join("absent.data")).unwrap_err();
    assert!(matches!(err, ppdcache::PpdCacheError::Io { .. }));
}
