//! Preset selection, both scored and from printer-supplied presets.

use ppdcache::ppd::{PpdDocument, PpdOption, PpdSize};
use ppdcache::{ColorMode, ContentOptimize, PpdCache, Quality};

fn document() -> PpdDocument {
    let mut doc = PpdDocument::new();
    doc.color_device = true;
    doc.add_size(PpdSize::new("Letter", 612.0, 792.0, [18.0, 36.0, 18.0, 36.0]));
    doc
}

#[test]
fn scored_presets_fill_every_cell() {
    let mut doc = document();
    doc.add_option("Color", PpdOption::new("ColorModel", ["Gray", "RGB"]).with_default("RGB"));
    doc.add_option(
        "Quality",
        PpdOption::new("PrintQuality", ["Draft", "Normal", "High"]).with_default("Normal"),
    );
    let pc = PpdCache::from_ppd(&doc).unwrap();

    for quality in Quality::ALL {
        let mono = pc.presets().get(ColorMode::Monochrome, quality);
        let color = pc.presets().get(ColorMode::Color, quality);
        assert_eq!(mono.get("ColorModel"), Some("Gray"), "{quality:?}");
        assert_eq!(color.get("ColorModel"), Some("RGB"), "{quality:?}");
    }

    for (quality, choice) in [
        (Quality::Draft, "Draft"),
        (Quality::Normal, "Normal"),
        (Quality::High, "High"),
    ] {
        for color in ColorMode::ALL {
            assert_eq!(pc.presets().get(color, quality).get("PrintQuality"), Some(choice));
        }
    }
}

#[test]
fn content_presets_come_from_vendor_tables() {
    let mut doc = document();
    doc.add_option(
        "Color",
        PpdOption::new("HPRGBEmulation", ["DefaultSRGB", "VividSRGB", "PhotoSRGB"]),
    );
    let pc = PpdCache::from_ppd(&doc).unwrap();

    let optimize = pc.optimize_presets();
    assert_eq!(optimize.get(ContentOptimize::Photo).get("HPRGBEmulation"), Some("PhotoSRGB"));
    assert_eq!(optimize.get(ContentOptimize::Graphics).get("HPRGBEmulation"), Some("VividSRGB"));
    assert_eq!(optimize.get(ContentOptimize::Text).get("HPRGBEmulation"), Some("DefaultSRGB"));
    assert!(optimize.get(ContentOptimize::Auto).is_empty());

    // neither a color nor a quality option
    assert!(pc.presets().is_empty());
}

#[test]
fn placement_options_are_never_presets() {
    let mut doc = document();
    doc.add_option("General", PpdOption::new("InputSlot", ["Auto", "PhotoTray"]));
    doc.add_option("General", PpdOption::new("MediaType", ["Plain", "PhotoHighGloss"]));
    let pc = PpdCache::from_ppd(&doc).unwrap();

    assert!(pc.presets().is_empty());
    assert!(pc.optimize_presets().get(ContentOptimize::Photo).is_empty());
}

#[test]
fn grayscale_is_derived_from_color_presets() {
    let mut doc = document();
    doc.add_option("Color", PpdOption::new("ColorModel", ["RGB", "Gray"]));
    doc.add_attr_with_text(
        "APPrinterPreset",
        "Everyday",
        "Everyday Color",
        "*ColorModel RGB *com.apple.print.preset.quality mid",
    );
    doc.add_attr_with_text(
        "APPrinterPreset",
        "Quick",
        "Quick Color",
        "*ColorModel RGB *com.apple.print.preset.quality low",
    );
    let pc = PpdCache::from_ppd(&doc).unwrap();

    assert_eq!(pc.ui_string("preset-name.Quick"), Some("Quick Color"));
    for quality in [Quality::Draft, Quality::Normal] {
        assert_eq!(pc.presets().get(ColorMode::Color, quality).get("ColorModel"), Some("RGB"));
        assert_eq!(
            pc.presets().get(ColorMode::Monochrome, quality).get("ColorModel"),
            Some("Gray")
        );
    }
    assert!(pc.presets().get(ColorMode::Color, Quality::High).is_empty());
    assert!(pc.presets().get(ColorMode::Monochrome, Quality::High).is_empty());
}

#[test]
fn low_quality_photo_presets_are_skipped() {
    let mut doc = document();
    doc.add_attr_with_text(
        "APPrinterPreset",
        "Snapshot",
        "Snapshot",
        "*ColorModel RGB *com.apple.print.preset.quality mid \
         *com.apple.print.preset.graphicsType Photo",
    );
    doc.add_attr_with_text(
        "APPrinterPreset",
        "Fine",
        "Fine Photo",
        "*ColorModel RGB *com.apple.print.preset.quality high \
         *com.apple.print.preset.graphicsType Photo",
    );
    let pc = PpdCache::from_ppd(&doc).unwrap();

    assert!(pc.presets().get(ColorMode::Color, Quality::Normal).is_empty());
    assert_eq!(
        pc.presets().get(ColorMode::Color, Quality::High).get("ColorModel"),
        Some("RGB")
    );
    // the name is kept even when the preset is not used
    assert_eq!(pc.ui_string("preset-name.Snapshot"), Some("Snapshot"));
}

#[test]
fn presets_survive_the_cache_file() {
    let mut doc = document();
    doc.add_option("Color", PpdOption::new("ColorModel", ["Gray", "RGB"]).with_default("RGB"));
    doc.add_option("Color", PpdOption::new("HPRGBEmulation", ["DefaultSRGB", "PhotoSRGB"]));
    let pc = PpdCache::from_ppd(&doc).unwrap();

    let data = pc.to_bytes(None).unwrap();
    let (loaded, _) = PpdCache::from_bytes(&data, false).unwrap();
    assert_eq!(loaded.presets(), pc.presets());
    assert_eq!(loaded.optimize_presets(), pc.optimize_presets());
}
