//! Legacy PPD document model.
//!
//! An in-memory view of a parsed PPD file: option groups, choices with
//! their embedded code, main-keyword attributes and page sizes. Documents
//! are assembled with the builder-style methods below; marking tracks the
//! currently selected choice of each option.

pub mod raster;

use crate::options::OptionList;

/// One choice of an option.
#[derive(Debug, Clone, PartialEq)]
pub struct PpdChoice {
    /// Choice keyword (`Gray`, `600dpi`)
    pub choice: String,
    /// Human readable text
    pub text: String,
    /// PostScript or PJL code sent for this choice
    pub code: String,
    pub marked: bool,
}

impl PpdChoice {
    pub fn new(choice: impl Into<String>) -> Self {
        let choice = choice.into();
        Self {
            text: choice.clone(),
            choice,
            code: String::new(),
            marked: false,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

/// A UI option with its choices.
#[derive(Debug, Clone, PartialEq)]
pub struct PpdOption {
    pub keyword: String,
    pub text: String,
    /// Default choice keyword
    pub default_choice: String,
    pub choices: Vec<PpdChoice>,
}

impl PpdOption {
    /// Option with plain choices; the first choice is the default.
    pub fn new<I, S>(keyword: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices: Vec<PpdChoice> = choices.into_iter().map(PpdChoice::new).collect();
        let keyword = keyword.into();
        Self {
            text: keyword.clone(),
            default_choice: choices.first().map(|c| c.choice.clone()).unwrap_or_default(),
            keyword,
            choices,
        }
    }

    pub fn with_default(mut self, choice: impl Into<String>) -> Self {
        self.default_choice = choice.into();
        self
    }

    /// Attach code to the named choice.
    pub fn with_code(mut self, choice: &str, code: impl Into<String>) -> Self {
        if let Some(c) = self.choices.iter_mut().find(|c| c.choice.eq_ignore_ascii_case(choice)) {
            c.code = code.into();
        }
        self
    }

    /// Set the human readable text of the named choice.
    pub fn with_choice_text(mut self, choice: &str, text: impl Into<String>) -> Self {
        if let Some(c) = self.choices.iter_mut().find(|c| c.choice.eq_ignore_ascii_case(choice)) {
            c.text = text.into();
        }
        self
    }

    pub fn find_choice(&self, choice: &str) -> Option<&PpdChoice> {
        self.choices.iter().find(|c| c.choice.eq_ignore_ascii_case(choice))
    }

    pub fn default_choice(&self) -> Option<&PpdChoice> {
        self.find_choice(&self.default_choice)
    }

    pub fn marked_choice(&self) -> Option<&PpdChoice> {
        self.choices.iter().find(|c| c.marked)
    }
}

/// A named group of options.
#[derive(Debug, Clone, PartialEq)]
pub struct PpdGroup {
    pub name: String,
    pub text: String,
    pub options: Vec<PpdOption>,
}

/// A main-keyword attribute, `*Name Spec/Text: "Value"`.
#[derive(Debug, Clone, PartialEq)]
pub struct PpdAttribute {
    pub name: String,
    pub spec: String,
    pub text: String,
    pub value: String,
}

/// A page size in PostScript points.
#[derive(Debug, Clone, PartialEq)]
pub struct PpdSize {
    pub name: String,
    pub width: f64,
    pub length: f64,
    /// Imageable area, measured from the bottom-left corner
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl PpdSize {
    /// Size with an imageable area inset by the given margins.
    pub fn new(name: impl Into<String>, width: f64, length: f64, margins: [f64; 4]) -> Self {
        let [left, bottom, right, top] = margins;
        Self {
            name: name.into(),
            width,
            length,
            left,
            bottom,
            right: width - right,
            top: length - top,
        }
    }
}

/// Which names [`parse_options`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Only option names (no dots)
    Options,
    /// Only dotted property names
    Properties,
    All,
}

/// Parse a `*Name Value *Name2 Value2` attribute value.
pub fn parse_options(value: &str, mode: ParseMode) -> OptionList {
    let mut list = OptionList::new();
    let mut words = value.split_whitespace().peekable();

    while let Some(word) = words.next() {
        let Some(name) = word.strip_prefix('*') else {
            break;
        };
        let value = words.next_if(|w| !w.starts_with('*')).unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let dotted = name.contains('.');
        let keep = match mode {
            ParseMode::All => true,
            ParseMode::Options => !dotted,
            ParseMode::Properties => dotted,
        };
        if keep {
            list.add(name, value);
        }
    }

    list
}

/// A parsed PPD document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PpdDocument {
    pub groups: Vec<PpdGroup>,
    pub attrs: Vec<PpdAttribute>,
    pub sizes: Vec<PpdSize>,
    pub nickname: Option<String>,
    /// `*Product` strings
    pub product: Option<String>,
    /// `*cupsFilter` lines
    pub filters: Vec<String>,
    pub color_device: bool,
    pub manual_copies: bool,
    pub variable_sizes: bool,
    /// Custom size bounds in points, width then length
    pub custom_min: [f64; 2],
    pub custom_max: [f64; 2],
    /// Custom size hardware margins: left, bottom, right, top
    pub custom_margins: [f64; 4],
}

impl PpdDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option to the named group, creating the group as needed.
    pub fn add_option(&mut self, group: &str, option: PpdOption) -> &mut Self {
        match self.groups.iter_mut().find(|g| g.name == group) {
            Some(g) => g.options.push(option),
            None => self.groups.push(PpdGroup {
                name: group.to_string(),
                text: group.to_string(),
                options: vec![option],
            }),
        }
        self
    }

    pub fn add_attr(&mut self, name: &str, spec: &str, value: &str) -> &mut Self {
        self.add_attr_with_text(name, spec, spec, value)
    }

    pub fn add_attr_with_text(&mut self, name: &str, spec: &str, text: &str, value: &str) -> &mut Self {
        self.attrs.push(PpdAttribute {
            name: name.to_string(),
            spec: spec.to_string(),
            text: text.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Add a page size and the matching `PageSize` choice.
    pub fn add_size(&mut self, size: PpdSize) -> &mut Self {
        let choice = PpdChoice::new(size.name.clone());
        let page_size = self
            .groups
            .iter_mut()
            .flat_map(|g| g.options.iter_mut())
            .find(|o| o.keyword == "PageSize");
        match page_size {
            Some(option) => option.choices.push(choice),
            None => {
                let option = PpdOption {
                    keyword: "PageSize".to_string(),
                    text: "Media Size".to_string(),
                    default_choice: size.name.clone(),
                    choices: vec![choice],
                };
                self.add_option("General", option);
            }
        }
        self.sizes.push(size);
        self
    }

    pub fn options(&self) -> impl Iterator<Item = &PpdOption> {
        self.groups.iter().flat_map(|g| g.options.iter())
    }

    pub fn find_option(&self, keyword: &str) -> Option<&PpdOption> {
        self.options().find(|o| o.keyword.eq_ignore_ascii_case(keyword))
    }

    fn find_option_mut(&mut self, keyword: &str) -> Option<&mut PpdOption> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.options.iter_mut())
            .find(|o| o.keyword.eq_ignore_ascii_case(keyword))
    }

    pub fn find_choice(&self, option: &str, choice: &str) -> Option<&PpdChoice> {
        self.find_option(option)?.find_choice(choice)
    }

    /// First attribute of the name, optionally restricted to a spec.
    pub fn find_attr(&self, name: &str, spec: Option<&str>) -> Option<&PpdAttribute> {
        self.find_attrs(name)
            .find(|a| spec.is_none_or(|s| a.spec.eq_ignore_ascii_case(s)))
    }

    pub fn find_attrs<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a PpdAttribute> + use<'a, 'b> {
        self.attrs.iter().filter(move |a| a.name.eq_ignore_ascii_case(name))
    }

    /// Value of the first attribute of the name.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.find_attr(name, None).map(|a| a.value.as_str())
    }

    /// Select a choice, unmarking the others of the option.
    ///
    /// Returns false when the option or choice does not exist.
    pub fn mark(&mut self, option: &str, choice: &str) -> bool {
        let Some(opt) = self.find_option_mut(option) else {
            return false;
        };
        if opt.find_choice(choice).is_none() {
            return false;
        }
        for c in &mut opt.choices {
            c.marked = c.choice.eq_ignore_ascii_case(choice);
        }
        true
    }

    /// Mark every option's default choice.
    pub fn mark_defaults(&mut self) {
        for option in self.groups.iter_mut().flat_map(|g| g.options.iter_mut()) {
            let default = option.default_choice.clone();
            for c in &mut option.choices {
                c.marked = c.choice.eq_ignore_ascii_case(&default);
            }
        }
    }

    /// Mark every option of the list that exists in the document.
    pub fn mark_options(&mut self, options: &OptionList) {
        for o in options {
            self.mark(&o.name, &o.value);
        }
    }

    pub fn find_marked_choice(&self, option: &str) -> Option<&PpdChoice> {
        self.find_option(option)?.marked_choice()
    }

    pub fn is_marked(&self, option: &str, choice: &str) -> bool {
        self.find_marked_choice(option)
            .is_some_and(|c| c.choice.eq_ignore_ascii_case(choice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PpdDocument {
        let mut doc = PpdDocument::new();
        doc.add_option("General", PpdOption::new("ColorModel", ["Gray", "RGB"]).with_default("RGB"))
            .add_option("General", PpdOption::new("Resolution", ["300dpi", "600dpi"]))
            .add_attr("cupsFilter2", "", "application/vnd.cups-raster image/pwg-raster 0 -")
            .add_attr("APPrinterPreset", "Draft", "*ColorModel Gray");
        doc
    }

    #[test]
    fn marking() {
        let mut doc = sample();
        assert!(doc.find_marked_choice("ColorModel").is_none());

        doc.mark_defaults();
        assert!(doc.is_marked("colormodel", "rgb"));
        assert!(doc.is_marked("Resolution", "300dpi"));

        assert!(doc.mark("ColorModel", "Gray"));
        assert!(doc.is_marked("ColorModel", "Gray"));
        assert!(!doc.is_marked("ColorModel", "RGB"));
        assert!(!doc.mark("ColorModel", "CMYK"));
        assert!(!doc.mark("Duplex", "None"));
    }

    #[test]
    fn attribute_lookup() {
        let doc = sample();
        assert_eq!(doc.find_attrs("cupsfilter2").count(), 1);
        assert!(doc.find_attr("APPrinterPreset", Some("draft")).is_some());
        assert!(doc.find_attr("APPrinterPreset", Some("Photo")).is_none());
    }

    #[test]
    fn attributes_outlive_the_looked_up_name() {
        let doc = sample();
        let filters: Vec<&PpdAttribute> = {
            let name = String::from("cupsFilter2");
            doc.find_attrs(&name).collect()
        };
        assert_eq!(filters.len(), 1);

        let preset = {
            let spec = "draft".to_string();
            doc.find_attr("APPrinterPreset", Some(&spec))
        };
        assert!(preset.is_some());
        let value = {
            let name = format!("{}Filter2", "cups");
            doc.attr_value(&name)
        };
        assert_eq!(value, Some(filters[0].value.as_str()));
    }

    #[test]
    fn sizes_add_page_size_choices() {
        let mut doc = PpdDocument::new();
        doc.add_size(PpdSize::new("Letter", 612.0, 792.0, [18.0, 36.0, 18.0, 36.0]))
            .add_size(PpdSize::new("A4", 595.0, 842.0, [18.0, 36.0, 18.0, 36.0]));
        let page_size = doc.find_option("PageSize").unwrap();
        assert_eq!(page_size.choices.len(), 2);
        assert_eq!(page_size.default_choice, "Letter");
        assert_eq!(doc.sizes[0].right, 594.0);
        assert_eq!(doc.sizes[0].top, 756.0);
    }

    #[test]
    fn preset_values() {
        let value = "*com.apple.print.preset.quality high *ColorModel RGB *Resolution 1200dpi";
        let all = parse_options(value, ParseMode::All);
        assert_eq!(all.len(), 3);

        let props = parse_options(value, ParseMode::Properties);
        assert_eq!(props.get("com.apple.print.preset.quality"), Some("high"));
        assert!(!props.contains("ColorModel"));

        let opts = parse_options(value, ParseMode::Options);
        assert_eq!(opts.to_string(), "ColorModel=RGB Resolution=1200dpi");
    }
}
