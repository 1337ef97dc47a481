//! Ordered name/value option lists.
//!
//! Option names compare case-insensitively; adding an existing name
//! replaces its value in place, so the list keeps first-insertion order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single `name=value` option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameValue {
    pub name: String,
    pub value: String,
}

/// Ordered list of options with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionList(Vec<NameValue>);

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, replacing the value of an existing option of the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|o| o.name.eq_ignore_ascii_case(&name)) {
            Some(existing) => existing.value = value,
            None => self.0.push(NameValue { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(name))
            .map(|o| o.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self.0.iter().position(|o| o.name.eq_ignore_ascii_case(name))?;
        Some(self.0.remove(pos).value)
    }

    /// Append every option of `other`, replacing values of shared names.
    pub fn extend_from(&mut self, other: &OptionList) {
        for o in other.iter() {
            self.add(o.name.clone(), o.value.clone());
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NameValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a `name=value name2="quoted value" flag` string.
    ///
    /// Values may be single or double quoted, backslash escapes the next
    /// character, and `{...}` collection values are kept verbatim including
    /// the braces. A bare name gets the value `true`.
    pub fn parse(input: &str) -> Self {
        let mut list = Self::new();
        let mut chars = input.chars().peekable();

        loop {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            if chars.peek().is_none() {
                break;
            }

            let mut name = String::new();
            while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
                name.push(c);
            }

            if chars.next_if_eq(&'=').is_none() {
                if !name.is_empty() {
                    list.add(name, "true");
                }
                continue;
            }

            let mut value = String::new();
            let mut depth = 0usize;
            let mut quote: Option<char> = None;
            while let Some(&c) = chars.peek() {
                if quote.is_none() && depth == 0 && c.is_whitespace() {
                    break;
                }
                chars.next();
                match c {
                    '\\' => {
                        if depth > 0 {
                            value.push(c);
                        }
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    }
                    '"' | '\'' if depth == 0 && quote.is_none() => quote = Some(c),
                    '"' | '\'' if depth == 0 && quote == Some(c) => quote = None,
                    '{' if quote.is_none() => {
                        depth += 1;
                        value.push(c);
                    }
                    '}' if quote.is_none() && depth > 0 => {
                        depth -= 1;
                        value.push(c);
                    }
                    _ => value.push(c),
                }
            }

            if !name.is_empty() {
                list.add(name, value);
            }
        }

        list
    }
}

impl fmt::Display for OptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, o) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}=", o.name)?;
            if o.value.is_empty() || o.value.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == '\\') {
                f.write_str("\"")?;
                for c in o.value.chars() {
                    if matches!(c, '"' | '\\') {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")?;
            } else {
                f.write_str(&o.value)?;
            }
        }
        Ok(())
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for OptionList {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (n, v) in iter {
            list.add(n, v);
        }
        list
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a NameValue;
    type IntoIter = std::slice::Iter<'a, NameValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_replaces_case_insensitively() {
        let mut list = OptionList::new();
        list.add("ColorModel", "Gray");
        list.add("Resolution", "600dpi");
        list.add("colormodel", "RGB");
        assert_eq!(list.len(), 2);
        assert_eq!(list.get("COLORMODEL"), Some("RGB"));
        assert_eq!(list.iter().next().unwrap().name, "ColorModel");
    }

    #[test]
    fn parse_handles_quotes_and_collections() {
        let list = OptionList::parse(r#"a=1 b="two words" c='x y' d=\"q e={f=1 g=2} flag"#);
        assert_eq!(list.get("a"), Some("1"));
        assert_eq!(list.get("b"), Some("two words"));
        assert_eq!(list.get("c"), Some("x y"));
        assert_eq!(list.get("d"), Some("\"q"));
        assert_eq!(list.get("e"), Some("{f=1 g=2}"));
        assert_eq!(list.get("flag"), Some("true"));
    }

    #[test]
    fn display_quotes_when_needed() {
        let list: OptionList = [("a", "1"), ("b", "two words")].into_iter().collect();
        assert_eq!(list.to_string(), r#"a=1 b="two words""#);
        assert_eq!(OptionList::parse(&list.to_string()), list);
    }

    #[test]
    fn remove_and_extend() {
        let mut list = OptionList::parse("a=1 b=2");
        assert_eq!(list.remove("A"), Some("1".into()));
        list.extend_from(&OptionList::parse("b=3 c=4"));
        assert_eq!(list.to_string(), "b=3 c=4");
    }
}
