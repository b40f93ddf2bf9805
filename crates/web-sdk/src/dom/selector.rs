//! Minimal CSS selector support for the in-memory document: compound simple
//! selectors (`tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]`) joined by
//! descendant whitespace, and comma-separated selector lists. Attribute values
//! may contain spaces and commas. Child and sibling combinators are rejected.

use trackthat_core::{TrackError, TrackResult};

/// A node that selectors can be matched against.
pub trait Matchable: Sized {
    fn tag_name(&self) -> &str;
    fn attribute(&self, name: &str) -> Option<&str>;
    fn parent_node(&self) -> Option<Self>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn matches<M: Matchable>(&self, node: &M) -> bool {
        if let Some(ref tag) = self.tag {
            if !node.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(ref id) = self.id {
            if node.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = node.attribute("class").unwrap_or_default();
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|h| h == c))
            {
                return false;
            }
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Exists(name) => node.attribute(name).is_some(),
            AttrTest::Equals(name, value) => node.attribute(name) == Some(value.as_str()),
        })
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// Each alternative is a descendant chain, outermost compound first.
    alternatives: Vec<Vec<Compound>>,
}

impl Selector {
    pub fn parse(input: &str) -> TrackResult<Self> {
        let mut alternatives = Vec::new();
        for part in split_outside_brackets(input, |c| c == ',') {
            let chain = split_outside_brackets(part, char::is_whitespace)
                .into_iter()
                .filter(|c| !c.is_empty())
                .map(|c| parse_compound(c).map_err(|reason| invalid(input, &reason)))
                .collect::<TrackResult<Vec<_>>>()?;
            if chain.is_empty() {
                return Err(invalid(input, "empty selector"));
            }
            alternatives.push(chain);
        }
        Ok(Self { alternatives })
    }

    pub fn matches<M: Matchable>(&self, node: &M) -> bool {
        self.alternatives
            .iter()
            .any(|chain| chain_matches(chain, node))
    }
}

fn invalid(selector: &str, reason: &str) -> TrackError {
    TrackError::Definition(format!("invalid selector '{selector}': {reason}"))
}

/// Splits `input` at characters matching `is_sep` that sit outside `[...]`.
fn split_outside_brackets(input: &str, is_sep: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if depth == 0 && is_sep(c) => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn chain_matches<M: Matchable>(chain: &[Compound], node: &M) -> bool {
    let Some((last, ancestors)) = chain.split_last() else {
        return false;
    };
    if !last.matches(node) {
        return false;
    }
    // Descendant combinators only, so matching each remaining compound
    // against the nearest qualifying ancestor is sufficient.
    let mut remaining = ancestors.iter().rev().peekable();
    let mut current = node.parent_node();
    while let Some(wanted) = remaining.peek() {
        match current {
            Some(ancestor) => {
                if wanted.matches(&ancestor) {
                    remaining.next();
                }
                current = ancestor.parent_node();
            }
            None => return false,
        }
    }
    true
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn parse_compound(input: &str) -> Result<Compound, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut pos = 0;
    let mut compound = Compound::default();

    if chars.first() == Some(&'*') {
        pos = 1;
    } else {
        let tag = take_ident(&chars, &mut pos);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }
    }

    while pos < chars.len() {
        let marker = chars[pos];
        pos += 1;
        match marker {
            '#' => {
                let id = take_ident(&chars, &mut pos);
                if id.is_empty() {
                    return Err("expected id after '#'".into());
                }
                compound.id = Some(id);
            }
            '.' => {
                let class = take_ident(&chars, &mut pos);
                if class.is_empty() {
                    return Err("expected class name after '.'".into());
                }
                compound.classes.push(class);
            }
            '[' => {
                let close = chars[pos..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or_else(|| "unterminated attribute selector".to_string())?;
                let body: String = chars[pos..pos + close].iter().collect();
                pos += close + 1;
                compound.attrs.push(parse_attr(&body)?);
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(compound)
}

fn parse_attr(body: &str) -> Result<AttrTest, String> {
    match body.split_once('=') {
        None => {
            let name = body.trim();
            if name.is_empty() {
                return Err("empty attribute selector".into());
            }
            Ok(AttrTest::Exists(name.to_string()))
        }
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err("empty attribute name".into());
            }
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Ok(AttrTest::Equals(name.to_string(), value.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fake<'a> {
        nodes: &'a [(&'a str, HashMap<&'a str, &'a str>, Option<usize>)],
        idx: usize,
    }

    impl<'a> Matchable for Fake<'a> {
        fn tag_name(&self) -> &str {
            self.nodes[self.idx].0
        }
        fn attribute(&self, name: &str) -> Option<&str> {
            self.nodes[self.idx].1.get(name).copied()
        }
        fn parent_node(&self) -> Option<Self> {
            self.nodes[self.idx].2.map(|idx| Fake {
                nodes: self.nodes,
                idx,
            })
        }
    }

    fn tree() -> Vec<(&'static str, HashMap<&'static str, &'static str>, Option<usize>)> {
        vec![
            ("ul", HashMap::from([("id", "top_nav")]), None),
            ("li", HashMap::from([("class", "item active")]), Some(0)),
            (
                "a",
                HashMap::from([
                    ("href", "/home"),
                    ("data-kind", "nav"),
                    ("title", "Home, sweet home"),
                ]),
                Some(1),
            ),
        ]
    }

    #[test]
    fn test_simple_selectors() {
        let nodes = tree();
        let link = Fake { nodes: &nodes, idx: 2 };
        let item = Fake { nodes: &nodes, idx: 1 };

        assert!(Selector::parse("a").unwrap().matches(&link));
        assert!(Selector::parse("A").unwrap().matches(&link));
        assert!(Selector::parse("*").unwrap().matches(&link));
        assert!(Selector::parse("li.item").unwrap().matches(&item));
        assert!(Selector::parse(".item.active").unwrap().matches(&item));
        assert!(!Selector::parse(".item.hidden").unwrap().matches(&item));
        assert!(Selector::parse("[href]").unwrap().matches(&link));
        assert!(Selector::parse("a[data-kind='nav']").unwrap().matches(&link));
        assert!(!Selector::parse("a[data-kind=footer]").unwrap().matches(&link));
    }

    #[test]
    fn test_descendant_and_lists() {
        let nodes = tree();
        let link = Fake { nodes: &nodes, idx: 2 };

        assert!(Selector::parse("#top_nav a").unwrap().matches(&link));
        assert!(Selector::parse("ul li a").unwrap().matches(&link));
        assert!(!Selector::parse("#footer a").unwrap().matches(&link));
        assert!(Selector::parse("button, #top_nav a").unwrap().matches(&link));
    }

    #[test]
    fn test_attribute_values_with_separators() {
        let nodes = tree();
        let link = Fake { nodes: &nodes, idx: 2 };

        assert!(Selector::parse(r#"a[title="Home, sweet home"]"#).unwrap().matches(&link));
        assert!(Selector::parse(r#"ul [title='Home, sweet home'], b"#).unwrap().matches(&link));
        assert!(!Selector::parse(r#"[title="Home"]"#).unwrap().matches(&link));
        assert!(Selector::parse(r#"a[title="Home, sweet"#).is_err());
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a,").is_err());
        assert!(Selector::parse("#").is_err());
        assert!(Selector::parse("a[href").is_err());
        assert!(Selector::parse("a > b").is_err());
    }
}
