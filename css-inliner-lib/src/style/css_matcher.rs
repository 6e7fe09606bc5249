use crate::dom::dom_tree::{self, Document, ElementNode, Handle};
use log::debug;
use std::collections::HashSet;
use std::rc::Rc;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>, // None means only existence check
    pub value: Option<String>,
    /// Set by the ` i` flag: the value compares ASCII case-insensitively.
    pub case_insensitive: bool,
}

/// A compound selector: an optional tag, id, classes, and attribute conditions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: HashSet<String>,
    pub attributes: Vec<AttributeSelector>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Parse a compound selector string, e.g. "div.red#header[disabled][data-type~=\"main\"]".
///
/// Returns `None` for syntax this matcher does not know (pseudo-classes, namespaces).
pub fn parse_compound_selector(selector: &str) -> Option<CompoundSelector> {
    let mut compound = CompoundSelector::default();
    let mut chars = selector.chars().peekable();

    let name = take_name(&mut chars);
    if !name.is_empty() {
        compound.tag = Some(name);
    } else if chars.peek() == Some(&'*') {
        chars.next();
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' => {
                let id = take_name(&mut chars);
                if id.is_empty() {
                    return None;
                }
                compound.id = Some(id);
            }
            '.' => {
                let class = take_name(&mut chars);
                if class.is_empty() {
                    return None;
                }
                compound.classes.insert(class);
            }
            '[' => compound.attributes.push(parse_attribute(&mut chars)?),
            _ => return None,
        }
    }
    Some(compound)
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}

/// Reads an identifier, resolving backslash escapes (`a\.b`, `\31 0`).
fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&ch) = chars.peek() {
        if ch == '\\' {
            chars.next();
            match take_escape(chars) {
                Some(unescaped) => name.push(unescaped),
                None => break,
            }
            continue;
        }
        if !is_name_char(ch) {
            break;
        }
        name.push(ch);
        chars.next();
    }
    name
}

/// The character after a backslash: up to six hex digits (plus one optional
/// whitespace), or any other character taken literally.
fn take_escape(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<char> {
    let mut hex = String::new();
    while hex.len() < 6 {
        match chars.peek() {
            Some(&ch) if ch.is_ascii_hexdigit() => {
                hex.push(ch);
                chars.next();
            }
            _ => break,
        }
    }
    if hex.is_empty() {
        return chars.next().filter(|ch| *ch != '\n');
    }
    if chars.peek().is_some_and(|ch| ch.is_whitespace()) {
        chars.next();
    }
    let code = u32::from_str_radix(&hex, 16).ok()?;
    Some(
        char::from_u32(code)
            .filter(|ch| *ch != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER),
    )
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
        chars.next();
    }
}

/// Parses the inside of `[...]`; the opening bracket is already consumed.
fn parse_attribute(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Option<AttributeSelector> {
    skip_whitespace(chars);
    let name = take_name(chars);
    if name.is_empty() {
        return None;
    }
    skip_whitespace(chars);

    let operator = match chars.next()? {
        ']' => {
            return Some(AttributeSelector {
                name,
                operator: None,
                value: None,
                case_insensitive: false,
            })
        }
        '=' => AttributeOperator::Exact,
        op => {
            if chars.next()? != '=' {
                return None;
            }
            match op {
                '~' => AttributeOperator::Includes,
                '|' => AttributeOperator::DashMatch,
                '^' => AttributeOperator::Prefix,
                '$' => AttributeOperator::Suffix,
                '*' => AttributeOperator::Substring,
                _ => return None,
            }
        }
    };
    skip_whitespace(chars);

    let mut value = String::new();
    match chars.peek().copied() {
        Some(quote @ ('"' | '\'')) => {
            chars.next();
            loop {
                match chars.next()? {
                    ch if ch == quote => break,
                    '\\' => value.push(take_escape(chars)?),
                    ch => value.push(ch),
                }
            }
        }
        _ => {
            value = take_name(chars);
            if value.is_empty() {
                return None;
            }
        }
    }
    skip_whitespace(chars);

    let case_insensitive = match chars.next()? {
        ']' => false,
        flag @ ('i' | 'I' | 's' | 'S') => {
            skip_whitespace(chars);
            if chars.next()? != ']' {
                return None;
            }
            flag.eq_ignore_ascii_case(&'i')
        }
        _ => return None,
    };
    Some(AttributeSelector {
        name,
        operator: Some(operator),
        value: Some(value),
        case_insensitive,
    })
}

/// Where the tokenizer is inside a backslash escape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    Start,
    Hex(usize),
}

/// Splits a complex selector into compounds and the combinators between them.
///
/// Combinators may be written with or without surrounding whitespace
/// (`a>b`, `a > b`); brackets and quoted strings are kept intact.
fn tokenize_complex(selector: &str) -> Option<Vec<(Combinator, String)>> {
    let mut parts: Vec<(Combinator, String)> = Vec::new();
    let mut current = String::new();
    let mut pending: Option<Combinator> = None;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    let mut escape = Escape::None;

    for ch in selector.chars() {
        match escape {
            Escape::Start => {
                current.push(ch);
                escape = if ch.is_ascii_hexdigit() {
                    Escape::Hex(1)
                } else {
                    Escape::None
                };
                continue;
            }
            Escape::Hex(digits) => {
                escape = Escape::None;
                if ch.is_ascii_hexdigit() && digits < 6 {
                    current.push(ch);
                    escape = Escape::Hex(digits + 1);
                    continue;
                }
                // One whitespace terminates a hex escape and is part of it.
                if ch.is_whitespace() {
                    current.push(ch);
                    continue;
                }
            }
            Escape::None => {}
        }
        if ch == '\\' {
            current.push(ch);
            escape = Escape::Start;
            continue;
        }
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        if in_brackets {
            current.push(ch);
            match ch {
                '"' | '\'' => quote = Some(ch),
                ']' => in_brackets = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '>' | '+' | '~' => {
                push_compound(&mut parts, &mut current, &mut pending)?;
                if pending.is_some_and(|c| c != Combinator::Descendant) {
                    return None;
                }
                pending = Some(match ch {
                    '>' => Combinator::Child,
                    '+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                });
            }
            ch if ch.is_whitespace() => {
                push_compound(&mut parts, &mut current, &mut pending)?;
                pending.get_or_insert(Combinator::Descendant);
            }
            _ => {
                in_brackets = ch == '[';
                current.push(ch);
            }
        }
    }
    push_compound(&mut parts, &mut current, &mut pending)?;

    if escape == Escape::Start || in_brackets || quote.is_some() || parts.is_empty() {
        return None;
    }
    // A trailing combinator (`a >`) is an error; trailing whitespace is not.
    if pending.is_some_and(|c| c != Combinator::Descendant) {
        return None;
    }
    Some(parts)
}

fn push_compound(
    parts: &mut Vec<(Combinator, String)>,
    current: &mut String,
    pending: &mut Option<Combinator>,
) -> Option<()> {
    if current.is_empty() {
        return Some(());
    }
    let combinator = pending.take().unwrap_or(Combinator::Descendant);
    if parts.is_empty() && combinator != Combinator::Descendant {
        return None;
    }
    parts.push((combinator, std::mem::take(current)));
    Some(())
}

/// Parse a complex selector string (e.g. "div.red > p#header + span.foo") into a ComplexSelector.
pub fn parse_complex_selector(selector: &str) -> Option<ComplexSelector> {
    let tokens = tokenize_complex(selector)?;
    let mut iter = tokens.into_iter();
    let (_, first) = iter.next()?;
    let mut key = parse_compound_selector(&first)?;
    let mut ancestors = Vec::new();

    for (combinator, compound) in iter {
        ancestors.push((combinator, key));
        key = parse_compound_selector(&compound)?;
    }
    ancestors.reverse();
    Some(ComplexSelector { key, ancestors })
}

/// ------------------------------
/// 2. Selector Matching
/// ------------------------------

/// Returns true if the given ElementNode matches the CompoundSelector.
/// Checks tag, id, classes, and attribute conditions.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(ref id_val) = compound.id {
        if elem.get_attribute("id") != Some(id_val.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|class| elem.has_class(class)) {
        return false;
    }
    compound
        .attributes
        .iter()
        .all(|attr_sel| matches_attribute(elem, attr_sel))
}

fn matches_attribute(elem: &ElementNode, attr_sel: &AttributeSelector) -> bool {
    let Some(actual) = elem.get_attribute(&attr_sel.name) else {
        return false;
    };
    let (Some(operator), Some(expected)) = (&attr_sel.operator, &attr_sel.value) else {
        return true;
    };
    if attr_sel.case_insensitive {
        let (actual, expected) = (actual.to_ascii_lowercase(), expected.to_ascii_lowercase());
        return matches_operator(operator, &actual, &expected);
    }
    matches_operator(operator, actual, expected)
}

fn matches_operator(operator: &AttributeOperator, actual: &str, expected: &str) -> bool {
    match operator {
        AttributeOperator::Exact => actual == expected,
        AttributeOperator::Includes => actual.split_whitespace().any(|word| word == expected),
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected)
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

fn matches_element(node: &Handle, compound: &CompoundSelector) -> bool {
    node.borrow()
        .as_element()
        .is_some_and(|elem| matches_compound(elem, compound))
}

/// Matches a ComplexSelector against a candidate element, right to left,
/// backtracking over ancestors and siblings.
pub fn matches_complex_selector(candidate: &Handle, complex: &ComplexSelector) -> bool {
    matches_element(candidate, &complex.key) && matches_ancestors(candidate, &complex.ancestors)
}

fn matches_ancestors(node: &Handle, ancestors: &[(Combinator, CompoundSelector)]) -> bool {
    let Some(((combinator, compound), rest)) = ancestors.split_first() else {
        return true;
    };
    let accept = |next: &Handle| matches_element(next, compound) && matches_ancestors(next, rest);

    match combinator {
        Combinator::Child => parent_element(node).is_some_and(|parent| accept(&parent)),
        Combinator::Descendant => {
            let mut ancestor = parent_element(node);
            while let Some(current) = ancestor {
                if accept(&current) {
                    return true;
                }
                ancestor = parent_element(&current);
            }
            false
        }
        Combinator::AdjacentSibling => previous_element_siblings(node)
            .first()
            .is_some_and(|sibling| accept(sibling)),
        Combinator::GeneralSibling => previous_element_siblings(node).iter().any(accept),
    }
}

/// Parent of an element, if that parent is itself an element.
fn parent_element(node: &Handle) -> Option<Handle> {
    dom_tree::parent_of(node).filter(|parent| parent.borrow().as_element().is_some())
}

/// Element siblings before `node`, nearest first.
fn previous_element_siblings(node: &Handle) -> Vec<Handle> {
    let Some(parent) = dom_tree::parent_of(node) else {
        return Vec::new();
    };
    let parent = parent.borrow();
    let children = parent.children();
    let Some(index) = children.iter().position(|child| Rc::ptr_eq(child, node)) else {
        return Vec::new();
    };
    children[..index]
        .iter()
        .rev()
        .filter(|child| child.borrow().as_element().is_some())
        .cloned()
        .collect()
}

/// ------------------------------
/// 3. Document queries
/// ------------------------------

/// All elements matching `selector`, in document order.
///
/// A selector this matcher cannot parse matches nothing.
pub fn select(document: &Document, selector: &str) -> Vec<Handle> {
    let Some(complex) = parse_complex_selector(selector) else {
        debug!("selector {:?} is not supported, nothing matched", selector);
        return Vec::new();
    };
    document
        .elements()
        .into_iter()
        .filter(|element| matches_complex_selector(element, &complex))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    fn ids(document: &Document, selector: &str) -> Vec<String> {
        select(document, selector)
            .iter()
            .map(|node| {
                node.borrow()
                    .as_element()
                    .and_then(|elem| elem.get_attribute("id"))
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    const PAGE: &str = r#"<html><head></head><body>
        <div id="outer" class="box red">
            <p id="p1" class="lead">one</p>
            <p id="p2" lang="en-US">two</p>
            <span id="s1" data-kind="main note">three</span>
            <section id="sec"><p id="p3">deep</p></section>
        </div>
        <a id="link" href="https://example.com/page.html">x</a>
    </body></html>"#;

    #[test]
    fn parses_compound_parts() {
        let compound = parse_compound_selector("div.red.box#outer[data-x=\"a b\"][hidden]").unwrap();
        assert_eq!(compound.tag.as_deref(), Some("div"));
        assert_eq!(compound.id.as_deref(), Some("outer"));
        assert!(compound.classes.contains("red") && compound.classes.contains("box"));
        assert_eq!(
            compound.attributes,
            vec![
                AttributeSelector {
                    name: "data-x".into(),
                    operator: Some(AttributeOperator::Exact),
                    value: Some("a b".into()),
                    case_insensitive: false,
                },
                AttributeSelector {
                    name: "hidden".into(),
                    operator: None,
                    value: None,
                    case_insensitive: false,
                },
            ]
        );
    }

    #[test]
    fn parses_combinators_without_spaces() {
        let spaced = parse_complex_selector("div > p + span").unwrap();
        let tight = parse_complex_selector("div>p+span").unwrap();
        assert_eq!(spaced, tight);
        assert_eq!(
            spaced.ancestors.iter().map(|(c, _)| *c).collect::<Vec<_>>(),
            vec![Combinator::AdjacentSibling, Combinator::Child]
        );
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert!(parse_complex_selector("a:hover").is_none());
        assert!(parse_complex_selector("> a").is_none());
        assert!(parse_complex_selector("a >").is_none());
        assert!(parse_complex_selector("[unterminated").is_none());
    }

    #[test]
    fn matches_type_class_and_id() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "p"), vec!["p1", "p2", "p3"]);
        assert_eq!(ids(&document, "P.lead"), vec!["p1"]);
        assert_eq!(ids(&document, "#s1"), vec!["s1"]);
        assert_eq!(ids(&document, ".box.red"), vec!["outer"]);
        assert!(ids(&document, ".missing").is_empty());
    }

    #[test]
    fn matches_combinators() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "div p"), vec!["p1", "p2", "p3"]);
        assert_eq!(ids(&document, "div > p"), vec!["p1", "p2"]);
        assert_eq!(ids(&document, ".lead + p"), vec!["p2"]);
        assert_eq!(ids(&document, ".lead ~ section p"), vec!["p3"]);
        assert_eq!(ids(&document, "body > div section > p"), vec!["p3"]);
    }

    #[test]
    fn matches_attribute_operators() {
        let document = create_dom_tree(PAGE);
        assert_eq!(ids(&document, "[data-kind~=note]"), vec!["s1"]);
        assert_eq!(ids(&document, "[lang|=\"en\"]"), vec!["p2"]);
        assert_eq!(ids(&document, "a[href^='https']"), vec!["link"]);
        assert_eq!(ids(&document, "a[href$=\".html\"]"), vec!["link"]);
        assert_eq!(ids(&document, "[href*=example]"), vec!["link"]);
        assert_eq!(ids(&document, "*[lang]"), vec!["p2"]);
    }

    #[test]
    fn attribute_case_flag() {
        let document = create_dom_tree(
            r#"<form><input id="plain" type="text"><input id="upper" type="TEXT"></form>"#,
        );
        assert_eq!(ids(&document, "input[type=\"TEXT\" i]"), vec!["plain", "upper"]);
        assert_eq!(ids(&document, "input[type=text I]"), vec!["plain", "upper"]);
        assert_eq!(ids(&document, "input[type=\"TEXT\" s]"), vec!["upper"]);
        assert_eq!(ids(&document, "input[type=\"TEXT\"]"), vec!["upper"]);
        assert!(parse_complex_selector("[type=text x]").is_none());
    }

    #[test]
    fn escaped_identifiers() {
        let document = create_dom_tree(
            r#"<p id="dotted" class="a.b">x</p><p id="digit" class="10col">y</p><p id="gt" class="a>b">z</p>"#,
        );
        assert_eq!(ids(&document, ".a\\.b"), vec!["dotted"]);
        assert_eq!(ids(&document, "p.\\31 0col"), vec!["digit"]);
        assert_eq!(ids(&document, ".a\\>b"), vec!["gt"]);
        assert_eq!(ids(&document, "#dotted"), vec!["dotted"]);
        assert!(parse_complex_selector(".a\\").is_none());
    }
}
