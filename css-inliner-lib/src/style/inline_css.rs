use crate::style::owned_css::{DeclarationRecord, ParseOutcome, ProcessedDeclarations};
use lightningcss::declaration::DeclarationBlock;
use lightningcss::printer::PrinterOptions;
use lightningcss::properties::Property;
use lightningcss::rules::{style::StyleRule, CssRule};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use log::{debug, warn};
use std::iter::Peekable;
use std::str::Chars;

/// Parses rule fragments with LightningCSS.
///
/// `silent` is fixed at construction: a silent parser never emits warnings for
/// the fragments it rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleParser {
    silent: bool,
}

impl RuleParser {
    pub fn new(silent: bool) -> Self {
        RuleParser { silent }
    }

    /// Parses one fragment. Returns a single `Unparseable` on syntax errors,
    /// otherwise one outcome per rule the fragment contains (possibly none).
    ///
    /// LightningCSS only decides validity; the declaration text is taken from
    /// the fragment itself so values reach the `style` attribute as written.
    pub fn parse_fragment(&self, fragment: &str) -> Vec<ParseOutcome> {
        if !braces_balanced(fragment) {
            self.report(fragment, "unbalanced braces");
            return vec![ParseOutcome::Unparseable(fragment.to_string())];
        }

        let parser_opts = ParserOptions {
            error_recovery: false,
            ..ParserOptions::default()
        };
        let sheet = match LightningStyleSheet::parse(fragment, parser_opts) {
            Ok(sheet) => sheet,
            Err(err) => {
                self.report(fragment, &err.to_string());
                return vec![ParseOutcome::Unparseable(fragment.to_string())];
            }
        };

        let mut bodies = style_rule_bodies(fragment).into_iter();
        let mut outcomes = Vec::new();
        for rule in &sheet.rules.0 {
            match rule {
                CssRule::Style(style_rule) => {
                    let Some(body) = bodies.next() else {
                        debug!("no declaration block found for a rule in {:?}", fragment);
                        outcomes.push(ParseOutcome::Skipped);
                        continue;
                    };
                    match convert_style_rule(style_rule, &body) {
                        Some(outcome) => outcomes.push(outcome),
                        None => {
                            self.report(fragment, "declaration without a value");
                            return vec![ParseOutcome::Unparseable(fragment.to_string())];
                        }
                    }
                }
                _ => outcomes.push(ParseOutcome::Skipped),
            }
        }
        outcomes
    }

    /// Runs every fragment through the parser, grouping declarations of identical
    /// selector text and collecting the fragments that failed to parse.
    pub fn process_fragments<S: AsRef<str>>(&self, fragments: &[S]) -> ProcessedDeclarations {
        let mut successful = DeclarationRecord::new();
        let mut failed = Vec::new();

        for fragment in fragments {
            for outcome in self.parse_fragment(fragment.as_ref()) {
                match outcome {
                    ParseOutcome::Parsed {
                        selector,
                        declarations,
                    } => successful.push(&selector, declarations),
                    ParseOutcome::Unparseable(text) => failed.push(text),
                    ParseOutcome::Skipped => {}
                }
            }
        }

        debug!(
            "parsed {} fragments: {} selectors, {} failed",
            fragments.len(),
            successful.len(),
            failed.len()
        );
        ProcessedDeclarations { successful, failed }
    }

    fn report(&self, fragment: &str, reason: &str) {
        if !self.silent {
            warn!("keeping unparseable CSS {:?} as is: {}", fragment, reason);
        }
    }
}

/// Copies a StyleRule's selector text and the rule's own declaration text
/// into a `Parsed` outcome.
///
/// Returns `None` when a declaration has an empty value (`a{color:}`).
fn convert_style_rule(style_rule: &StyleRule<'_>, body: &str) -> Option<ParseOutcome> {
    let mut selectors_vec = Vec::new();
    for selector in &style_rule.selectors.0 {
        if let Ok(sel_str) = selector.to_css_string(PrinterOptions::default()) {
            selectors_vec.push(sel_str);
        }
    }
    if selectors_vec.is_empty() {
        return Some(ParseOutcome::Skipped);
    }

    if has_empty_value(&style_rule.declarations) {
        return None;
    }
    Some(ParseOutcome::Parsed {
        selector: selectors_vec.join(", "),
        declarations: format_css_content_for_inline(&declaration_lines(body)),
    })
}

fn has_empty_value(block: &DeclarationBlock<'_>) -> bool {
    block
        .declarations
        .iter()
        .chain(block.important_declarations.iter())
        .any(value_is_empty)
}

/// Custom properties (`--x:`) may legally be empty.
fn value_is_empty(property: &Property<'_>) -> bool {
    if property.property_id().name().starts_with("--") {
        return false;
    }
    property
        .value_to_css_string(PrinterOptions::default())
        .map(|value| value.trim().is_empty())
        .unwrap_or(false)
}

/// Walks CSS source, skipping comments and marking characters that are not
/// structural: a string's delimiters and contents, and backslash escapes.
struct CssChars<'a> {
    chars: Peekable<Chars<'a>>,
    quote: Option<char>,
    escaped: bool,
}

impl<'a> CssChars<'a> {
    fn new(css: &'a str) -> Self {
        CssChars {
            chars: css.chars().peekable(),
            quote: None,
            escaped: false,
        }
    }

    fn skip_comment(&mut self) {
        self.chars.next();
        let mut star = false;
        for ch in self.chars.by_ref() {
            if star && ch == '/' {
                return;
            }
            star = ch == '*';
        }
    }
}

impl Iterator for CssChars<'_> {
    /// The character, and whether it is quoted or escaped.
    type Item = (char, bool);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let ch = self.chars.next()?;
            if self.escaped {
                self.escaped = false;
                return Some((ch, true));
            }
            if ch == '\\' {
                self.escaped = true;
                return Some((ch, true));
            }
            if let Some(quote) = self.quote {
                if ch == quote {
                    self.quote = None;
                }
                return Some((ch, true));
            }
            match ch {
                '/' if self.chars.peek() == Some(&'*') => self.skip_comment(),
                '"' | '\'' => {
                    self.quote = Some(ch);
                    return Some((ch, true));
                }
                _ => return Some((ch, false)),
            }
        }
    }
}

/// Braces inside strings and comments do not count.
fn braces_balanced(css: &str) -> bool {
    let (mut open, mut close) = (0usize, 0usize);
    for (ch, quoted) in CssChars::new(css) {
        match ch {
            '{' if !quoted => open += 1,
            '}' if !quoted => close += 1,
            _ => {}
        }
    }
    open == close
}

/// Declaration text of each top-level style rule in `css`, in source order,
/// with comments removed. At-rule blocks are left out.
fn style_rule_bodies(css: &str) -> Vec<String> {
    let mut bodies = Vec::new();
    let mut depth = 0usize;
    let mut at_rule = false;
    let mut prelude_started = false;
    let mut body = String::new();

    for (ch, quoted) in CssChars::new(css) {
        if depth == 0 {
            match ch {
                '{' if !quoted => {
                    depth = 1;
                    body.clear();
                }
                ';' if !quoted => prelude_started = false,
                c if c.is_whitespace() && !quoted => {}
                c => {
                    if !prelude_started {
                        at_rule = c == '@' && !quoted;
                        prelude_started = true;
                    }
                }
            }
            continue;
        }

        if !quoted && ch == '{' {
            depth += 1;
        } else if !quoted && ch == '}' {
            depth -= 1;
            if depth == 0 {
                if !at_rule {
                    bodies.push(std::mem::take(&mut body));
                }
                prelude_started = false;
                continue;
            }
        }
        body.push(ch);
    }
    bodies
}

/// Splits declaration text at top-level `;`, one trimmed declaration per line.
/// A declaration written across several lines is joined onto one.
///
/// `;` inside strings or parentheses (`url(data:...;base64,...)`) does not split.
fn declaration_lines(body: &str) -> String {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut nesting = 0usize;

    for (ch, quoted) in CssChars::new(body) {
        if !quoted {
            match ch {
                '(' | '[' | '{' => nesting += 1,
                ')' | ']' | '}' => nesting = nesting.saturating_sub(1),
                ';' if nesting == 0 => {
                    lines.push(std::mem::take(&mut current));
                    continue;
                }
                _ => {}
            }
        }
        current.push(ch);
    }
    lines.push(current);

    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.replace(['\r', '\n'], " "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flattens declaration text onto one line for a `style` attribute.
///
/// Each line is trimmed, stripped of every `;`, and given exactly one `;`;
/// lines are joined with a single space.
pub fn format_css_content_for_inline(css_text: &str) -> String {
    css_text
        .trim()
        .lines()
        .map(|line| format!("{};", line.trim().replace(';', "")))
        .collect::<Vec<_>>()
        .join(" ")
}
