// Owned data passed between the inlining stages. Nothing here borrows from
// the parsed stylesheet, so the CSS parser's lifetimes end inside the rule parser.
use std::collections::HashMap;
use std::fmt;

/// Result of parsing one rule fragment (or one rule inside it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A style rule: exact selector text and its formatted declaration text.
    Parsed {
        selector: String,
        declarations: String,
    },
    /// The fragment is not valid CSS; kept verbatim for the residual block.
    Unparseable(String),
    /// A rule without a selector/declaration shape (at-rules and the like).
    Skipped,
}

/// Selector text -> formatted declarations, in first-seen selector order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeclarationRecord {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl DeclarationRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `declarations` to the list for `selector`, creating it if new.
    pub fn push(&mut self, selector: &str, declarations: String) {
        let slot = match self.index.get(selector) {
            Some(&slot) => slot,
            None => {
                self.entries.push((selector.to_string(), Vec::new()));
                self.index.insert(selector.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[slot].1.push(declarations);
    }

    #[cfg(test)]
    pub fn get(&self, selector: &str) -> Option<&[String]> {
        self.index
            .get(selector)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(selector, declarations)| (selector.as_str(), declarations.as_slice()))
    }

    #[cfg(test)]
    pub fn selectors(&self) -> Vec<&str> {
        self.entries.iter().map(|(selector, _)| selector.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of the rule parser over all fragments.
#[derive(Debug, Default, Clone)]
pub struct ProcessedDeclarations {
    pub successful: DeclarationRecord,
    pub failed: Vec<String>,
}

/// One selector-text key split into its selectors, with the joined inline style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorGroup {
    pub selectors: Vec<String>,
    pub inline_style: String,
}

impl SelectorGroup {
    /// Selectors containing a `:` anywhere. Purely textual, so `[data-x:y]` counts too.
    pub fn pseudo_selectors(&self) -> Vec<String> {
        self.selectors
            .iter()
            .filter(|s| s.contains(':'))
            .cloned()
            .collect()
    }

    pub fn plain_selectors(&self) -> Vec<String> {
        self.selectors
            .iter()
            .filter(|s| !s.contains(':'))
            .cloned()
            .collect()
    }
}

/// A rule that cannot live in a `style` attribute and goes back into `<style>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoRule {
    pub selectors: Vec<String>,
    pub inline_style: String,
}

impl fmt::Display for PseudoRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", self.selectors.join(", "), self.inline_style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_groups_identical_selectors_in_first_seen_order() {
        let mut record = DeclarationRecord::new();
        record.push("a", "color:red;".to_string());
        record.push("p", "margin:0;".to_string());
        record.push("a", "font-size:12px;".to_string());

        assert_eq!(record.selectors(), vec!["a", "p"]);
        assert_eq!(
            record.get("a"),
            Some(&["color:red;".to_string(), "font-size:12px;".to_string()][..])
        );
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn selector_group_partitions_on_colon() {
        let group = SelectorGroup {
            selectors: vec!["a".into(), "b:hover".into(), "[data-x:y]".into(), "p".into()],
            inline_style: "color:red;".into(),
        };
        assert_eq!(group.plain_selectors(), vec!["a".to_string(), "p".to_string()]);
        assert_eq!(
            group.pseudo_selectors(),
            vec!["b:hover".to_string(), "[data-x:y]".to_string()]
        );
    }

    #[test]
    fn pseudo_rule_displays_as_css() {
        let rule = PseudoRule {
            selectors: vec!["a:hover".into(), "b:focus".into()],
            inline_style: "color:red;".into(),
        };
        assert_eq!(rule.to_string(), "a:hover, b:focus{color:red;}");
    }
}
