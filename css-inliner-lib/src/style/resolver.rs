use crate::style::owned_css::{DeclarationRecord, PseudoRule, SelectorGroup};

/// Turns every record entry into a selector group with one joined inline style.
///
/// The selector text is split on `,` and each piece trimmed; the entry's
/// declaration list is joined with single spaces.
pub fn inline_css_declarations(record: &DeclarationRecord) -> Vec<SelectorGroup> {
    record
        .iter()
        .map(|(selector, declarations)| SelectorGroup {
            selectors: selector.split(',').map(|s| s.trim().to_string()).collect(),
            inline_style: declarations.join(" "),
        })
        .collect()
}

/// Selector groups sorted into what can be inlined and what has to stay in `<style>`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResolvedSelectors {
    /// Plain selectors of a group with that group's inline style.
    pub inline: Vec<SelectorGroup>,
    pub pseudo: Vec<PseudoRule>,
}

pub fn resolve(groups: Vec<SelectorGroup>) -> ResolvedSelectors {
    let mut resolved = ResolvedSelectors::default();

    for group in groups {
        let pseudo_selectors = group.pseudo_selectors();
        // The first style seen for a given pseudo selector set is kept; later
        // rules with exactly the same set are dropped.
        if !pseudo_selectors.is_empty()
            && !resolved
                .pseudo
                .iter()
                .any(|rule| rule.selectors == pseudo_selectors)
        {
            resolved.pseudo.push(PseudoRule {
                selectors: pseudo_selectors,
                inline_style: group.inline_style.clone(),
            });
        }

        let plain_selectors = group.plain_selectors();
        if plain_selectors.is_empty() {
            continue;
        }
        resolved.inline.push(SelectorGroup {
            selectors: plain_selectors,
            inline_style: group.inline_style,
        });
    }
    resolved
}
