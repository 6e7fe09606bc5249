use crate::dom::dom_tree::Document;
use crate::style::css_matcher;
use log::debug;

/// Merges an existing `style` value (as tokens) with a new inline style.
///
/// Tokens and the new style are joined with `"; "` and trailing semicolons are
/// removed, so existing declarations always come first.
pub fn merge_style(existing: &[String], inline_style: &str) -> String {
    if existing.is_empty() {
        return inline_style.trim_end_matches(';').to_string();
    }
    let mut parts: Vec<&str> = existing.iter().map(String::as_str).collect();
    parts.push(inline_style);
    parts.join("; ").trim_end_matches(';').to_string()
}

/// Appends `inline_style` to the `style` attribute of every element matched by
/// any of `selectors`. An element matched twice gets the style twice.
pub fn apply_selectors_to_elements(document: &Document, selectors: &[String], inline_style: &str) {
    for selector in selectors {
        let matched = css_matcher::select(document, selector);
        debug!("{:?} matched {} elements", selector, matched.len());

        for node in matched {
            let mut node_borrow = node.borrow_mut();
            if let Some(elem) = node_borrow.as_element_mut() {
                let merged = merge_style(&elem.attribute_tokens("style"), inline_style);
                elem.set_attribute("style", merged);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    fn style_of(document: &Document, tag: &str) -> Option<String> {
        let node = document.elements_by_tag(tag).remove(0);
        let node = node.borrow();
        node.as_element()
            .and_then(|elem| elem.get_attribute("style"))
            .map(str::to_string)
    }

    #[test]
    fn merge_without_existing_strips_trailing_semicolon() {
        assert_eq!(merge_style(&[], "color:red; margin:0;"), "color:red; margin:0");
    }

    #[test]
    fn merge_appends_after_existing_value() {
        assert_eq!(
            merge_style(&["font-weight:bold".to_string()], "color:red;"),
            "font-weight:bold; color:red"
        );
    }

    #[test]
    fn merge_joins_every_token() {
        assert_eq!(
            merge_style(&["a:1".to_string(), "b:2".to_string()], "c:3;"),
            "a:1; b:2; c:3"
        );
    }

    #[test]
    fn applies_in_selector_order() {
        let document =
            create_dom_tree("<p class=\"x\" id=\"y\" style=\"font-weight:bold\">hi</p>");
        apply_selectors_to_elements(&document, &["#y".to_string()], "color:red;");
        apply_selectors_to_elements(&document, &[".x".to_string()], "margin:0;");

        assert_eq!(
            style_of(&document, "p").as_deref(),
            Some("font-weight:bold; color:red; margin:0")
        );
    }

    #[test]
    fn unmatched_selector_changes_nothing() {
        let document = create_dom_tree("<p>hi</p>");
        apply_selectors_to_elements(&document, &[".nope".to_string()], "color:red;");
        assert_eq!(style_of(&document, "p"), None);
    }
}
