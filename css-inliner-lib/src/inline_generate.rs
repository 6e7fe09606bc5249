use crate::dom::dom_tree::{self, Document, ElementNode, Handle, Node};
use crate::error::{InlineError, InlineResult};
use crate::parser::{html, serialize};
use crate::style::owned_css::PseudoRule;
use crate::style::{applier, inline_css::RuleParser, resolver, splitter};
use log::{debug, info};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Settings for one inlining run.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineOptions {
    /// Suppress warnings about CSS that could not be parsed.
    pub silent: bool,
}

pub mod css_inline {
    use super::*;

    /// Inlines the `<style>` rules of `html_content` and returns the new document.
    pub fn inline(html_content: &str, options: &InlineOptions) -> InlineResult<String> {
        let document = html::create_dom_tree(html_content);
        inline_document(&document, options);
        serialize::to_html(&document)
    }

    /// Reads `input`, inlines it, and writes the result to `output` in one go.
    pub fn inline_file(input: &Path, output: &Path, options: &InlineOptions) -> InlineResult<()> {
        let bytes = fs::read(input).map_err(|source| InlineError::ReadInput {
            path: input.to_path_buf(),
            source,
        })?;
        info!("read {} bytes from {}", bytes.len(), input.display());

        let inlined = inline(&String::from_utf8_lossy(&bytes), options)?;
        fs::write(output, inlined).map_err(|source| InlineError::WriteOutput {
            path: output.to_path_buf(),
            source,
        })?;
        info!("wrote {}", output.display());
        Ok(())
    }

    /// Runs the whole pipeline on a parsed document, mutating it in place.
    ///
    /// All style text is read before any `<style>` element is removed.
    pub fn inline_document(document: &Document, options: &InlineOptions) {
        // Read phase.
        let style_nodes = document.elements_by_tag("style");
        let style_texts: Vec<String> = style_nodes
            .iter()
            .filter_map(|node| node.borrow().as_element().map(ElementNode::text_content))
            .collect();

        let fragments = splitter::divide_fragments(&style_texts);
        debug!(
            "{} style blocks split into {} fragments",
            style_texts.len(),
            fragments.len()
        );
        let processed = RuleParser::new(options.silent).process_fragments(&fragments);
        let groups = resolver::inline_css_declarations(&processed.successful);
        let resolved = resolver::resolve(groups);

        // Mutate phase.
        for group in &resolved.inline {
            applier::apply_selectors_to_elements(document, &group.selectors, &group.inline_style);
        }
        for node in &style_nodes {
            dom_tree::detach(node);
        }
        insert_unprocessed_declarations(document, &processed.failed, &resolved.pseudo);
    }
}

/// Builds the residual `<style>` element: failed fragments verbatim, then pseudo rules.
fn residual_style_element(failed: &[String], pseudo: &[PseudoRule]) -> Option<Handle> {
    let mut texts: Vec<String> = failed.to_vec();
    texts.extend(pseudo.iter().map(PseudoRule::to_string));
    if texts.is_empty() {
        return None;
    }

    let style = Rc::new(RefCell::new(Node::Element(ElementNode::html("style"))));
    for text in texts {
        dom_tree::append_child(&style, Rc::new(RefCell::new(Node::Text(text))));
    }
    Some(style)
}

/// Appends the residual `<style>` to `<head>`. Without a head the residual CSS is lost.
fn insert_unprocessed_declarations(document: &Document, failed: &[String], pseudo: &[PseudoRule]) {
    let Some(style) = residual_style_element(failed, pseudo) else {
        return;
    };
    match document.head() {
        Some(head) => dom_tree::append_child(&head, style),
        None => debug!(
            "no <head>, dropping {} residual rules",
            failed.len() + pseudo.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::css_inline::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(html: &str) -> String {
        inline(html, &InlineOptions { silent: true }).unwrap()
    }

    #[test]
    fn inlines_single_class_rule() {
        let output = run(
            "<html><head><style>.x{color:red}</style></head><body><p class=\"x\">hi</p></body></html>",
        );
        assert_eq!(
            output,
            "<html><head></head><body><p class=\"x\" style=\"color:red\">hi</p></body></html>"
        );
    }

    #[test]
    fn keeps_pseudo_rules_in_head() {
        let output = run(
            "<html><head><style>a, b:hover { color: red }</style></head>\
             <body><a>x</a><b>y</b></body></html>",
        );
        assert_eq!(
            output,
            "<html><head><style>b:hover{color: red;}</style></head>\
             <body><a style=\"color: red\">x</a><b>y</b></body></html>"
        );
    }

    #[test]
    fn failed_fragments_come_before_pseudo_rules() {
        let output = run(
            "<html><head><style>a:hover{color:red} @media print { p { margin:0 } }</style></head>\
             <body><p>x</p></body></html>",
        );
        assert_eq!(
            output,
            "<html><head><style>@media print { p { margin:0 }a:hover{color:red;}</style></head>\
             <body><p>x</p></body></html>"
        );
    }

    #[test]
    fn residual_is_lost_without_head() {
        let document = html::create_dom_tree("<p>x</p>");
        let head = document.head().unwrap();
        dom_tree::detach(&head);

        insert_unprocessed_declarations(&document, &["garbage}".to_string()], &[]);
        assert!(document.elements_by_tag("style").is_empty());
    }

    #[test]
    fn no_residual_element_when_nothing_is_left() {
        assert!(residual_style_element(&[], &[]).is_none());
    }
}
