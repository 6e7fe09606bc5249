//! Writes a `dom_tree::Document` back out as HTML using html5ever's serializer.

use crate::dom::dom_tree::{Doctype, Document, Node};
use crate::error::InlineResult;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use std::io;

impl Serialize for Document {
    fn serialize<S>(&self, serializer: &mut S, _traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        if let Some(doctype) = &*self.doctype.borrow() {
            serializer.write_doctype(&doctype_text(doctype))?;
        }
        serialize_node(&self.root.borrow(), serializer)
    }
}

/// The text after `<!DOCTYPE `, public and system identifiers included.
fn doctype_text(doctype: &Doctype) -> String {
    match (doctype.public_id.is_empty(), doctype.system_id.is_empty()) {
        (true, true) => doctype.name.clone(),
        (true, false) => format!("{} SYSTEM \"{}\"", doctype.name, doctype.system_id),
        (false, true) => format!("{} PUBLIC \"{}\"", doctype.name, doctype.public_id),
        (false, false) => format!(
            "{} PUBLIC \"{}\" \"{}\"",
            doctype.name, doctype.public_id, doctype.system_id
        ),
    }
}

fn serialize_node<S: Serializer>(node: &Node, serializer: &mut S) -> io::Result<()> {
    match node {
        Node::DocumentRoot(root) => {
            for child in &root.children {
                serialize_node(&child.borrow(), serializer)?;
            }
        }
        Node::Element(elem) => {
            let attrs = elem
                .attributes
                .iter()
                .map(|(name, value)| (name, value.as_str()));
            serializer.start_elem(elem.qual_name.clone(), attrs)?;
            for child in &elem.children {
                serialize_node(&child.borrow(), serializer)?;
            }
            serializer.end_elem(elem.qual_name.clone())?;
        }
        Node::Text(text) => serializer.write_text(text)?,
        Node::Comment(text) => serializer.write_comment(text)?,
    }
    Ok(())
}

/// Serializes the whole document, DOCTYPE included, into an HTML string.
pub fn to_html(document: &Document) -> InlineResult<String> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut bytes, document, opts)?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_simple_document() {
        let html = "<!DOCTYPE html><html><head><title>t</title></head><body><p class=\"x\" id=\"y\">hi &amp; bye</p><!-- note --></body></html>";
        let document = create_dom_tree(html);
        assert_eq!(to_html(&document).unwrap(), html);

        let xhtml = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\"><html><head></head><body></body></html>";
        assert_eq!(to_html(&create_dom_tree(xhtml)).unwrap(), xhtml);

        let system = "<!DOCTYPE html SYSTEM \"about:legacy-compat\"><html><head></head><body></body></html>";
        assert_eq!(to_html(&create_dom_tree(system)).unwrap(), system);
    }

    #[test]
    fn style_contents_are_not_escaped() {
        let html = "<html><head><style>a > b { color: red }</style></head><body></body></html>";
        let document = create_dom_tree(html);
        assert_eq!(to_html(&document).unwrap(), html);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let document = create_dom_tree("<p>a<br>b</p>");
        assert_eq!(
            to_html(&document).unwrap(),
            "<html><head></head><body><p>a<br>b</p></body></html>"
        );
    }
}
