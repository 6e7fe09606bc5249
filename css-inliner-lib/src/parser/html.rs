//! This module builds the crate's DOM tree from HTML text.
//!
//! It uses html5ever as the HTML parser and fills the tree defined in
//! `crate::dom::dom_tree` through a custom [`TreeSink`].

use crate::dom::dom_tree::{self, Handle, Node};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use log::debug;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

/// Creates a DOM tree from the provided HTML content.
///
/// # Arguments
///
/// * `html_content` - A string slice containing the HTML to parse.
///
/// # Returns
///
/// A `dom_tree::Document` representing the parsed HTML.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = InlinerTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// A custom TreeSink for building the DOM tree used by the inliner.
///
/// It holds the Document being built and the quirks mode reported by the parser.
pub struct InlinerTreeSink {
    document: dom_tree::Document,
    quirks_mode: RefCell<QuirksMode>,
}

impl InlinerTreeSink {
    /// Creates a new `InlinerTreeSink` with an empty document.
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }
}

impl Default for InlinerTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple implementation of the `ElemName` trait for our elements.
#[derive(Debug)]
pub struct InlinerElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for InlinerElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

fn new_text(text: &str) -> Handle {
    Rc::new(RefCell::new(Node::Text(text.to_string())))
}

/// Appends text to an existing text node. Returns false if `node` is not text.
fn merge_text(node: &Handle, text: &str) -> bool {
    match &mut *node.borrow_mut() {
        Node::Text(existing) => {
            existing.push_str(text);
            true
        }
        _ => false,
    }
}

fn set_parent(child: &Handle, parent: &Handle) {
    if let Some(elem) = child.borrow_mut().as_element_mut() {
        elem.parent = Some(Rc::downgrade(parent));
    }
}

impl TreeSink for InlinerTreeSink {
    type Handle = Handle;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = InlinerElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        debug!("html parsed in {:?} mode", self.quirks_mode.borrow());
        self.document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        debug!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            Node::Element(elem) => InlinerElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            // html5ever only asks for names of handles it created as elements.
            _ => InlinerElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let mut element = dom_tree::ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name, attr.value.to_string()))
            .collect();
        Rc::new(RefCell::new(Node::Element(element)))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(text.to_string())))
    }

    /// Processing instructions are not part of HTML; keep their text as a comment.
    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(format!("?{} {}", target, data))))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        match child {
            NodeOrText::AppendText(text) => {
                let last = parent.borrow().children().last().cloned();
                if let Some(last) = last {
                    if merge_text(&last, &text) {
                        return;
                    }
                }
                dom_tree::append_child(parent, new_text(&text));
            }
            NodeOrText::AppendNode(node) => {
                dom_tree::detach(&node);
                dom_tree::append_child(parent, node);
            }
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if dom_tree::parent_of(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    /// Inserts `child` right before `sibling` (foster parenting, misnested tables).
    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = dom_tree::parent_of(sibling) else {
            return;
        };
        let index = match parent
            .borrow()
            .children()
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
        {
            Some(index) => index,
            None => return,
        };

        let new_node = match child {
            NodeOrText::AppendText(text) => {
                let previous = index
                    .checked_sub(1)
                    .and_then(|i| parent.borrow().children().get(i).cloned());
                if let Some(previous) = previous {
                    if merge_text(&previous, &text) {
                        return;
                    }
                }
                new_text(&text)
            }
            NodeOrText::AppendNode(node) => {
                dom_tree::detach(&node);
                node
            }
        };

        set_parent(&new_node, &parent);
        let mut parent_borrow = parent.borrow_mut();
        if let Some(children) = parent_borrow.children_mut() {
            // The detach above may have shifted the sibling.
            let index = children
                .iter()
                .position(|c| Rc::ptr_eq(c, sibling))
                .unwrap_or(index.min(children.len()));
            children.insert(index, new_node);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let Some(elem) = target.borrow_mut().as_element_mut() {
            for attr in attrs {
                let exists = elem.attributes.iter().any(|(k, _)| *k == attr.name);
                if !exists {
                    elem.attributes.push((attr.name, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        dom_tree::detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let moved = match node.borrow_mut().children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        };
        for child in moved {
            dom_tree::append_child(new_parent, child);
        }
    }
}
