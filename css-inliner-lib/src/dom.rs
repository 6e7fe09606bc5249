use html5ever::{LocalName, Namespace, QualName};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;

    pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

    pub type Handle = Rc<RefCell<Node>>;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
        Comment(String),
    }

    #[derive(Debug, Clone, Default)]
    pub struct DocumentRootNode {
        pub children: Vec<Handle>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        /// Attributes in source order; serialization writes them back in this order.
        pub attributes: Vec<(QualName, String)>,
        pub children: Vec<Handle>,
        pub parent: Option<Weak<RefCell<Node>>>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: Handle,
        pub doctype: RefCell<Option<Doctype>>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: Vec::new(),
                children: Vec::new(),
                parent: None,
            }
        }

        /// Creates an element in the HTML namespace, e.g. a fresh `<style>`.
        pub fn html(tag: &str) -> Self {
            let qual_name = QualName::new(
                None,
                Namespace::from(HTML_NAMESPACE),
                LocalName::from(tag),
            );
            ElementNode::new(tag.to_string(), qual_name)
        }

        pub fn get_attribute(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(key, _)| &*key.local == name)
                .map(|(_, value)| value.as_str())
        }

        /// Returns the attribute as a sequence of tokens.
        ///
        /// Absent and empty attributes both yield no tokens; a single string value
        /// yields one token. Callers never have to branch on how the value is held.
        pub fn attribute_tokens(&self, name: &str) -> Vec<String> {
            match self.get_attribute(name) {
                Some(value) if !value.is_empty() => vec![value.to_string()],
                _ => Vec::new(),
            }
        }

        /// Replaces the value in place, or appends a new attribute at the end.
        pub fn set_attribute(&mut self, name: &str, value: String) {
            if let Some((_, existing)) = self
                .attributes
                .iter_mut()
                .find(|(key, _)| &*key.local == name)
            {
                *existing = value;
                return;
            }
            let key = QualName::new(None, Namespace::from(""), LocalName::from(name));
            self.attributes.push((key, value));
        }

        pub fn has_class(&self, class_name: &str) -> bool {
            self.get_attribute("class")
                .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
        }

        /// Concatenated text of the direct text children.
        pub fn text_content(&self) -> String {
            let mut text = String::new();
            for child in &self.children {
                if let Node::Text(chunk) = &*child.borrow() {
                    text.push_str(chunk);
                }
            }
            text
        }
    }

    impl Node {
        pub fn children(&self) -> &[Handle] {
            match self {
                Node::DocumentRoot(root) => &root.children,
                Node::Element(elem) => &elem.children,
                Node::Text(_) | Node::Comment(_) => &[],
            }
        }

        pub fn children_mut(&mut self) -> Option<&mut Vec<Handle>> {
            match self {
                Node::DocumentRoot(root) => Some(&mut root.children),
                Node::Element(elem) => Some(&mut elem.children),
                Node::Text(_) | Node::Comment(_) => None,
            }
        }

        pub fn as_element(&self) -> Option<&ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn is_element_named(&self, tag: &str) -> bool {
            self.as_element()
                .is_some_and(|elem| elem.tag.eq_ignore_ascii_case(tag))
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
        }
    }

    /// Parent of an element. Text and comment nodes do not track their parent.
    pub fn parent_of(node: &Handle) -> Option<Handle> {
        node.borrow()
            .as_element()
            .and_then(|elem| elem.parent.as_ref())
            .and_then(Weak::upgrade)
    }

    /// Appends `child` as the last child of `parent`, recording the parent pointer.
    pub fn append_child(parent: &Handle, child: Handle) {
        if let Some(elem) = child.borrow_mut().as_element_mut() {
            elem.parent = Some(Rc::downgrade(parent));
        }
        if let Some(children) = parent.borrow_mut().children_mut() {
            children.push(child);
        }
    }

    /// Detaches an element from its parent. Returns false when it had none.
    pub fn detach(node: &Handle) -> bool {
        let Some(parent) = parent_of(node) else {
            return false;
        };
        if let Some(children) = parent.borrow_mut().children_mut() {
            children.retain(|child| !Rc::ptr_eq(child, node));
        }
        if let Some(elem) = node.borrow_mut().as_element_mut() {
            elem.parent = None;
        }
        true
    }

    impl Document {
        /// All elements in document (pre-)order.
        pub fn elements(&self) -> Vec<Handle> {
            let mut found = Vec::new();
            collect_elements(&self.root, &mut found);
            found
        }

        /// Every element with the given tag name, in document order.
        pub fn elements_by_tag(&self, tag: &str) -> Vec<Handle> {
            self.elements()
                .into_iter()
                .filter(|node| node.borrow().is_element_named(tag))
                .collect()
        }

        pub fn head(&self) -> Option<Handle> {
            self.elements_by_tag("head").into_iter().next()
        }
    }

    fn collect_elements(node: &Handle, found: &mut Vec<Handle>) {
        if matches!(*node.borrow(), Node::Element(_)) {
            found.push(Rc::clone(node));
        }
        for child in node.borrow().children() {
            collect_elements(child, found);
        }
    }
}
