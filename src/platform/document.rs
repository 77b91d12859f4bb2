//! In-memory page used by tests and host-driven embeddings.
//!
//! Elements live in an arena indexed by [`ElementId`]; removed elements keep
//! their slot so stale handles are detected instead of aliasing new nodes.
//! Layout is not computed: the host assigns each element's document offset
//! and height with [`Document::set_layout`].

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html};

use super::dom::{Dom, DomError, DomResult, ElementId, ScrollBehavior, Viewport};
use super::selector::{Selector, SelectorSubject};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LayoutBox {
    top: f64,
    height: f64,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    text: String,
    value: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    layout: LayoutBox,
    removed: bool,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            styles: Vec::new(),
            text: String::new(),
            value: String::new(),
            parent: None,
            children: Vec::new(),
            layout: LayoutBox::default(),
            removed: false,
        }
    }

    fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn put_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attr("class").unwrap_or_default().split_whitespace()
    }
}

impl SelectorSubject for Node {
    fn local_name(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.get_attr(name)
    }
}

/// Arena-backed [`Dom`] + [`Viewport`] implementation.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: ElementId,
    body: ElementId,
    scroll_y: f64,
    width: f64,
    height: f64,
    last_scroll_request: Option<(f64, ScrollBehavior)>,
}

impl Document {
    /// Empty `<html><head></head><body></body></html>` with the given viewport size.
    pub fn new(width: f64, height: f64) -> Self {
        let mut doc = Self {
            nodes: vec![Node::new("html")],
            root: ElementId(0),
            body: ElementId(0),
            scroll_y: 0.0,
            width,
            height,
            last_scroll_request: None,
        };
        let head = doc.alloc(Node::new("head"));
        let body = doc.alloc(Node::new("body"));
        doc.attach(doc.root, head);
        doc.attach(doc.root, body);
        doc.body = body;
        doc
    }

    /// Build a document from HTML markup.
    pub fn parse_html(markup: &str, width: f64, height: f64) -> DomResult<Self> {
        let html = Html::parse_document(markup);
        if !html.errors.is_empty() {
            log::debug!("html parser recovered from {} error(s)", html.errors.len());
        }

        let mut doc = Self::new(width, height);
        let root_ref = html.root_element();
        copy_attrs(&mut doc.nodes[doc.root.0], root_ref);

        let mut saw_body = false;
        for child in root_ref.children() {
            let Some(child_ref) = ElementRef::wrap(child) else {
                continue;
            };
            match child_ref.value().name() {
                "body" => {
                    saw_body = true;
                    let body = doc.body;
                    copy_attrs(&mut doc.nodes[body.0], child_ref);
                    doc.import_children(body, child_ref);
                }
                "head" => {}
                _ => {
                    let imported = doc.import(child_ref);
                    doc.attach(doc.body, imported);
                }
            }
        }

        if !saw_body {
            return Err(DomError::Markup("document has no <body>".into()));
        }

        Ok(doc)
    }

    fn import(&mut self, source: ElementRef<'_>) -> ElementId {
        let mut node = Node::new(source.value().name());
        copy_attrs(&mut node, source);
        let id = self.alloc(node);
        self.import_children(id, source);
        id
    }

    fn import_children(&mut self, parent: ElementId, source: ElementRef<'_>) {
        for child in source.children() {
            if let Some(child_ref) = ElementRef::wrap(child) {
                let imported = self.import(child_ref);
                self.attach(parent, imported);
            } else if let Some(text) = child.value().as_text() {
                let content: &str = text;
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    let node = &mut self.nodes[parent.0];
                    if !node.text.is_empty() {
                        node.text.push(' ');
                    }
                    node.text.push_str(trimmed);
                }
            }
        }

        match self.nodes[parent.0].tag.as_str() {
            "textarea" => {
                let node = &mut self.nodes[parent.0];
                node.value = node.text.clone();
            }
            "select" => {
                let value = self.initial_selection(parent);
                self.nodes[parent.0].value = value;
            }
            _ => {}
        }
    }

    /// Value of the `selected` option of a select, else of its first option.
    fn initial_selection(&self, select: ElementId) -> String {
        let mut options = Vec::new();
        let mut stack = vec![select];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.tag == "option" {
                options.push(id);
                continue;
            }
            stack.extend(node.children.iter().rev().copied());
        }

        let chosen = options
            .iter()
            .copied()
            .find(|id| self.nodes[id.0].get_attr("selected").is_some())
            .or_else(|| options.first().copied());
        match chosen {
            Some(option) => {
                let node = &self.nodes[option.0];
                node.get_attr("value").unwrap_or(&node.text).to_string()
            }
            None => String::new(),
        }
    }

    fn alloc(&mut self, node: Node) -> ElementId {
        let id = ElementId(self.nodes.len());
        let mut node = node;
        if let Some(value) = node.get_attr("value") {
            node.value = value.to_string();
        }
        self.nodes.push(node);
        id
    }

    fn attach(&mut self, parent: ElementId, child: ElementId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, child: ElementId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0].children.retain(|id| *id != child);
        }
    }

    fn node(&self, id: ElementId) -> DomResult<&Node> {
        self.nodes
            .get(id.0)
            .filter(|node| !node.removed)
            .ok_or(DomError::StaleElement(id))
    }

    fn node_mut(&mut self, id: ElementId) -> DomResult<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .filter(|node| !node.removed)
            .ok_or(DomError::StaleElement(id))
    }

    fn walk(&self, from: ElementId, out: &mut Vec<ElementId>) {
        out.push(from);
        for child in &self.nodes[from.0].children {
            self.walk(*child, out);
        }
    }

    fn descendants(&self, from: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.walk(from, &mut out);
        out
    }

    /// Assign the element's document offset and height.
    pub fn set_layout(&mut self, element: ElementId, top: f64, height: f64) -> DomResult<()> {
        self.node_mut(element)?.layout = LayoutBox { top, height };
        Ok(())
    }

    /// Host-side scroll (user scrolling, overscroll bounce). Not clamped.
    pub fn set_scroll_y(&mut self, scroll_y: f64) {
        self.scroll_y = scroll_y;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Most recent programmatic scroll issued through [`Viewport::scroll_to`].
    pub fn last_scroll_request(&self) -> Option<(f64, ScrollBehavior)> {
        self.last_scroll_request
    }

    /// Serialize the connected tree.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(self.root, &mut out);
        out
    }

    fn write_html(&self, id: ElementId, out: &mut String) {
        let node = &self.nodes[id.0];
        out.push('<');
        out.push_str(&node.tag);
        for (name, value) in &node.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&encode_double_quoted_attribute(value));
            out.push('"');
        }
        if !node.styles.is_empty() {
            let inline: Vec<String> = node
                .styles
                .iter()
                .map(|(property, value)| format!("{property}: {value}"))
                .collect();
            out.push_str(" style=\"");
            out.push_str(&encode_double_quoted_attribute(&inline.join("; ")));
            out.push('"');
        }
        out.push('>');
        if VOID_TAGS.contains(&node.tag.as_str()) {
            return;
        }
        out.push_str(&encode_text(&node.text));
        for child in &node.children {
            self.write_html(*child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }
}

fn copy_attrs(node: &mut Node, source: ElementRef<'_>) {
    for (name, value) in source.value().attrs() {
        node.put_attr(&name.to_ascii_lowercase(), value);
    }
}

impl Dom for Document {
    fn body(&self) -> ElementId {
        self.body
    }

    fn query_all(&self, selector: &Selector) -> Vec<ElementId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| selector.matches(&self.nodes[id.0]))
            .collect()
    }

    fn query_within(&self, root: ElementId, selector: &Selector) -> DomResult<Vec<ElementId>> {
        self.node(root)?;
        Ok(self
            .descendants(root)
            .into_iter()
            .skip(1)
            .filter(|id| selector.matches(&self.nodes[id.0]))
            .collect())
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        if id.is_empty() {
            return None;
        }
        self.descendants(self.root)
            .into_iter()
            .find(|candidate| self.nodes[candidate.0].get_attr("id") == Some(id))
    }

    fn closest(&self, element: ElementId, selector: &Selector) -> DomResult<Option<ElementId>> {
        let mut cursor = Some(element);
        self.node(element)?;
        while let Some(current) = cursor {
            let node = &self.nodes[current.0];
            if selector.matches(node) {
                return Ok(Some(current));
            }
            cursor = node.parent;
        }
        Ok(None)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current.0).and_then(|n| n.parent);
        }
        false
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.node(element).is_ok() && self.contains(self.root, element)
    }

    fn tag_name(&self, element: ElementId) -> DomResult<String> {
        Ok(self.node(element)?.tag.clone())
    }

    fn attr(&self, element: ElementId, name: &str) -> DomResult<Option<String>> {
        Ok(self.node(element)?.get_attr(name).map(str::to_string))
    }

    fn set_attr(&mut self, element: ElementId, name: &str, value: &str) -> DomResult<()> {
        let node = self.node_mut(element)?;
        node.put_attr(&name.to_ascii_lowercase(), value);
        Ok(())
    }

    fn remove_attr(&mut self, element: ElementId, name: &str) -> DomResult<()> {
        let name = name.to_ascii_lowercase();
        self.node_mut(element)?.attrs.retain(|(key, _)| *key != name);
        Ok(())
    }

    fn has_class(&self, element: ElementId, class: &str) -> DomResult<bool> {
        Ok(self.node(element)?.classes().any(|have| have == class))
    }

    fn add_class(&mut self, element: ElementId, class: &str) -> DomResult<()> {
        let node = self.node_mut(element)?;
        if node.classes().any(|have| have == class) {
            return Ok(());
        }
        let mut classes: Vec<String> = node.classes().map(str::to_string).collect();
        classes.push(class.to_string());
        node.put_attr("class", &classes.join(" "));
        Ok(())
    }

    fn remove_class(&mut self, element: ElementId, class: &str) -> DomResult<()> {
        let node = self.node_mut(element)?;
        if !node.classes().any(|have| have == class) {
            return Ok(());
        }
        let classes: Vec<String> = node
            .classes()
            .filter(|have| *have != class)
            .map(str::to_string)
            .collect();
        node.put_attr("class", &classes.join(" "));
        Ok(())
    }

    fn style(&self, element: ElementId, property: &str) -> DomResult<Option<String>> {
        Ok(self
            .node(element)?
            .styles
            .iter()
            .find(|(key, _)| key == property)
            .map(|(_, value)| value.clone()))
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> DomResult<()> {
        let node = self.node_mut(element)?;
        node.styles.retain(|(key, _)| key != property);
        if !value.is_empty() {
            node.styles.push((property.to_string(), value.to_string()));
        }
        Ok(())
    }

    fn text(&self, element: ElementId) -> DomResult<String> {
        let node = self.node(element)?;
        let mut text = node.text.clone();
        for child in &node.children {
            let child_text = self.text(*child)?;
            if !child_text.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&child_text);
            }
        }
        Ok(text)
    }

    fn set_text(&mut self, element: ElementId, text: &str) -> DomResult<()> {
        let children = std::mem::take(&mut self.node_mut(element)?.children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        self.nodes[element.0].text = text.to_string();
        Ok(())
    }

    fn value(&self, element: ElementId) -> DomResult<String> {
        Ok(self.node(element)?.value.clone())
    }

    fn set_value(&mut self, element: ElementId, value: &str) -> DomResult<()> {
        self.node_mut(element)?.value = value.to_string();
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> ElementId {
        self.alloc(Node::new(tag))
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> DomResult<()> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root || self.contains(child, parent) {
            return Err(DomError::InvalidOperation(format!(
                "appending {child} under {parent} would create a cycle"
            )));
        }
        if VOID_TAGS.contains(&self.nodes[parent.0].tag.as_str()) {
            return Err(DomError::InvalidOperation(format!(
                "<{}> cannot have children",
                self.nodes[parent.0].tag
            )));
        }
        self.detach(child);
        self.attach(parent, child);
        Ok(())
    }

    fn insert_after(&mut self, reference: ElementId, node: ElementId) -> DomResult<()> {
        self.node(node)?;
        let parent = self.node(reference)?.parent.ok_or_else(|| {
            DomError::InvalidOperation(format!("{reference} has no parent to insert into"))
        })?;
        if node == self.root || self.contains(node, parent) {
            return Err(DomError::InvalidOperation(format!(
                "inserting {node} after {reference} would create a cycle"
            )));
        }
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let position = siblings
            .iter()
            .position(|id| *id == reference)
            .map_or(siblings.len(), |index| index + 1);
        siblings.insert(position, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    fn remove(&mut self, element: ElementId) -> DomResult<()> {
        self.node(element)?;
        if element == self.root || element == self.body {
            return Err(DomError::InvalidOperation(format!(
                "refusing to remove structural element {element}"
            )));
        }
        self.detach(element);
        for id in self.descendants(element) {
            self.nodes[id.0].removed = true;
        }
        Ok(())
    }

    fn offset_top(&self, element: ElementId) -> DomResult<f64> {
        Ok(self.node(element)?.layout.top)
    }

    fn offset_height(&self, element: ElementId) -> DomResult<f64> {
        Ok(self.node(element)?.layout.height)
    }
}

impl Viewport for Document {
    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn inner_width(&self) -> f64 {
        self.width
    }

    fn inner_height(&self) -> f64 {
        self.height
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        let top = top.max(0.0);
        self.scroll_y = top;
        self.last_scroll_request = Some((top, behavior));
    }
}
