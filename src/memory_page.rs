//! Headless page used to drive the controller without a browser.
//!
//! Elements live in an arena and keep their ids after removal; only elements
//! reachable from the document root are returned by queries. Selectors are
//! limited to comma separated compounds of `tag`, `#id` and `.class`.
//! Timers run on a virtual clock advanced explicitly by the caller.

use crate::view::{
    ElementId, ObserverOptions, Scheduler, ScrollBehavior, Task, TimerId, View, Viewport,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    inner_html: String,
    text: String,
    value: String,
    disabled: bool,
    offset_top: f64,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn matches(&self, compound: &str) -> bool {
        if compound.is_empty() || compound.contains(char::is_whitespace) {
            return false;
        }
        let tag_end = compound.find(['#', '.']).unwrap_or(compound.len());
        let (tag, mut rest) = compound.split_at(tag_end);
        if !tag.is_empty() && tag != "*" && !self.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let end = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..end];
            let ok = match marker {
                '#' => self.attributes.get("id").is_some_and(|id| id == name),
                '.' => self.has_class(name),
                _ => false,
            };
            if !ok {
                return false;
            }
            rest = &body[end..];
        }
        true
    }
}

pub struct MemoryPage {
    nodes: Vec<Node>,
    root: ElementId,
    head: ElementId,
    body: ElementId,
    viewport: Viewport,
    scroll_y: f64,
    scrolls: Vec<(f64, ScrollBehavior)>,
    observed: BTreeSet<ElementId>,
    observer_options: Option<ObserverOptions>,
    now: Duration,
    timers: BTreeMap<TimerId, (Duration, Task)>,
    next_timer: u64,
}

impl MemoryPage {
    /// An empty `<html><head></head><body></body></html>` document.
    pub fn new(viewport: Viewport) -> Self {
        let mut page = Self {
            nodes: vec![Node::new("html")],
            root: ElementId::new(0),
            head: ElementId::new(0),
            body: ElementId::new(0),
            viewport,
            scroll_y: 0.0,
            scrolls: Vec::new(),
            observed: BTreeSet::new(),
            observer_options: None,
            now: Duration::ZERO,
            timers: BTreeMap::new(),
            next_timer: 0,
        };
        page.head = page.append(page.root, "head", &[]);
        page.body = page.append(page.root, "body", &[]);
        page
    }

    /// Create an element with `attrs` and attach it under `parent`.
    pub fn append(&mut self, parent: ElementId, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
        let id = self.alloc(tag);
        for (name, value) in attrs {
            self.set_attribute(id, name, value);
        }
        self.append_child(parent, id);
        id
    }

    pub fn body_id(&self) -> ElementId {
        self.body
    }

    fn alloc(&mut self, tag: &str) -> ElementId {
        self.nodes.push(Node::new(tag));
        ElementId::new(self.nodes.len() - 1)
    }

    fn node(&self, id: ElementId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.node_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|c| *c != id);
        }
    }

    /// Depth-first walk of the attached subtree under `from`, `from` included.
    fn descendants(&self, from: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn select(&self, selector: &str) -> impl Iterator<Item = ElementId> + '_ {
        let compounds: Vec<String> = selector.split(',').map(|s| s.trim().to_string()).collect();
        self.descendants(self.root).into_iter().filter(move |id| {
            self.node(*id)
                .is_some_and(|node| compounds.iter().any(|c| node.matches(c)))
        })
    }

    pub fn is_attached(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == self.root {
                return true;
            }
            current = self.node(cur).and_then(|n| n.parent);
        }
        false
    }

    pub fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.node(id).map(|n| n.children.clone()).unwrap_or_default()
    }

    pub fn count(&self, selector: &str) -> usize {
        self.select(selector).count()
    }

    pub fn style(&self, id: ElementId, property: &str) -> Option<&str> {
        self.node(id)?.style.get(property).map(String::as_str)
    }

    pub fn inner_html(&self, id: ElementId) -> &str {
        self.node(id).map(|n| n.inner_html.as_str()).unwrap_or_default()
    }

    pub fn is_disabled(&self, id: ElementId) -> bool {
        self.node(id).is_some_and(|n| n.disabled)
    }

    pub fn value(&self, id: ElementId) -> &str {
        self.node(id).map(|n| n.value.as_str()).unwrap_or_default()
    }

    pub fn set_value(&mut self, id: ElementId, value: &str) {
        if let Some(node) = self.node_mut(id) {
            node.value = value.to_string();
        }
    }

    pub fn set_offset_top(&mut self, id: ElementId, offset: f64) {
        if let Some(node) = self.node_mut(id) {
            node.offset_top = offset;
        }
    }

    pub fn set_scroll_y(&mut self, offset: f64) {
        self.scroll_y = offset;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Every `scroll_to` request received, oldest first.
    pub fn scrolls(&self) -> &[(f64, ScrollBehavior)] {
        &self.scrolls
    }

    pub fn is_observed(&self, id: ElementId) -> bool {
        self.observed.contains(&id)
    }

    pub fn observer_options(&self) -> Option<&ObserverOptions> {
        self.observer_options.as_ref()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Pop the earliest task due at or before `until`, moving the clock to it.
    pub fn pop_due(&mut self, until: Duration) -> Option<Task> {
        let (&id, &(due, _)) = self
            .timers
            .iter()
            .filter(|(_, (due, _))| *due <= until)
            .min_by_key(|(id, (due, _))| (*due, **id))?;
        let (_, task) = self.timers.remove(&id)?;
        self.now = self.now.max(due);
        Some(task)
    }

    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl View for MemoryPage {
    fn query(&self, selector: &str) -> Option<ElementId> {
        self.select(selector).next()
    }

    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        self.select(selector).collect()
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.descendants(self.root).into_iter().find(|el| {
            self.node(*el)
                .is_some_and(|n| n.attributes.get("id").is_some_and(|v| v == id))
        })
    }

    fn body(&self) -> Option<ElementId> {
        Some(self.body)
    }

    fn head(&self) -> Option<ElementId> {
        Some(self.head)
    }

    fn create_element(&mut self, tag: &str) -> Option<ElementId> {
        Some(self.alloc(tag))
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if self.node(parent).is_none() || self.node(child).is_none() || parent == child {
            return;
        }
        self.detach(child);
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn remove(&mut self, element: ElementId) {
        self.detach(element);
        self.observed.remove(&element);
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.node(element)?.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.attributes.insert(name.to_string(), value.to_string());
            if name == "value" {
                node.value = value.to_string();
            }
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element).is_some_and(|n| n.has_class(class))
    }

    fn set_class(&mut self, element: ElementId, class: &str, present: bool) {
        let Some(node) = self.node_mut(element) else {
            return;
        };
        let mut classes: Vec<String> = node
            .attributes
            .get("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let has = classes.iter().any(|c| c == class);
        if present && !has {
            classes.push(class.to_string());
        } else if !present && has {
            classes.retain(|c| c != class);
        }
        node.attributes.insert("class".to_string(), classes.join(" "));
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(node) = self.node_mut(element) {
            node.style.insert(property.to_string(), value.to_string());
        }
    }

    fn set_style_text(&mut self, element: ElementId, css: &str) {
        let Some(node) = self.node_mut(element) else {
            return;
        };
        node.style = css
            .split(';')
            .filter_map(|decl| decl.split_once(':'))
            .map(|(prop, value)| (prop.trim().to_string(), value.trim().to_string()))
            .filter(|(prop, _)| !prop.is_empty())
            .collect();
    }

    fn set_inner_html(&mut self, element: ElementId, html: &str) {
        if let Some(node) = self.node_mut(element) {
            node.inner_html = html.to_string();
            node.text.clear();
        }
    }

    fn text(&self, element: ElementId) -> String {
        self.node(element).map(|n| n.text.clone()).unwrap_or_default()
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(node) = self.node_mut(element) {
            node.text = text.to_string();
            node.inner_html.clear();
        }
    }

    fn set_disabled(&mut self, element: ElementId, disabled: bool) {
        if let Some(node) = self.node_mut(element) {
            node.disabled = disabled;
        }
    }

    fn offset_top(&self, element: ElementId) -> f64 {
        self.node(element).map(|n| n.offset_top).unwrap_or_default()
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        self.scroll_y = top.max(0.0);
        self.scrolls.push((top, behavior));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn field_value(&self, form: ElementId, name: &str) -> String {
        self.descendants(form)
            .into_iter()
            .filter_map(|id| self.node(id))
            .find(|n| n.attributes.get("name").is_some_and(|v| v == name))
            .map(|n| n.value.clone())
            .unwrap_or_default()
    }

    fn reset_form(&mut self, form: ElementId) {
        for id in self.descendants(form) {
            if let Some(node) = self.node_mut(id) {
                if node.attributes.contains_key("name") {
                    node.value = node.attributes.get("value").cloned().unwrap_or_default();
                }
            }
        }
    }

    fn observe(&mut self, element: ElementId, options: &ObserverOptions) {
        self.observer_options = Some(options.clone());
        self.observed.insert(element);
    }

    fn unobserve(&mut self, element: ElementId) {
        self.observed.remove(&element);
    }
}

impl Scheduler for MemoryPage {
    fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(id, (self.now + delay, task));
        id
    }

    fn cancel(&mut self, timer: TimerId) {
        self.timers.remove(&timer);
    }
}
