//! Seams between the page behaviors and whatever renders the page.
//!
//! The controller never touches the DOM directly. It talks to a [`View`] for
//! element lookup and mutation and to a [`Scheduler`] for delayed work, so the
//! same logic runs against the browser (`DomView`, wasm32 only) and against
//! the headless [`MemoryPage`](crate::memory_page::MemoryPage).

use std::time::Duration;

/// Opaque handle to an element owned by a [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Visible area of the page in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Options handed to the intersection observer watching page sections.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the element that must be visible (0.0-1.0)
    pub threshold: f64,
    /// CSS margin string applied to the root, e.g. `0px 0px -50px 0px`
    pub root_margin: String,
}

/// DOM access used by the page behaviors.
///
/// Mutating calls on elements that no longer exist are silently ignored;
/// every behavior treats a missing element as "nothing to do".
pub trait View {
    /// First element matching `selector`, in document order.
    fn query(&self, selector: &str) -> Option<ElementId>;
    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementId>;
    /// Element whose `id` attribute equals `id` exactly, with no selector
    /// parsing (`talk.2024` and `2024` are valid ids).
    fn element_by_id(&self, id: &str) -> Option<ElementId>;
    fn body(&self) -> Option<ElementId>;
    fn head(&self) -> Option<ElementId>;

    /// Create a detached element; it joins the page once appended.
    fn create_element(&mut self, tag: &str) -> Option<ElementId>;
    fn append_child(&mut self, parent: ElementId, child: ElementId);
    fn remove(&mut self, element: ElementId);

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);
    fn has_class(&self, element: ElementId, class: &str) -> bool;
    fn set_class(&mut self, element: ElementId, class: &str, present: bool);

    fn set_style(&mut self, element: ElementId, property: &str, value: &str);
    /// Replace the whole inline style (`cssText`).
    fn set_style_text(&mut self, element: ElementId, css: &str);
    fn set_inner_html(&mut self, element: ElementId, html: &str);
    fn text(&self, element: ElementId) -> String;
    fn set_text(&mut self, element: ElementId, text: &str);
    fn set_disabled(&mut self, element: ElementId, disabled: bool);

    /// Vertical offset of the element from the top of the document.
    fn offset_top(&self, element: ElementId) -> f64;
    /// Current vertical scroll offset of the page.
    fn scroll_y(&self) -> f64;
    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);
    fn viewport(&self) -> Viewport;

    /// Value of the named field inside `form`; empty when absent.
    fn field_value(&self, form: ElementId, name: &str) -> String;
    fn reset_form(&mut self, form: ElementId);

    /// Start reporting when `element` intersects the viewport.
    fn observe(&mut self, element: ElementId, options: &ObserverOptions);
    fn unobserve(&mut self, element: ElementId);
}

/// Identifies a scheduled task so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Deferred work the controller asks to be woken up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Start the exit animation of the banner
    BannerSlideOut(ElementId),
    /// Take the banner off the page
    BannerRemove(ElementId),
    /// The simulated send delay elapsed
    SubmitComplete,
}

/// Runs [`Task`]s after a delay by feeding them back as
/// [`PageEvent::Timer`](crate::controller::PageEvent::Timer).
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, task: Task) -> TimerId;
    /// Cancelling an unknown or already fired timer is a no-op.
    fn cancel(&mut self, timer: TimerId);
}
