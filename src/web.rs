//! Browser binding: a [`View`] over web-sys and the wasm entry point.

use crate::config::{ConfigError, SiteConfig};
use crate::controller::{Controller, PageEvent};
use crate::registry::Registry;
use crate::view::{
    ElementId, ObserverOptions, Scheduler, ScrollBehavior, Task, TimerId, View, Viewport,
};
use log::{error, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, FormData, HtmlElement,
    HtmlFormElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    KeyboardEvent, ScrollToOptions, Window,
};

/// `<script type="application/json" id="site-config">` holding a [`SiteConfig`].
const CONFIG_ELEMENT_ID: &str = "site-config";

type Page = Controller<DomView>;

thread_local! {
    static PAGE: RefCell<Option<Rc<RefCell<Page>>>> = const { RefCell::new(None) };
}

/// Routes browser callbacks back into the controller.
#[derive(Clone, Default)]
struct Dispatcher(Rc<RefCell<Weak<RefCell<Page>>>>);

impl Dispatcher {
    fn bind(&self, page: &Rc<RefCell<Page>>) {
        *self.0.borrow_mut() = Rc::downgrade(page);
    }

    fn dispatch(&self, event: PageEvent) {
        let Some(page) = self.0.borrow().upgrade() else {
            return;
        };
        let borrowed = page.try_borrow_mut();
        match borrowed {
            Ok(mut page) => page.handle(event),
            Err(_) => warn!("controller busy; dropped {event:?}"),
        }
    }
}

/// Live element handles plus a reverse index keyed on JS object identity.
struct Handles {
    registry: Registry<Element>,
    index: js_sys::Map,
}

impl Handles {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            index: js_sys::Map::new(),
        }
    }

    fn lookup(&self, element: &Element) -> Option<ElementId> {
        self.index
            .get(element)
            .as_f64()
            .map(|raw| ElementId::new(raw as usize))
    }

    fn register(&mut self, element: Element) -> ElementId {
        match self.lookup(&element) {
            Some(id) => id,
            None => self.insert(element),
        }
    }

    /// Skips the index lookup; `element` must not be registered yet.
    fn insert(&mut self, element: Element) -> ElementId {
        let id = self.registry.insert(element.clone());
        self.index.set(&element, &JsValue::from_f64(id.index() as f64));
        id
    }

    fn release(&mut self, id: ElementId) -> Option<Element> {
        let element = self.registry.release(id)?;
        self.index.delete(&element);
        Some(element)
    }
}

pub struct DomView {
    window: Window,
    document: Document,
    handles: Rc<RefCell<Handles>>,
    observer: Option<IntersectionObserver>,
    timers: Rc<RefCell<HashMap<TimerId, i32>>>,
    next_timer: u64,
    dispatcher: Dispatcher,
}

impl DomView {
    fn new(window: Window, document: Document, dispatcher: Dispatcher) -> Self {
        Self {
            window,
            document,
            handles: Rc::new(RefCell::new(Handles::new())),
            observer: None,
            timers: Rc::new(RefCell::new(HashMap::new())),
            next_timer: 0,
            dispatcher,
        }
    }

    fn register(&self, element: Element) -> ElementId {
        self.handles.borrow_mut().register(element)
    }

    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.handles.borrow().registry.get(id).cloned()
    }

    fn html_element(&self, id: ElementId) -> Option<HtmlElement> {
        self.element(id)?.dyn_into::<HtmlElement>().ok()
    }

    /// One observer serves every section; created on first use.
    fn observer(&mut self, options: &ObserverOptions) -> Option<IntersectionObserver> {
        if let Some(observer) = &self.observer {
            return Some(observer.clone());
        }

        let handles = self.handles.clone();
        let dispatcher = self.dispatcher.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array)>::new(move |entries: js_sys::Array| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                    continue;
                };
                if !entry.is_intersecting() {
                    continue;
                }
                let target = entry.target();
                let id = handles.borrow().lookup(&target);
                if let Some(id) = id {
                    dispatcher.dispatch(PageEvent::SectionVisible(id));
                }
            }
        });

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);
        match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                callback.forget();
                self.observer = Some(observer.clone());
                Some(observer)
            }
            Err(err) => {
                warn!("intersection observer unavailable: {err:?}");
                None
            }
        }
    }
}

impl View for DomView {
    fn query(&self, selector: &str) -> Option<ElementId> {
        match self.document.query_selector(selector) {
            Ok(found) => found.map(|e| self.register(e)),
            Err(err) => {
                warn!("bad selector `{selector}`: {err:?}");
                None
            }
        }
    }

    fn element_by_id(&self, id: &str) -> Option<ElementId> {
        self.document.get_element_by_id(id).map(|e| self.register(e))
    }

    fn query_all(&self, selector: &str) -> Vec<ElementId> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                warn!("bad selector `{selector}`: {err:?}");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|e| self.register(e))
            .collect()
    }

    fn body(&self) -> Option<ElementId> {
        self.document.body().map(|b| self.register(b.into()))
    }

    fn head(&self) -> Option<ElementId> {
        self.query("head")
    }

    fn create_element(&mut self, tag: &str) -> Option<ElementId> {
        match self.document.create_element(tag) {
            Ok(element) => Some(self.handles.borrow_mut().insert(element)),
            Err(err) => {
                warn!("create_element({tag}) failed: {err:?}");
                None
            }
        }
    }

    fn append_child(&mut self, parent: ElementId, child: ElementId) {
        let (Some(parent), Some(child)) = (self.element(parent), self.element(child)) else {
            return;
        };
        if let Err(err) = parent.append_child(&child) {
            warn!("append_child failed: {err:?}");
        }
    }

    fn remove(&mut self, element: ElementId) {
        let released = self.handles.borrow_mut().release(element);
        if let Some(element) = released {
            if let Some(observer) = &self.observer {
                observer.unobserve(&element);
            }
            element.remove();
        }
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.element(element)?.get_attribute(name)
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) {
        if let Some(element) = self.element(element) {
            if let Err(err) = element.set_attribute(name, value) {
                warn!("set_attribute({name}) failed: {err:?}");
            }
        }
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.element(element)
            .is_some_and(|e| e.class_list().contains(class))
    }

    fn set_class(&mut self, element: ElementId, class: &str, present: bool) {
        if let Some(element) = self.element(element) {
            if let Err(err) = element.class_list().toggle_with_force(class, present) {
                warn!("class toggle `{class}` failed: {err:?}");
            }
        }
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) {
        if let Some(element) = self.html_element(element) {
            if let Err(err) = element.style().set_property(property, value) {
                warn!("style {property} failed: {err:?}");
            }
        }
    }

    fn set_style_text(&mut self, element: ElementId, css: &str) {
        if let Some(element) = self.html_element(element) {
            element.style().set_css_text(css);
        }
    }

    fn set_inner_html(&mut self, element: ElementId, html: &str) {
        if let Some(element) = self.element(element) {
            element.set_inner_html(html);
        }
    }

    fn text(&self, element: ElementId) -> String {
        self.element(element)
            .and_then(|e| e.text_content())
            .unwrap_or_default()
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(element) = self.element(element) {
            element.set_text_content(Some(text));
        }
    }

    fn set_disabled(&mut self, element: ElementId, disabled: bool) {
        let Some(element) = self.element(element) else {
            return;
        };
        let result = if disabled {
            element.set_attribute("disabled", "")
        } else {
            element.remove_attribute("disabled")
        };
        if let Err(err) = result {
            warn!("toggling disabled failed: {err:?}");
        }
    }

    fn offset_top(&self, element: ElementId) -> f64 {
        self.html_element(element)
            .map(|e| f64::from(e.offset_top()))
            .unwrap_or_default()
    }

    fn scroll_y(&self) -> f64 {
        self.window.scroll_y().unwrap_or_default()
    }

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
            ScrollBehavior::Instant => web_sys::ScrollBehavior::Instant,
        });
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn viewport(&self) -> Viewport {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
        };
        Viewport::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn field_value(&self, form: ElementId, name: &str) -> String {
        self.element(form)
            .and_then(|e| e.dyn_into::<HtmlFormElement>().ok())
            .and_then(|form| FormData::new_with_form(&form).ok())
            .and_then(|data| data.get(name).as_string())
            .unwrap_or_default()
    }

    fn reset_form(&mut self, form: ElementId) {
        if let Some(form) = self
            .element(form)
            .and_then(|e| e.dyn_into::<HtmlFormElement>().ok())
        {
            form.reset();
        }
    }

    fn observe(&mut self, element: ElementId, options: &ObserverOptions) {
        let Some(target) = self.element(element) else {
            return;
        };
        if let Some(observer) = self.observer(options) {
            observer.observe(&target);
        }
    }

    fn unobserve(&mut self, element: ElementId) {
        if let (Some(observer), Some(target)) = (&self.observer, self.element(element)) {
            observer.unobserve(&target);
        }
    }
}

impl Scheduler for DomView {
    fn schedule(&mut self, delay: Duration, task: Task) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;

        let timers = self.timers.clone();
        let dispatcher = self.dispatcher.clone();
        let callback = Closure::once_into_js(move || {
            timers.borrow_mut().remove(&id);
            dispatcher.dispatch(PageEvent::Timer(task));
        });
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
        {
            Ok(handle) => {
                self.timers.borrow_mut().insert(id, handle);
            }
            Err(err) => warn!("failed to schedule {task:?}: {err:?}"),
        }
        id
    }

    fn cancel(&mut self, timer: TimerId) {
        let handle = self.timers.borrow_mut().remove(&timer);
        if let Some(handle) = handle {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

fn load_config(document: &Document) -> Result<SiteConfig, ConfigError> {
    match document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|e| e.text_content())
    {
        Some(json) => SiteConfig::from_json(&json),
        None => Ok(SiteConfig::default()),
    }
}

fn listen(
    target: &EventTarget,
    kind: &str,
    dispatcher: &Dispatcher,
    to_event: impl Fn(&Event) -> Option<PageEvent> + 'static,
) -> Result<(), JsValue> {
    let dispatcher = dispatcher.clone();
    let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Some(page_event) = to_event(&event) {
            dispatcher.dispatch(page_event);
        }
    });
    target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    closure.forget();
    Ok(())
}

fn mount(window: Window, document: Document, config: SiteConfig) -> Result<(), JsValue> {
    let dispatcher = Dispatcher::default();
    let view = DomView::new(window.clone(), document.clone(), dispatcher.clone());
    let page = Rc::new(RefCell::new(Controller::new(view, config)));
    dispatcher.bind(&page);
    page.borrow_mut().init();

    {
        let controller = page.borrow();
        let elements = controller.elements();
        let view = controller.view();

        for link in &elements.nav_links {
            let Some(target) = view.element(link.element) else {
                continue;
            };
            let (element, in_page) = (link.element, link.in_page);
            listen(&target, "click", &dispatcher, move |event| {
                if in_page {
                    event.prevent_default();
                }
                Some(PageEvent::NavLinkClicked(element))
            })?;
        }
        if let Some(button) = elements.back_to_top.and_then(|id| view.element(id)) {
            listen(&button, "click", &dispatcher, |_| {
                Some(PageEvent::BackToTopClicked)
            })?;
        }
        if let Some(toggle) = elements.menu_toggle.and_then(|id| view.element(id)) {
            listen(&toggle, "click", &dispatcher, |_| {
                Some(PageEvent::MenuToggleClicked)
            })?;
        }
        if let Some(form) = elements.contact_form.and_then(|id| view.element(id)) {
            listen(&form, "submit", &dispatcher, |event| {
                event.prevent_default();
                Some(PageEvent::FormSubmitted)
            })?;
        }
    }

    listen(&window, "scroll", &dispatcher, |_| Some(PageEvent::Scrolled))?;
    listen(&window, "resize", &dispatcher, |_| Some(PageEvent::Resized))?;
    listen(&document, "keydown", &dispatcher, |event| {
        event
            .dyn_ref::<KeyboardEvent>()
            .map(|key| PageEvent::KeyPressed(key.key()))
    })?;

    PAGE.with(|slot| *slot.borrow_mut() = Some(page));
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("window has no document"))?;

    let loaded = load_config(&document);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    let level = config.log_level().unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    if let Err(err) = &loaded {
        warn!("{err}; falling back to defaults");
    }
    if let Err(err) = config.log_level() {
        warn!("{err}; logging at info");
    }

    if document.ready_state() == "loading" {
        let ready = document.clone();
        let on_ready = Closure::once_into_js(move || {
            if let Err(err) = mount(window, ready, config) {
                error!("failed to mount landing page: {err:?}");
            }
        });
        document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
    } else {
        mount(window, document, config)?;
    }
    Ok(())
}
