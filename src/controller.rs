use crate::banner::{ActiveBanner, Banner, BannerKind, BANNER_KEYFRAMES, EXIT_ANIMATION};
use crate::config::{Selectors, SiteConfig};
use crate::contact_form::{ContactMessage, FormState, Outbox, SimulatedOutbox, SUCCESS_MESSAGE};
use crate::memory_page::MemoryPage;
use crate::particle_system::{ParticleField, FLOAT_KEYFRAMES};
use crate::view::{ElementId, ObserverOptions, Scheduler, ScrollBehavior, Task, View};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::time::Duration;

const MENU_OPEN_ICON: &str = r#"<i class="fas fa-times"></i>"#;
const MENU_CLOSED_ICON: &str = r#"<i class="fas fa-bars"></i>"#;
const ACTIVE_CLASS: &str = "active";
const VISIBLE_CLASS: &str = "visible";

/// Everything the page can tell the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    NavLinkClicked(ElementId),
    Scrolled,
    BackToTopClicked,
    MenuToggleClicked,
    Resized,
    FormSubmitted,
    KeyPressed(String),
    SectionVisible(ElementId),
    Timer(Task),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavLink {
    pub element: ElementId,
    /// `href` starts with `#`; activation never leaves the page
    pub in_page: bool,
    pub target: Option<ElementId>,
}

/// Element references captured once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageElements {
    pub nav_links: Vec<NavLink>,
    pub header: Option<ElementId>,
    pub nav_menu: Option<ElementId>,
    pub menu_toggle: Option<ElementId>,
    pub back_to_top: Option<ElementId>,
    pub sections: Vec<ElementId>,
    pub contact_form: Option<ElementId>,
    pub submit_button: Option<ElementId>,
}

impl PageElements {
    pub fn capture(view: &impl View, selectors: &Selectors) -> Self {
        let nav_links = view
            .query_all(&selectors.nav_link)
            .into_iter()
            .map(|element| {
                let href = view.attribute(element, "href").unwrap_or_default();
                let in_page = href.starts_with('#');
                let target = match href.strip_prefix('#') {
                    Some(id) if !id.is_empty() => view.element_by_id(id),
                    _ => None,
                };
                NavLink {
                    element,
                    in_page,
                    target,
                }
            })
            .collect();

        Self {
            nav_links,
            header: view.query(&selectors.header),
            nav_menu: view.query(&selectors.nav_menu),
            menu_toggle: None,
            back_to_top: view.query(&selectors.back_to_top),
            sections: view.query_all(&selectors.section),
            contact_form: view.query(&selectors.contact_form),
            submit_button: view.query(&selectors.submit_button),
        }
    }

    pub fn nav_link(&self, element: ElementId) -> Option<&NavLink> {
        self.nav_links.iter().find(|l| l.element == element)
    }
}

struct PendingSubmission {
    message: ContactMessage,
    original_label: Option<String>,
}

/// Owns the UI state of the landing page and reacts to [`PageEvent`]s.
pub struct Controller<V> {
    view: V,
    config: SiteConfig,
    elements: PageElements,
    initialized: bool,
    menu_open: bool,
    revealed: HashSet<ElementId>,
    particles: ParticleField,
    banner: Option<ActiveBanner>,
    form_state: FormState,
    pending: Option<PendingSubmission>,
    outbox: Box<dyn Outbox>,
    rng: StdRng,
}

impl<V: View + Scheduler> Controller<V> {
    pub fn new(view: V, config: SiteConfig) -> Self {
        let particles = ParticleField::new(config.particles.clone());
        Self {
            view,
            config,
            elements: PageElements::default(),
            initialized: false,
            menu_open: false,
            revealed: HashSet::new(),
            particles,
            banner: None,
            form_state: FormState::Idle,
            pending: None,
            outbox: Box::new(SimulatedOutbox),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_outbox(mut self, outbox: Box<dyn Outbox>) -> Self {
        self.outbox = outbox;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Capture the page's elements and attach every behavior. Runs once.
    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        self.initialized = true;
        self.elements = PageElements::capture(&self.view, &self.config.selectors);

        debug!(
            "{} nav links, {} sections",
            self.elements.nav_links.len(),
            self.elements.sections.len()
        );
        if self.elements.back_to_top.is_none() {
            debug!("no back-to-top control; skipping");
        }
        if self.elements.contact_form.is_none() {
            debug!("no contact form; skipping");
        }

        self.observe_sections();
        self.create_menu_toggle();
        self.inject_style(FLOAT_KEYFRAMES);
        self.particles.regenerate(&mut self.view, &mut self.rng);
        self.inject_style(BANNER_KEYFRAMES);

        info!("landing page loaded");

        self.label_sections();
        self.apply_performance_hints();
    }

    pub fn handle(&mut self, event: PageEvent) {
        match event {
            PageEvent::NavLinkClicked(link) => self.follow_nav_link(link),
            PageEvent::Scrolled => self.update_back_to_top(),
            PageEvent::BackToTopClicked => {
                if self.elements.back_to_top.is_some() {
                    self.view.scroll_to(0.0, ScrollBehavior::Smooth);
                }
            }
            PageEvent::MenuToggleClicked => self.toggle_menu(),
            PageEvent::Resized => self.particles.regenerate(&mut self.view, &mut self.rng),
            PageEvent::FormSubmitted => self.submit_form(),
            PageEvent::KeyPressed(key) => {
                if key == "Escape" {
                    self.close_menu();
                }
            }
            PageEvent::SectionVisible(section) => self.reveal(section),
            PageEvent::Timer(task) => self.run_task(task),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn elements(&self) -> &PageElements {
        &self.elements
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn form_state(&self) -> FormState {
        self.form_state
    }

    pub fn particle_handles(&self) -> &[ElementId] {
        self.particles.handles()
    }

    pub fn banner(&self) -> Option<(ElementId, BannerKind)> {
        self.banner.map(|b| (b.element, b.kind))
    }

    fn inject_style(&mut self, css: &str) {
        let Some(head) = self.view.head() else {
            return;
        };
        if let Some(style) = self.view.create_element("style") {
            self.view.set_text(style, css);
            self.view.append_child(head, style);
        }
    }

    fn follow_nav_link(&mut self, element: ElementId) {
        let Some(link) = self.elements.nav_link(element) else {
            return;
        };
        if let Some(target) = link.target {
            let top = self.view.offset_top(target) - self.config.scroll.header_offset;
            self.view.scroll_to(top, ScrollBehavior::Smooth);
        }
        self.close_menu();
    }

    fn update_back_to_top(&mut self) {
        if let Some(button) = self.elements.back_to_top {
            let visible = self.view.scroll_y() > self.config.scroll.back_to_top_threshold;
            self.view.set_class(button, VISIBLE_CLASS, visible);
        }
    }

    fn observe_sections(&mut self) {
        let options = ObserverOptions {
            threshold: self.config.reveal.threshold,
            root_margin: self.config.reveal.root_margin(),
        };
        for section in &self.elements.sections {
            self.view.observe(*section, &options);
        }
    }

    fn reveal(&mut self, section: ElementId) {
        if !self.revealed.insert(section) {
            return;
        }
        self.view.set_style(section, "animation", &self.config.reveal.animation);
        self.view.unobserve(section);
    }

    fn create_menu_toggle(&mut self) {
        let (Some(header), Some(_)) = (self.elements.header, self.elements.nav_menu) else {
            debug!("header or nav menu missing; no mobile toggle");
            return;
        };
        let Some(toggle) = self.view.create_element("button") else {
            warn!("failed to create mobile toggle");
            return;
        };
        self.view.set_attribute(toggle, "class", "mobile-toggle");
        self.view.set_inner_html(toggle, MENU_CLOSED_ICON);
        self.view.set_attribute(toggle, "aria-label", "Toggle navigation");
        self.view.append_child(header, toggle);
        self.elements.menu_toggle = Some(toggle);
    }

    fn toggle_menu(&mut self) {
        self.set_menu_open(!self.menu_open);
    }

    fn close_menu(&mut self) {
        self.set_menu_open(false);
    }

    /// Menu panel, toggle class and icon always change together.
    fn set_menu_open(&mut self, open: bool) {
        let (Some(toggle), Some(menu)) = (self.elements.menu_toggle, self.elements.nav_menu) else {
            return;
        };
        self.menu_open = open;
        self.view.set_class(menu, ACTIVE_CLASS, open);
        self.view.set_class(toggle, ACTIVE_CLASS, open);
        let icon = if open { MENU_OPEN_ICON } else { MENU_CLOSED_ICON };
        self.view.set_inner_html(toggle, icon);
    }

    fn label_sections(&mut self) {
        for (index, section) in self.elements.sections.iter().enumerate() {
            let label = self
                .view
                .attribute(*section, "id")
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("section-{index}"));
            self.view.set_attribute(*section, "role", "region");
            self.view.set_attribute(*section, "aria-label", &label);
        }
    }

    fn apply_performance_hints(&mut self) {
        for image in self.view.query_all(&self.config.selectors.image) {
            if self.view.attribute(image, "loading").as_deref() != Some("lazy") {
                self.view.set_attribute(image, "loading", "lazy");
            }
        }
        for card in self.view.query_all(&self.config.selectors.animated_cards) {
            self.view.set_style(card, "will-change", "transform");
        }
    }

    fn submit_form(&mut self) {
        let Some(form) = self.elements.contact_form else {
            return;
        };
        if self.pending.is_some() {
            debug!("submission already in flight; ignoring");
            return;
        }

        self.form_state = FormState::Validating;
        let view = &self.view;
        let message = ContactMessage::from_fields(|field| view.field_value(form, field.name()));

        if let Err(err) = message.validate() {
            debug!("contact form rejected: {err:?}");
            self.form_state = FormState::Error;
            self.show_banner(BannerKind::Error, err.to_string());
            return;
        }

        let original_label = self.elements.submit_button.map(|button| {
            let label = self.view.text(button);
            self.view.set_text(button, &self.config.contact.pending_label);
            self.view.set_disabled(button, true);
            label
        });
        self.view.schedule(self.config.contact.submit_delay(), Task::SubmitComplete);
        self.pending = Some(PendingSubmission {
            message,
            original_label,
        });
        self.form_state = FormState::Submitting;
    }

    fn finish_submission(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let result = self.outbox.deliver(&pending.message);

        match result {
            Ok(()) => {
                self.show_banner(BannerKind::Success, SUCCESS_MESSAGE.to_string());
                if let Some(form) = self.elements.contact_form {
                    self.view.reset_form(form);
                }
                self.form_state = FormState::Success;
            }
            Err(err) => {
                warn!("contact message not delivered: {err:?}");
                self.show_banner(BannerKind::Error, err.to_string());
                self.form_state = FormState::Error;
            }
        }

        if let Some(button) = self.elements.submit_button {
            if let Some(label) = &pending.original_label {
                self.view.set_text(button, label);
            }
            self.view.set_disabled(button, false);
        }
    }

    /// Replaces whatever banner is showing; at most one exists at a time.
    fn show_banner(&mut self, kind: BannerKind, message: String) {
        self.dismiss_banner();

        let Some(body) = self.view.body() else {
            return;
        };
        let Some(element) = self.view.create_element("div") else {
            warn!("failed to create banner element");
            return;
        };
        let banner = Banner::new(kind, message);
        self.view.set_attribute(element, "class", &banner.class_name());
        self.view.set_text(element, &banner.message);
        self.view.set_style_text(element, &banner.css_text());
        self.view.append_child(body, element);

        let timer = self
            .view
            .schedule(self.config.banner.display(), Task::BannerSlideOut(element));
        self.banner = Some(ActiveBanner {
            element,
            kind,
            timer,
        });
    }

    fn dismiss_banner(&mut self) {
        if let Some(active) = self.banner.take() {
            self.view.cancel(active.timer);
            self.view.remove(active.element);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::SubmitComplete => self.finish_submission(),
            Task::BannerSlideOut(element) => {
                let exit = self.config.banner.exit();
                let Some(active) = self.banner.as_mut().filter(|b| b.element == element) else {
                    return;
                };
                self.view.set_style(element, "animation", EXIT_ANIMATION);
                active.timer = self.view.schedule(exit, Task::BannerRemove(element));
            }
            Task::BannerRemove(element) => {
                if self.banner.is_some_and(|b| b.element == element) {
                    self.banner = None;
                    self.view.remove(element);
                }
            }
        }
    }
}

impl Controller<MemoryPage> {
    /// Move the virtual clock forward, delivering every timer that falls due.
    pub fn advance(&mut self, by: Duration) {
        let until = self.view.now() + by;
        while let Some(task) = self.view.pop_due(until) {
            self.handle(PageEvent::Timer(task));
        }
        self.view.advance_to(until);
    }
}
