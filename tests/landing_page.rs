use phd_landing::banner::BannerKind;
use phd_landing::contact_form::{ContactMessage, Outbox, SubmitError};
use phd_landing::view::{ScrollBehavior, Task};
use phd_landing::{
    Controller, ElementId, FormState, MemoryPage, PageEvent, SiteConfig, View, Viewport,
};
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Fixture {
    header: ElementId,
    nav_menu: ElementId,
    about_link: ElementId,
    research_link: ElementId,
    missing_link: ElementId,
    cv_link: ElementId,
    back_to_top: ElementId,
    sections: Vec<ElementId>,
    form: ElementId,
    name: ElementId,
    email: ElementId,
    subject: ElementId,
    message: ElementId,
    submit: ElementId,
    eager_image: ElementId,
    lazy_image: ElementId,
    cards: Vec<ElementId>,
}

fn landing_page(width: f64) -> (MemoryPage, Fixture) {
    let mut page = MemoryPage::new(Viewport::new(width, 800.0));
    let body = page.body_id();

    let header = page.append(body, "header", &[("class", "header")]);
    let nav_menu = page.append(header, "ul", &[("class", "nav-menu")]);
    let about_link = page.append(nav_menu, "a", &[("class", "nav-link"), ("href", "#about")]);
    let research_link =
        page.append(nav_menu, "a", &[("class", "nav-link"), ("href", "#research")]);
    let missing_link = page.append(nav_menu, "a", &[("class", "nav-link"), ("href", "#talks")]);
    let cv_link = page.append(nav_menu, "a", &[("class", "nav-link"), ("href", "/cv.pdf")]);

    let about = page.append(body, "section", &[("id", "about"), ("class", "section")]);
    let research = page.append(body, "section", &[("id", "research"), ("class", "section")]);
    let unnamed = page.append(body, "section", &[("class", "section")]);
    page.set_offset_top(about, 600.0);
    page.set_offset_top(research, 1400.0);
    page.set_offset_top(unnamed, 2600.0);

    let eager_image = page.append(about, "img", &[("src", "portrait.jpg")]);
    let lazy_image = page.append(about, "img", &[("src", "lab.jpg"), ("loading", "lazy")]);
    let cards = vec![
        page.append(research, "div", &[("class", "research-card")]),
        page.append(research, "div", &[("class", "publication-card")]),
    ];

    let form = page.append(unnamed, "form", &[("id", "contact-form")]);
    let name = page.append(form, "input", &[("name", "name")]);
    let email = page.append(form, "input", &[("name", "email")]);
    let subject = page.append(form, "input", &[("name", "subject")]);
    let message = page.append(form, "textarea", &[("name", "message")]);
    let submit = page.append(form, "button", &[("class", "submit-btn"), ("type", "submit")]);
    page.set_text(submit, "Send Message");

    let back_to_top = page.append(body, "button", &[("id", "back-to-top")]);

    let fixture = Fixture {
        header,
        nav_menu,
        about_link,
        research_link,
        missing_link,
        cv_link,
        back_to_top,
        sections: vec![about, research, unnamed],
        form,
        name,
        email,
        subject,
        message,
        submit,
        eager_image,
        lazy_image,
        cards,
    };
    (page, fixture)
}

fn mounted(width: f64) -> (Controller<MemoryPage>, Fixture) {
    init_logging();
    let (page, fixture) = landing_page(width);
    let mut controller = Controller::new(page, SiteConfig::default()).with_seed(42);
    controller.init();
    (controller, fixture)
}

fn fill(controller: &mut Controller<MemoryPage>, f: &Fixture, values: [&str; 4]) {
    let page = controller.view_mut();
    page.set_value(f.name, values[0]);
    page.set_value(f.email, values[1]);
    page.set_value(f.subject, values[2]);
    page.set_value(f.message, values[3]);
}

fn banners(controller: &Controller<MemoryPage>) -> Vec<ElementId> {
    controller.view().query_all(".form-message")
}

// Navigation

#[test]
fn test_nav_link_scrolls_below_fixed_header() {
    let (mut controller, f) = mounted(1280.0);

    controller.handle(PageEvent::NavLinkClicked(f.about_link));
    controller.handle(PageEvent::NavLinkClicked(f.research_link));

    assert_eq!(
        controller.view().scrolls(),
        &[(520.0, ScrollBehavior::Smooth), (1320.0, ScrollBehavior::Smooth)]
    );
}

#[test]
fn test_nav_link_reads_offset_at_click_time() {
    let (mut controller, f) = mounted(1280.0);
    controller.view_mut().set_offset_top(f.sections[0], 900.0);

    controller.handle(PageEvent::NavLinkClicked(f.about_link));
    assert_eq!(controller.view().scrolls(), &[(820.0, ScrollBehavior::Smooth)]);
}

#[test]
fn test_nav_link_to_missing_anchor_does_not_scroll() {
    let (mut controller, f) = mounted(1280.0);

    let link = controller.elements().nav_link(f.missing_link).unwrap();
    assert!(link.in_page);
    assert_eq!(link.target, None);

    controller.handle(PageEvent::NavLinkClicked(f.missing_link));
    assert!(controller.view().scrolls().is_empty());
}

#[test]
fn test_nav_link_resolves_ids_that_are_not_css_identifiers() {
    init_logging();
    let (mut page, _) = landing_page(1280.0);
    let body = page.body_id();
    let menu = page.query(".nav-menu").unwrap();
    let dotted = page.append(menu, "a", &[("class", "nav-link"), ("href", "#talk.2024")]);
    let numeric = page.append(menu, "a", &[("class", "nav-link"), ("href", "#2024")]);
    let talk = page.append(body, "section", &[("id", "talk.2024")]);
    let year = page.append(body, "section", &[("id", "2024")]);
    page.set_offset_top(talk, 900.0);
    page.set_offset_top(year, 1800.0);

    let mut controller = Controller::new(page, SiteConfig::default()).with_seed(5);
    controller.init();
    assert_eq!(controller.elements().nav_link(dotted).unwrap().target, Some(talk));
    assert_eq!(controller.elements().nav_link(numeric).unwrap().target, Some(year));

    controller.handle(PageEvent::NavLinkClicked(dotted));
    controller.handle(PageEvent::NavLinkClicked(numeric));
    assert_eq!(
        controller.view().scrolls(),
        &[(820.0, ScrollBehavior::Smooth), (1720.0, ScrollBehavior::Smooth)]
    );
}

#[test]
fn test_external_link_is_not_intercepted() {
    let (mut controller, f) = mounted(1280.0);

    assert!(!controller.elements().nav_link(f.cv_link).unwrap().in_page);
    controller.handle(PageEvent::MenuToggleClicked);
    controller.handle(PageEvent::NavLinkClicked(f.cv_link));

    assert!(controller.view().scrolls().is_empty());
    assert!(!controller.is_menu_open());
}

#[test]
fn test_header_offset_comes_from_config() {
    init_logging();
    let (page, f) = landing_page(1280.0);
    let config = SiteConfig::from_json(r#"{ "scroll": { "header_offset": 64 } }"#).unwrap();
    let mut controller = Controller::new(page, config).with_seed(1);
    controller.init();

    controller.handle(PageEvent::NavLinkClicked(f.about_link));
    assert_eq!(controller.view().scrolls(), &[(536.0, ScrollBehavior::Smooth)]);
}

// Back to top

#[test]
fn test_back_to_top_visibility_threshold() {
    let (mut controller, f) = mounted(1280.0);

    let cases = [
        (0.0, false),
        (300.0, false),
        (301.0, true),
        (4000.0, true),
        (120.0, false),
    ];
    for (offset, visible) in cases {
        controller.view_mut().set_scroll_y(offset);
        controller.handle(PageEvent::Scrolled);
        assert_eq!(
            controller.view().has_class(f.back_to_top, "visible"),
            visible,
            "offset {offset}"
        );
    }
}

#[test]
fn test_back_to_top_scrolls_home() {
    let (mut controller, _) = mounted(1280.0);
    controller.view_mut().set_scroll_y(2000.0);

    controller.handle(PageEvent::BackToTopClicked);
    assert_eq!(controller.view().scrolls(), &[(0.0, ScrollBehavior::Smooth)]);
    assert_eq!(controller.view().scroll_y(), 0.0);
}

#[test]
fn test_page_without_optional_controls_is_quiet() {
    init_logging();
    let mut controller =
        Controller::new(MemoryPage::new(Viewport::new(640.0, 480.0)), SiteConfig::default())
            .with_seed(3);
    controller.init();

    controller.view_mut().set_scroll_y(1000.0);
    controller.handle(PageEvent::Scrolled);
    controller.handle(PageEvent::BackToTopClicked);
    controller.handle(PageEvent::MenuToggleClicked);
    controller.handle(PageEvent::KeyPressed("Escape".into()));
    controller.handle(PageEvent::FormSubmitted);

    assert!(controller.view().scrolls().is_empty());
    assert_eq!(controller.elements().menu_toggle, None);
    assert!(!controller.is_menu_open());
    assert_eq!(controller.form_state(), FormState::Idle);
    assert!(banners(&controller).is_empty());
}

// Reveal

#[test]
fn test_reveal_fires_once_per_section() {
    let (mut controller, f) = mounted(1280.0);
    let section = f.sections[1];
    assert!(controller.view().is_observed(section));

    controller.handle(PageEvent::SectionVisible(section));
    assert_eq!(
        controller.view().style(section, "animation"),
        Some("fadeInUp 0.8s ease forwards")
    );
    assert!(!controller.view().is_observed(section));

    controller.view_mut().set_style(section, "animation", "none");
    controller.handle(PageEvent::SectionVisible(section));
    assert_eq!(controller.view().style(section, "animation"), Some("none"));

    assert_eq!(controller.view().style(f.sections[0], "animation"), None);
    assert!(controller.view().is_observed(f.sections[0]));
}

// Mobile menu

#[test]
fn test_toggle_is_added_to_header() {
    let (controller, f) = mounted(1280.0);
    let toggle = controller.elements().menu_toggle.unwrap();
    let page = controller.view();

    assert!(page.children(f.header).contains(&toggle));
    assert!(page.has_class(toggle, "mobile-toggle"));
    assert_eq!(page.attribute(toggle, "aria-label").as_deref(), Some("Toggle navigation"));
    assert_eq!(page.inner_html(toggle), r#"<i class="fas fa-bars"></i>"#);
}

#[test]
fn test_toggle_twice_restores_menu() {
    let (mut controller, f) = mounted(1280.0);
    let toggle = controller.elements().menu_toggle.unwrap();

    controller.handle(PageEvent::MenuToggleClicked);
    assert!(controller.is_menu_open());
    assert!(controller.view().has_class(f.nav_menu, "active"));
    assert!(controller.view().has_class(toggle, "active"));
    assert_eq!(controller.view().inner_html(toggle), r#"<i class="fas fa-times"></i>"#);

    controller.handle(PageEvent::MenuToggleClicked);
    assert!(!controller.is_menu_open());
    assert!(!controller.view().has_class(f.nav_menu, "active"));
    assert!(!controller.view().has_class(toggle, "active"));
    assert_eq!(controller.view().inner_html(toggle), r#"<i class="fas fa-bars"></i>"#);
}

#[test]
fn test_nav_link_and_escape_close_menu() {
    let (mut controller, f) = mounted(1280.0);
    let toggle = controller.elements().menu_toggle.unwrap();

    controller.handle(PageEvent::MenuToggleClicked);
    controller.handle(PageEvent::NavLinkClicked(f.about_link));
    assert!(!controller.is_menu_open());
    assert!(!controller.view().has_class(f.nav_menu, "active"));
    assert_eq!(controller.view().inner_html(toggle), r#"<i class="fas fa-bars"></i>"#);

    controller.handle(PageEvent::MenuToggleClicked);
    controller.handle(PageEvent::KeyPressed("Enter".into()));
    assert!(controller.is_menu_open());

    controller.handle(PageEvent::KeyPressed("Escape".into()));
    assert!(!controller.is_menu_open());
    assert!(!controller.view().has_class(toggle, "active"));
    assert_eq!(controller.view().inner_html(toggle), r#"<i class="fas fa-bars"></i>"#);
}

// Particles

#[test]
fn test_particle_batch_sized_by_width() {
    let (controller, _) = mounted(1280.0);
    assert_eq!(controller.view().count(".particle"), 12);
    assert_eq!(controller.particle_handles().len(), 12);

    let (controller, _) = mounted(9000.0);
    assert_eq!(controller.view().count(".particle"), 50);
}

#[test]
fn test_resize_replaces_every_particle() {
    let (mut controller, _) = mounted(1280.0);
    let before = controller.particle_handles().to_vec();

    controller.view_mut().set_viewport(Viewport::new(375.0, 700.0));
    controller.handle(PageEvent::Resized);

    assert_eq!(controller.view().count(".particle"), 3);
    assert!(before.iter().all(|p| !controller.view().is_attached(*p)));
    assert!(controller
        .particle_handles()
        .iter()
        .all(|p| !before.contains(p)));

    controller.view_mut().set_viewport(Viewport::new(50.0, 700.0));
    controller.handle(PageEvent::Resized);
    assert_eq!(controller.view().count(".particle"), 0);
}

#[test]
fn test_resize_clears_particles_the_controller_did_not_create() {
    let (mut controller, _) = mounted(1280.0);
    let body = controller.view().body_id();
    let stray = controller.view_mut().append(body, "div", &[("class", "particle")]);
    assert_eq!(controller.view().count(".particle"), 13);

    controller.handle(PageEvent::Resized);

    assert!(!controller.view().is_attached(stray));
    assert_eq!(controller.view().count(".particle"), 12);
    assert!(!controller.particle_handles().contains(&stray));
}

#[test]
fn test_particles_are_decorative() {
    let (controller, _) = mounted(1280.0);
    let page = controller.view();
    for particle in controller.particle_handles() {
        assert_eq!(page.style(*particle, "pointer-events"), Some("none"));
        assert_eq!(page.style(*particle, "z-index"), Some("-1"));
        assert_eq!(page.style(*particle, "position"), Some("fixed"));
    }
}

// Contact form

#[test]
fn test_empty_field_blocks_submission() {
    let (mut controller, f) = mounted(1280.0);
    fill(&mut controller, &f, ["Ada", "ada@lab.org", "", "Hello"]);

    controller.handle(PageEvent::FormSubmitted);

    let shown = banners(&controller);
    assert_eq!(shown.len(), 1);
    assert_eq!(controller.view().text(shown[0]), "Please fill in all fields.");
    assert!(controller.view().has_class(shown[0], "form-message-error"));
    assert_eq!(controller.form_state(), FormState::Error);
    assert_eq!(controller.view().value(f.name), "Ada");
    assert_eq!(controller.view().value(f.message), "Hello");
    assert!(!controller.view().is_disabled(f.submit));
    assert_eq!(controller.view().text(f.submit), "Send Message");
}

#[test]
fn test_invalid_email_blocks_submission() {
    let (mut controller, f) = mounted(1280.0);
    fill(&mut controller, &f, ["A", "not-an-email", "S", "M"]);

    controller.handle(PageEvent::FormSubmitted);

    let shown = banners(&controller);
    assert_eq!(shown.len(), 1);
    assert_eq!(
        controller.view().text(shown[0]),
        "Please enter a valid email address."
    );
    assert_eq!(controller.banner().map(|b| b.1), Some(BannerKind::Error));
    assert_eq!(controller.view().value(f.email), "not-an-email");
}

#[test]
fn test_valid_submission_round_trip() {
    let (mut controller, f) = mounted(1280.0);
    assert_eq!(controller.elements().contact_form, Some(f.form));
    fill(&mut controller, &f, ["A", "a@b.com", "S", "M"]);

    controller.handle(PageEvent::FormSubmitted);
    assert_eq!(controller.form_state(), FormState::Submitting);
    assert!(controller.view().is_disabled(f.submit));
    assert_eq!(controller.view().text(f.submit), "Sending...");

    controller.advance(Duration::from_millis(1499));
    assert!(banners(&controller).is_empty());
    assert!(controller.view().is_disabled(f.submit));

    controller.advance(Duration::from_millis(1));
    let shown = banners(&controller);
    assert_eq!(shown.len(), 1);
    assert_eq!(
        controller.view().text(shown[0]),
        "Message sent successfully! I will get back to you soon."
    );
    assert!(controller.view().has_class(shown[0], "form-message-success"));
    assert_eq!(controller.form_state(), FormState::Success);
    for field in [f.name, f.email, f.subject, f.message] {
        assert_eq!(controller.view().value(field), "");
    }
    assert!(!controller.view().is_disabled(f.submit));
    assert_eq!(controller.view().text(f.submit), "Send Message");
}

#[test]
fn test_submit_while_pending_is_ignored() {
    let (mut controller, f) = mounted(1280.0);
    fill(&mut controller, &f, ["A", "a@b.com", "S", "M"]);

    controller.handle(PageEvent::FormSubmitted);
    let pending = controller.view().pending_timers();
    controller.handle(PageEvent::FormSubmitted);
    assert_eq!(controller.view().pending_timers(), pending);

    controller.advance(Duration::from_millis(1500));
    assert_eq!(banners(&controller).len(), 1);
    assert_eq!(controller.view().text(f.submit), "Send Message");
}

struct RejectingOutbox;

impl Outbox for RejectingOutbox {
    fn deliver(&mut self, _message: &ContactMessage) -> Result<(), SubmitError> {
        Err(SubmitError::Delivery {
            reason: "mail relay unreachable".into(),
        })
    }
}

#[test]
fn test_failed_delivery_reports_error_and_reenables() {
    init_logging();
    let (page, f) = landing_page(1280.0);
    let mut controller = Controller::new(page, SiteConfig::default())
        .with_seed(9)
        .with_outbox(Box::new(RejectingOutbox));
    controller.init();
    fill(&mut controller, &f, ["A", "a@b.com", "S", "M"]);

    controller.handle(PageEvent::FormSubmitted);
    controller.advance(Duration::from_millis(1500));

    let shown = banners(&controller);
    assert_eq!(shown.len(), 1);
    assert_eq!(
        controller.view().text(shown[0]),
        "Failed to send message. Please try again."
    );
    assert_eq!(controller.form_state(), FormState::Error);
    assert!(!controller.view().is_disabled(f.submit));
    assert_eq!(controller.view().text(f.submit), "Send Message");
    assert_eq!(controller.view().value(f.email), "a@b.com");
}

// Banner

#[test]
fn test_banner_slides_out_then_disappears() {
    let (mut controller, _) = mounted(1280.0);
    controller.handle(PageEvent::FormSubmitted);
    let banner = banners(&controller)[0];

    controller.advance(Duration::from_millis(4999));
    assert_eq!(
        controller.view().style(banner, "animation"),
        Some("slideIn 0.3s ease-out")
    );

    controller.advance(Duration::from_millis(1));
    assert_eq!(
        controller.view().style(banner, "animation"),
        Some("slideOut 0.3s ease-in")
    );
    assert!(controller.view().is_attached(banner));

    controller.advance(Duration::from_millis(300));
    assert!(!controller.view().is_attached(banner));
    assert!(controller.banner().is_none());
    assert_eq!(controller.view().pending_timers(), 0);
}

#[test]
fn test_new_banner_supersedes_old_one() {
    let (mut controller, f) = mounted(1280.0);

    controller.handle(PageEvent::FormSubmitted);
    let first = banners(&controller)[0];

    controller.advance(Duration::from_millis(3000));
    fill(&mut controller, &f, ["A", "bad", "S", "M"]);
    controller.handle(PageEvent::FormSubmitted);
    let shown = banners(&controller);
    assert_eq!(shown.len(), 1);
    assert_ne!(shown[0], first);

    // The first banner's timers were cancelled; the second lives its full time.
    controller.advance(Duration::from_millis(2500));
    assert_eq!(controller.view().style(shown[0], "animation"), Some("slideIn 0.3s ease-out"));
    controller.advance(Duration::from_millis(2800));
    assert!(!controller.view().is_attached(shown[0]));
    assert!(banners(&controller).is_empty());
}

#[test]
fn test_success_banner_replaces_pending_error() {
    let (mut controller, f) = mounted(1280.0);
    fill(&mut controller, &f, ["A", "bad", "S", "M"]);
    controller.handle(PageEvent::FormSubmitted);
    assert_eq!(banners(&controller).len(), 1);

    controller.view_mut().set_value(f.email, "a@b.com");
    controller.handle(PageEvent::FormSubmitted);
    controller.advance(Duration::from_millis(1500));

    let shown = banners(&controller);
    assert_eq!(shown.len(), 1);
    assert!(controller.view().has_class(shown[0], "form-message-success"));
}

#[test]
fn test_stray_timer_events_are_harmless() {
    let (mut controller, _) = mounted(1280.0);
    controller.handle(PageEvent::Timer(Task::BannerSlideOut(ElementId::new(9999))));
    controller.handle(PageEvent::Timer(Task::BannerRemove(ElementId::new(9999))));
    assert!(banners(&controller).is_empty());
}

// Accessibility and performance passes

#[test]
fn test_sections_labelled_as_regions() {
    let (controller, f) = mounted(1280.0);
    let page = controller.view();
    let labels: Vec<_> = f
        .sections
        .iter()
        .map(|s| page.attribute(*s, "aria-label").unwrap())
        .collect();
    assert_eq!(labels, ["about", "research", "section-2"]);
    assert!(f
        .sections
        .iter()
        .all(|s| page.attribute(*s, "role").as_deref() == Some("region")));
}

#[test]
fn test_images_lazy_and_cards_hinted() {
    let (controller, f) = mounted(1280.0);
    let page = controller.view();

    assert_eq!(page.attribute(f.eager_image, "loading").as_deref(), Some("lazy"));
    assert_eq!(page.attribute(f.lazy_image, "loading").as_deref(), Some("lazy"));
    for card in &f.cards {
        assert_eq!(page.style(*card, "will-change"), Some("transform"));
    }
}

#[test]
fn test_keyframes_injected_into_head() {
    let (controller, _) = mounted(1280.0);
    let page = controller.view();
    let styles = page.query_all("style");
    assert_eq!(styles.len(), 2);
    assert!(page.text(styles[0]).contains("@keyframes float"));
    assert!(page.text(styles[1]).contains("@keyframes slideOut"));
}
