use crate::view::{ElementId, TimerId};

/// Slide animations used by the status banner.
pub const BANNER_KEYFRAMES: &str = r#"
@keyframes slideIn {
    from {
        transform: translateX(100%);
        opacity: 0;
    }
    to {
        transform: translateX(0);
        opacity: 1;
    }
}
@keyframes slideOut {
    from {
        transform: translateX(0);
        opacity: 1;
    }
    to {
        transform: translateX(100%);
        opacity: 0;
    }
}
"#;

pub const EXIT_ANIMATION: &str = "slideOut 0.3s ease-in";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        }
    }

    fn background(self) -> &'static str {
        match self {
            BannerKind::Success => "var(--success)",
            BannerKind::Error => "var(--error)",
        }
    }
}

/// Transient notice reporting the outcome of a contact form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn new(kind: BannerKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn class_name(&self) -> String {
        format!("form-message form-message-{}", self.kind.as_str())
    }

    pub fn css_text(&self) -> String {
        format!(
            "position: fixed; top: 20px; right: 20px; padding: 1rem 1.5rem; \
             border-radius: 0.5rem; background: {}; color: white; z-index: 1000; \
             box-shadow: 0 4px 12px rgba(0, 0, 0, 0.15); animation: slideIn 0.3s ease-out; \
             max-width: 300px; text-align: center;",
            self.kind.background()
        )
    }
}

/// The banner currently on the page and its pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActiveBanner {
    pub element: ElementId,
    pub kind: BannerKind,
    pub timer: TimerId,
}
