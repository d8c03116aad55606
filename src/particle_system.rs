use crate::config::ParticleConfig;
use crate::view::{ElementId, View};
use glam::Vec2;
use rand::Rng;

/// Keyframes driving the particle drift, injected once per page.
pub const FLOAT_KEYFRAMES: &str = r#"
@keyframes float {
    0%, 100% { transform: translateY(0px) rotate(0deg); }
    33% { transform: translateY(-10px) rotate(2deg); }
    66% { transform: translateY(-5px) rotate(-2deg); }
}
"#;

pub const PARTICLE_CLASS: &str = "particle";

/// One decorative dot floating behind the page content.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Particle {
    /// Position in viewport percent (x in vw, y in vh)
    pub position: Vec2,
    pub duration_secs: f32,
    pub opacity: f32,
}

impl Particle {
    pub fn random(rng: &mut impl Rng, config: &ParticleConfig) -> Self {
        let position = Vec2::new(rng.gen::<f32>() * 100.0, rng.gen::<f32>() * 100.0);
        let duration_secs = lerp(config.min_duration_secs, config.max_duration_secs, rng.gen());
        let opacity = lerp(config.min_opacity, config.max_opacity, rng.gen());

        Self {
            position,
            duration_secs,
            opacity,
        }
    }

    /// Inline style; `pointer-events: none` and a negative z-index keep it
    /// behind the content and out of the way of clicks.
    pub fn css_text(&self) -> String {
        format!(
            "position: fixed; width: 2px; height: 2px; \
             background: rgba(57, 73, 171, 0.3); border-radius: 50%; \
             pointer-events: none; z-index: -1; \
             animation: float {:.3}s infinite; left: {:.3}vw; top: {:.3}vh; opacity: {:.3};",
            self.duration_secs, self.position.x, self.position.y, self.opacity
        )
    }
}

fn lerp(min: f32, max: f32, t: f32) -> f32 {
    min + (max - min) * t
}

/// Tracks the particle elements currently on the page.
pub struct ParticleField {
    config: ParticleConfig,
    handles: Vec<ElementId>,
}

impl ParticleField {
    pub fn new(config: ParticleConfig) -> Self {
        Self {
            config,
            handles: Vec::new(),
        }
    }

    /// Batch size for a viewport `width` pixels wide.
    pub fn count_for(&self, width: f64) -> usize {
        if !(width > 0.0) || self.config.pixels_per_particle <= 0.0 {
            return 0;
        }
        ((width / self.config.pixels_per_particle).floor() as usize).min(self.config.max_count)
    }

    pub fn handles(&self) -> &[ElementId] {
        &self.handles
    }

    /// Remove every `.particle` on the page, not only our own batch, and
    /// spawn a fresh one sized to the viewport.
    pub fn regenerate<V: View>(&mut self, view: &mut V, rng: &mut impl Rng) {
        for handle in self.handles.drain(..) {
            view.remove(handle);
        }
        for stray in view.query_all(&format!(".{PARTICLE_CLASS}")) {
            view.remove(stray);
        }

        let Some(body) = view.body() else {
            log::debug!("no body element; skipping particles");
            return;
        };

        let count = self.count_for(view.viewport().width);
        for _ in 0..count {
            let Some(element) = view.create_element("div") else {
                log::warn!("failed to create particle element");
                break;
            };
            let particle = Particle::random(rng, &self.config);
            view.set_attribute(element, "class", PARTICLE_CLASS);
            view.set_style_text(element, &particle.css_text());
            view.append_child(body, element);
            self.handles.push(element);
        }
        log::debug!("spawned {} particles", self.handles.len());
    }
}
