// Interactive behaviors for the landing page, compiled to WebAssembly.
//
// All behavior lives in `Controller`, which reaches the page only through
// the `View` and `Scheduler` traits. In the browser those are backed by
// web-sys; under test by the headless `MemoryPage`.
pub mod banner;
pub mod config;
pub mod contact_form;
pub mod controller;
pub mod memory_page;
pub mod particle_system;
pub mod registry;
pub mod view;

#[cfg(target_arch = "wasm32")]
mod web;

// Re-export main types
pub use config::{ConfigError, SiteConfig};
pub use contact_form::{
    ContactMessage, FormState, Outbox, SimulatedOutbox, SubmitError, ValidationError,
};
pub use controller::{Controller, PageElements, PageEvent};
pub use memory_page::MemoryPage;
pub use particle_system::{Particle, ParticleField};
pub use view::{ElementId, Scheduler, Task, TimerId, View, Viewport};
