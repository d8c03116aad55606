//! Slot map handing out [`ElementId`]s for elements owned by a host page.

use crate::view::ElementId;
use std::collections::HashMap;

/// Ids are never reused. Released slots are dropped, so the map only holds
/// elements the controller can still reach.
#[derive(Debug)]
pub struct Registry<E> {
    slots: HashMap<ElementId, E>,
    next: usize,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            next: 0,
        }
    }
}

impl<E> Registry<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `element` under a fresh id. Callers dedup beforehand if needed.
    pub fn insert(&mut self, element: E) -> ElementId {
        let id = ElementId::new(self.next);
        self.next += 1;
        self.slots.insert(id, element);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&E> {
        self.slots.get(&id)
    }

    pub fn release(&mut self, id: ElementId) -> Option<E> {
        self.slots.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
