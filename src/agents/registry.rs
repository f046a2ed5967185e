//! Place Registry
//!
//! Maps current forms to the places that handle them, so agents can route a
//! work item on its top form without knowing any concrete stage.

use super::place::Place;

use dashmap::DashMap;
use std::sync::Arc;

pub struct PlaceRegistry {
    places: DashMap<String, Arc<dyn Place>>,
}

impl PlaceRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `place` under every form it serves. A later registration for
    /// the same form replaces the earlier one.
    pub fn register(&self, place: Arc<dyn Place>) {
        for form in place.forms() {
            tracing::info!("Registered place {} for form {}", place.key(), form);
            self.places.insert(form, place.clone());
        }
    }

    pub fn lookup(&self, form: &str) -> Option<Arc<dyn Place>> {
        self.places.get(form).map(|entry| entry.value().clone())
    }

    pub fn has_form(&self, form: &str) -> bool {
        self.places.contains_key(form)
    }

    pub fn forms(&self) -> Vec<String> {
        let mut forms: Vec<String> = self.places.iter().map(|entry| entry.key().clone()).collect();
        forms.sort();
        forms
    }

    pub fn form_count(&self) -> usize {
        self.places.len()
    }
}

impl Default for PlaceRegistry {
    fn default() -> Self {
        Self {
            places: DashMap::new(),
        }
    }
}
