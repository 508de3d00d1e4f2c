use log::debug;

use crate::models::FilterSpec;

/// Remembers the last filter that produced a map so unchanged input skips the redraw.
#[derive(Debug, Default)]
pub struct FilterSession {
    previous: Option<FilterSpec>,
}

impl FilterSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_recompute(&self, spec: &FilterSpec) -> bool {
        match &self.previous {
            Some(previous) => previous != spec,
            None => true,
        }
    }

    pub fn commit(&mut self, spec: FilterSpec) {
        self.previous = Some(spec);
    }

    /// Runs `render` only when `spec` differs from the committed one, then commits it.
    pub fn apply<T>(&mut self, spec: FilterSpec, render: impl FnOnce(&FilterSpec) -> T) -> Option<T> {
        if !self.should_recompute(&spec) {
            debug!("filter unchanged, skipping render");
            return None;
        }

        let output = render(&spec);
        self.commit(spec);
        Some(output)
    }
}
