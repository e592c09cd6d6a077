#![forbid(unsafe_code)]

use crate::reactive::Observable;

/// Open/closed state of the collapsible navigation menu.
#[derive(Clone, Debug)]
pub struct MobileMenu {
    open: Observable<bool>,
}

impl MobileMenu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: Observable::new(false),
        }
    }

    /// Flip the menu; returns the new state.
    pub fn toggle(&self) -> bool {
        let open = !self.open.get();
        self.open.set(open);
        open
    }

    pub fn close(&self) {
        self.open.set(false);
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    #[must_use]
    pub fn observable(&self) -> &Observable<bool> {
        &self.open
    }
}

impl Default for MobileMenu {
    fn default() -> Self {
        Self::new()
    }
}
