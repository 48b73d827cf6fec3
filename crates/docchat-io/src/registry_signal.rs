//! Reactive registry storage.

use dioxus::prelude::*;
use docchat_intake::{PreviewRegistry, RegistryCell};
use web_sys::File;

/// A [`PreviewRegistry`] held in a Dioxus signal.
///
/// Every mutation through [`RegistryCell::with_mut`] marks the signal
/// dirty, so components reading it re-render. The wrapper is `Copy`
/// like the signal itself.
#[derive(Clone, Copy, PartialEq)]
pub struct SignalRegistry(Signal<PreviewRegistry<File>>);

impl SignalRegistry {
    /// Wrap an existing signal.
    #[must_use]
    pub const fn new(signal: Signal<PreviewRegistry<File>>) -> Self {
        Self(signal)
    }

    /// The underlying signal, for reading in components.
    #[must_use]
    pub const fn signal(self) -> Signal<PreviewRegistry<File>> {
        self.0
    }
}

impl RegistryCell<File> for SignalRegistry {
    fn with_mut<T>(&self, f: impl FnOnce(&mut PreviewRegistry<File>) -> T) -> T {
        let mut signal = self.0;
        let mut registry = signal.write();
        f(&mut registry)
    }
}
