//! Ambient scopes that hand the active viewport or navigator to nested
//! consumers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::error::{EngineError, EngineResult};
use crate::runtime::navigator::Navigator;
use crate::runtime::viewport::Viewport;

/// Values that can be provided through a [`Scope`].
pub trait Scoped {
    /// Name used in [`EngineError::MissingContext`].
    const CONTEXT: &'static str;
}

impl Scoped for Viewport {
    const CONTEXT: &'static str = "viewport";
}

impl Scoped for Navigator {
    const CONTEXT: &'static str = "navigator";
}

/// Slot holding the shared value of the innermost provider.
pub struct Scope<T> {
    current: Option<Rc<RefCell<T>>>,
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T: Scoped> Scope<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide `value`, returning the previously provided one so callers can
    /// restore it when the nested provider goes away.
    pub fn provide(&mut self, value: Rc<RefCell<T>>) -> Option<Rc<RefCell<T>>> {
        if let Some(prev) = self.current.as_ref() {
            if Rc::ptr_eq(prev, &value) {
                return None;
            }
        }
        self.current.replace(value)
    }

    pub fn restore(&mut self, previous: Option<Rc<RefCell<T>>>) {
        self.current = previous;
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn is_provided(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> EngineResult<Rc<RefCell<T>>> {
        self.current
            .as_ref()
            .map(Rc::clone)
            .ok_or(EngineError::MissingContext(T::CONTEXT))
    }

    /// Run `f` against the provided value.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> EngineResult<R> {
        let current = self.current()?;
        let mut value = current.borrow_mut();
        Ok(f(&mut value))
    }
}

pub type ViewportScope = Scope<Viewport>;
pub type NavigatorScope = Scope<Navigator>;

impl Scope<Viewport> {
    /// Whether `index` is the focused item of the provided viewport.
    pub fn is_focused(&self, index: usize) -> EngineResult<bool> {
        self.with(|viewport| viewport.is_focused(index))
    }
}

impl Scope<Navigator> {
    /// Whether `name` is the focused node of the provided navigator.
    pub fn is_focused(&self, name: &str) -> EngineResult<bool> {
        self.with(|navigator| navigator.is_focused(name))
    }
}
