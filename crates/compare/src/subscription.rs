//! Scoped subscription to the document-wide pointer-up event.
//!
//! A drag must end even when the pointer is released outside the slider, so
//! the slider listens on the whole document while it is mounted. The
//! registration lives in a guard and is removed when the guard drops.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type PointerUpHandler = Box<dyn FnMut()>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerError(pub String);

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pointer-up listener failed: {}", self.0)
    }
}

impl std::error::Error for ListenerError {}

/// Something that can deliver global pointer-up notifications.
pub trait PointerUpTarget {
    type Registration;

    fn listen(&self, handler: PointerUpHandler) -> Result<Self::Registration, ListenerError>;
    fn unlisten(&self, registration: Self::Registration);
}

/// Holds one registration on `T`; releases it on drop.
pub struct PointerUpSubscription<T: PointerUpTarget> {
    target: T,
    registration: Option<T::Registration>,
}

impl<T: PointerUpTarget> PointerUpSubscription<T> {
    pub fn subscribe(target: T, handler: PointerUpHandler) -> Result<Self, ListenerError> {
        let registration = target.listen(handler)?;
        Ok(Self {
            target,
            registration: Some(registration),
        })
    }

    pub fn is_active(&self) -> bool {
        self.registration.is_some()
    }

    /// Releases the registration now. Safe to call more than once.
    pub fn release(&mut self) {
        if let Some(registration) = self.registration.take() {
            self.target.unlisten(registration);
        }
    }
}

impl<T: PointerUpTarget> Drop for PointerUpSubscription<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: PointerUpTarget> std::fmt::Debug for PointerUpSubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerUpSubscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
struct HubInner {
    next_id: u64,
    handlers: BTreeMap<ListenerId, PointerUpHandler>,
}

/// In-process pointer-up source for native hosts and tests.
///
/// Handlers run in registration order. A handler must not subscribe or
/// unsubscribe on the same hub while it is being dispatched.
#[derive(Clone, Default)]
pub struct LocalPointerHub {
    inner: Rc<RefCell<HubInner>>,
}

impl LocalPointerHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self) {
        let mut inner = self.inner.borrow_mut();
        for handler in inner.handlers.values_mut() {
            handler();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().handlers.len()
    }
}

impl std::fmt::Debug for LocalPointerHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalPointerHub")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl PointerUpTarget for LocalPointerHub {
    type Registration = ListenerId;

    fn listen(&self, handler: PointerUpHandler) -> Result<ListenerId, ListenerError> {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.handlers.insert(id, handler);
        Ok(id)
    }

    fn unlisten(&self, registration: ListenerId) {
        self.inner.borrow_mut().handlers.remove(&registration);
    }
}
