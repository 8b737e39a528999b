use std::cell::RefCell;
use std::rc::Rc;

use compare::{ListenerError, PointerUpHandler, PointerUpTarget};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

/// Events that end a slider drag anywhere on the page.
const RELEASE_EVENTS: [&str; 2] = ["pointerup", "touchend"];

/// Document-level pointer-up source.
#[derive(Debug, Clone)]
pub struct DocumentPointerUp {
    document: web_sys::Document,
}

pub struct DocumentRegistration {
    closures: Vec<(&'static str, Closure<dyn FnMut(web_sys::Event)>)>,
}

impl DocumentPointerUp {
    pub fn from_window() -> Result<Self, ListenerError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ListenerError("document unavailable".to_string()))?;
        Ok(Self { document })
    }
}

impl PointerUpTarget for DocumentPointerUp {
    type Registration = DocumentRegistration;

    fn listen(&self, handler: PointerUpHandler) -> Result<DocumentRegistration, ListenerError> {
        let handler = Rc::new(RefCell::new(handler));
        let mut registration = DocumentRegistration {
            closures: Vec::with_capacity(RELEASE_EVENTS.len()),
        };

        for event in RELEASE_EVENTS {
            let handler = Rc::clone(&handler);
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
                if let Ok(mut handler) = handler.try_borrow_mut() {
                    (*handler)();
                }
            });
            if let Err(err) = self
                .document
                .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                self.unlisten(registration);
                return Err(ListenerError(format!("add {event} listener: {err:?}")));
            }
            registration.closures.push((event, closure));
        }
        Ok(registration)
    }

    fn unlisten(&self, registration: DocumentRegistration) {
        for (event, closure) in registration.closures {
            if let Err(err) = self
                .document
                .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            {
                tracing::warn!("remove {event} listener failed: {err:?}");
            }
        }
    }
}
