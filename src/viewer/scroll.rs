//! Scroll wiring and frame scheduling for `TlView`.
//!
//! The time grid owns scrolling; its listener mirrors the vertical offset onto
//! the resource list. Passes run on animation frames so a burst of state
//! changes costs one commit.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::Event;

use super::wasm::{flush_state, with_dom, SharedOutbox, SharedState};
use crate::layout::ScrollSynchronizer;
use crate::render::PaneKind;

pub(super) fn wire_scroll_listeners(
    state: &Rc<RefCell<SharedState>>,
) -> Vec<Closure<dyn FnMut(Event)>> {
    let mut closures = Vec::new();
    for pane in [PaneKind::TimeGrid, PaneKind::Spreadsheet] {
        let weak_state = Rc::downgrade(state);
        let closure = Closure::wrap(Box::new(move |_event: Event| {
            if let Some(state) = weak_state.upgrade() {
                with_dom(&state, |dom| sync_scroll(dom, pane));
            }
        }) as Box<dyn FnMut(Event)>);

        let scroller = state.borrow().dom.scroller(pane).clone();
        scroller
            .add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref())
            .ok();
        closures.push(closure);
    }
    closures
}

fn sync_scroll(dom: &mut dyn crate::render::DomHost, source: PaneKind) {
    ScrollSynchronizer::handle_scroll(dom, source);
}

/// Request an animation frame that flushes the queued pass, once per frame.
pub(super) fn schedule_frame(state: &Rc<RefCell<SharedState>>, outbox: &SharedOutbox) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(mut s) = state.try_borrow_mut() else {
        return;
    };
    if s.frame_requested || !s.controller.needs_pass() {
        return;
    }
    if s.frame_closure.is_none() {
        let weak_state = Rc::downgrade(state);
        let outbox = Rc::clone(outbox);
        let closure = Closure::wrap(Box::new(move || {
            let Some(state) = weak_state.upgrade() else {
                return;
            };
            if let Ok(mut s) = state.try_borrow_mut() {
                s.frame_requested = false;
            }
            if let Err(e) = flush_state(&state, &outbox) {
                tracing::warn!(error = %e, "timeline pass failed");
                web_sys::console::error_1(&e.to_string().into());
            }
            // State changed by render callbacks during the flush.
            schedule_frame(&state, &outbox);
        }) as Box<dyn FnMut()>);
        s.frame_closure = Some(closure);
    }
    let callback = s
        .frame_closure
        .as_ref()
        .map(|c| c.as_ref().unchecked_ref::<js_sys::Function>().clone());
    if let Some(callback) = callback {
        if window.request_animation_frame(&callback).is_ok() {
            s.frame_requested = true;
        }
    }
}
