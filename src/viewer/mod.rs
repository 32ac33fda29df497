//! Browser host for the timeline.
//!
//! This module provides the WASM-exported `TlView` struct that:
//! - Builds the two-pane DOM skeleton inside a container element
//! - Runs render passes on animation frames through a [`DomHost`] over web-sys
//! - Performs resource and event fetches through JS promise-returning sources
//! - Mirrors vertical scroll from the time grid onto the resource list
//!
//! Everything here is wasm32-only; native builds use `MemoryDom` instead.

#[cfg(target_arch = "wasm32")]
mod scroll;
#[cfg(target_arch = "wasm32")]
mod web_dom;

#[cfg(target_arch = "wasm32")]
pub use wasm::TlView;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use js_sys::{Function, Promise};
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Event, HtmlElement};

    use super::scroll;
    use super::web_dom::WebDom;
    use crate::controller::{FetchArg, FetchRequest, FetchToken, TimelineController};
    use crate::error::{FetchKind, Result, TlviewError};
    use crate::render::{DomHost, NodeId};
    use crate::types::{parse_date_marker, DateProfile, EventRecord, Resource, TimelineOptions};

    /// A resource row whose cells were built during the last pass.
    pub(super) struct RenderedRow {
        pub(super) resource: Resource,
        pub(super) element: NodeId,
    }

    /// Shared state that can be accessed by event handlers.
    pub(crate) struct SharedState {
        pub(crate) controller: TimelineController,
        pub(crate) dom: WebDom,
        pub(crate) resource_source: Option<Function>,
        pub(crate) event_source: Option<Function>,
        pub(crate) render_callback: Option<Function>,
        pub(crate) error_callback: Option<Function>,
        pub(crate) frame_requested: bool,
        pub(crate) frame_closure: Option<Closure<dyn FnMut()>>,
    }

    /// Notifications collected by controller hooks during a pass, delivered to
    /// JS once the state borrow is released.
    #[derive(Default)]
    pub(super) struct Outbox {
        pub(super) rendered: Vec<RenderedRow>,
        pub(super) errors: Vec<String>,
    }

    pub(super) type SharedOutbox = Rc<RefCell<Outbox>>;

    /// Resource timeline view bound to a container element.
    #[wasm_bindgen]
    pub struct TlView {
        state: Rc<RefCell<SharedState>>,
        outbox: SharedOutbox,
        _scroll_closures: Vec<Closure<dyn FnMut(Event)>>,
    }

    fn to_js(err: TlviewError) -> JsValue {
        JsValue::from(err)
    }

    fn parse_profile(start: &str, end: &str) -> Result<DateProfile> {
        let parse = |s: &str| {
            parse_date_marker(s).ok_or_else(|| TlviewError::Other(format!("invalid date `{s}`")))
        };
        Ok(DateProfile::new(parse(start)?, parse(end)?))
    }

    fn parse_options(options: JsValue) -> Result<TimelineOptions> {
        if options.is_undefined() || options.is_null() {
            return Ok(TimelineOptions::default());
        }
        let options: TimelineOptions = serde_wasm_bindgen::from_value(options)
            .map_err(|e| TlviewError::invalid_option("options", e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    #[wasm_bindgen]
    impl TlView {
        /// Create a view inside `container` for the range `start..end`.
        #[wasm_bindgen(constructor)]
        pub fn new(
            container: HtmlElement,
            options: JsValue,
            start: &str,
            end: &str,
        ) -> std::result::Result<TlView, JsValue> {
            console_error_panic_hook::set_once();

            let options = parse_options(options).map_err(to_js)?;
            let profile = parse_profile(start, end).map_err(to_js)?;
            let mut controller = TimelineController::new(options, profile).map_err(to_js)?;
            let dom = WebDom::mount(&container).map_err(to_js)?;

            let outbox: SharedOutbox = Rc::new(RefCell::new(Outbox::default()));
            {
                let outbox = Rc::clone(&outbox);
                controller.on_resource_render(move |info| {
                    outbox.borrow_mut().rendered.push(RenderedRow {
                        resource: info.resource.clone(),
                        element: info.handles.spreadsheet,
                    });
                });
            }
            {
                let outbox = Rc::clone(&outbox);
                controller.on_fetch_error(move |err| {
                    web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
                    outbox.borrow_mut().errors.push(err.to_string());
                });
            }

            let state = Rc::new(RefCell::new(SharedState {
                controller,
                dom,
                resource_source: None,
                event_source: None,
                render_callback: None,
                error_callback: None,
                frame_requested: false,
                frame_closure: None,
            }));

            let scroll_closures = scroll::wire_scroll_listeners(&state);
            let view = TlView {
                state,
                outbox,
                _scroll_closures: scroll_closures,
            };
            view.schedule();
            Ok(view)
        }

        /// Register `fn({start, end}) -> Promise<Resource[]>` and fetch once.
        #[wasm_bindgen(js_name = setResourceSource)]
        pub fn set_resource_source(&self, source: Function) {
            self.state.borrow_mut().resource_source = Some(source);
            self.refetch_resources();
        }

        /// Register `fn({start, end}) -> Promise<Event[]>` and fetch once.
        #[wasm_bindgen(js_name = setEventSource)]
        pub fn set_event_source(&self, source: Function) {
            self.state.borrow_mut().event_source = Some(source);
            self.refetch_events();
        }

        #[wasm_bindgen(js_name = onResourceRender)]
        pub fn on_resource_render(&self, callback: Function) {
            self.state.borrow_mut().render_callback = Some(callback);
        }

        #[wasm_bindgen(js_name = onFetchError)]
        pub fn on_fetch_error(&self, callback: Function) {
            self.state.borrow_mut().error_callback = Some(callback);
        }

        #[wasm_bindgen(js_name = refetchResources)]
        pub fn refetch_resources(&self) {
            let token = self.state.borrow_mut().controller.begin_resource_fetch();
            self.start_fetch(token);
        }

        #[wasm_bindgen(js_name = refetchEvents)]
        pub fn refetch_events(&self) {
            let token = self.state.borrow_mut().controller.begin_event_fetch();
            self.start_fetch(token);
        }

        /// Re-render without fetching.
        pub fn render(&self) {
            self.state.borrow_mut().controller.render();
            self.schedule();
        }

        /// Switch the visible range; events are refetched, resources are not.
        pub fn navigate(&self, start: &str, end: &str) -> std::result::Result<(), JsValue> {
            let profile = parse_profile(start, end).map_err(to_js)?;
            self.go_to(profile);
            Ok(())
        }

        pub fn next(&self) {
            let profile = self.state.borrow().controller.date_profile().next();
            self.go_to(profile);
        }

        pub fn prev(&self) {
            let profile = self.state.borrow().controller.date_profile().prev();
            self.go_to(profile);
        }

        #[wasm_bindgen(js_name = setOptions)]
        pub fn set_options(&self, options: JsValue) -> std::result::Result<(), JsValue> {
            let options = parse_options(options).map_err(to_js)?;
            self.state
                .borrow_mut()
                .controller
                .set_options(options)
                .map_err(to_js)?;
            self.schedule();
            Ok(())
        }

        #[wasm_bindgen(js_name = addResource)]
        pub fn add_resource(&self, resource: JsValue) -> std::result::Result<(), JsValue> {
            let resource: Resource = serde_wasm_bindgen::from_value(resource)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            self.state.borrow_mut().controller.add_resource(resource);
            self.schedule();
            Ok(())
        }

        #[wasm_bindgen(js_name = removeResource)]
        pub fn remove_resource(&self, id: &str) -> bool {
            let removed = self.state.borrow_mut().controller.remove_resource(id);
            if removed {
                self.schedule();
            }
            removed
        }

        #[wasm_bindgen(js_name = toggleExpanded)]
        pub fn toggle_expanded(&self, id: &str) -> bool {
            let expanded = self.state.borrow_mut().controller.toggle_expanded(id);
            self.schedule();
            expanded
        }

        /// Resource ids in display order.
        #[wasm_bindgen(js_name = resourceIds)]
        pub fn resource_ids(&self) -> Vec<String> {
            self.state.borrow().controller.rendered_resource_ids()
        }

        /// Re-equalize row heights, e.g. after images in cells finished loading.
        #[wasm_bindgen(js_name = resyncHeights)]
        pub fn resync_heights(&self) -> std::result::Result<(), JsValue> {
            let mut guard = self.state.borrow_mut();
            let s = &mut *guard;
            s.controller.resync_heights(&mut s.dom).map_err(to_js)
        }

        /// Run any queued pass right away instead of on the next frame.
        pub fn flush(&self) -> std::result::Result<(), JsValue> {
            flush_state(&self.state, &self.outbox).map_err(to_js)
        }

        pub fn destroy(&self) {
            let mut s = self.state.borrow_mut();
            s.frame_closure = None;
            s.dom.root().remove();
        }
    }

    impl TlView {
        fn go_to(&self, profile: DateProfile) {
            let request = self.state.borrow_mut().controller.navigate(profile);
            if let FetchRequest::Events(token) = request {
                self.start_fetch(token);
            }
            self.schedule();
        }

        fn schedule(&self) {
            scroll::schedule_frame(&self.state, &self.outbox);
        }

        fn start_fetch(&self, token: FetchToken) {
            let source = {
                let s = self.state.borrow();
                match token.kind {
                    FetchKind::Resources => s.resource_source.clone(),
                    FetchKind::Events => s.event_source.clone(),
                }
            };
            let Some(source) = source else {
                return;
            };
            let promise = match call_source(&source, &token.arg()) {
                Ok(promise) => promise,
                Err(err) => {
                    self.deliver_now(token, Err(err));
                    return;
                }
            };

            let state = Rc::clone(&self.state);
            let outbox = Rc::clone(&self.outbox);
            wasm_bindgen_futures::spawn_local(async move {
                let value = JsFuture::from(promise).await.map_err(|e| TlviewError::Fetch {
                    kind: token.kind,
                    message: e.as_string().unwrap_or_else(|| format!("{e:?}")),
                });
                deliver(&state, token, value);
                scroll::schedule_frame(&state, &outbox);
                deliver_errors(&state, &outbox);
            });
        }

        fn deliver_now(&self, token: FetchToken, value: Result<JsValue>) {
            deliver(&self.state, token, value);
            deliver_errors(&self.state, &self.outbox);
            self.schedule();
        }
    }

    fn call_source(source: &Function, arg: &FetchArg) -> Result<Promise> {
        let arg = serde_wasm_bindgen::to_value(arg).map_err(|e| TlviewError::Other(e.to_string()))?;
        let value = source
            .call1(&JsValue::NULL, &arg)
            .map_err(|e| TlviewError::Other(format!("source threw: {e:?}")))?;
        Ok(Promise::resolve(&value))
    }

    fn deliver(state: &Rc<RefCell<SharedState>>, token: FetchToken, value: Result<JsValue>) {
        let mut s = state.borrow_mut();
        let controller = &mut s.controller;
        match token.kind {
            FetchKind::Resources => {
                let parsed = value.and_then(|v| {
                    serde_wasm_bindgen::from_value::<Vec<Resource>>(v)
                        .map_err(|e| TlviewError::Other(e.to_string()))
                });
                controller.receive_resources(token, parsed);
            }
            FetchKind::Events => {
                let parsed = value.and_then(|v| {
                    serde_wasm_bindgen::from_value::<Vec<EventRecord>>(v)
                        .map_err(|e| TlviewError::Other(e.to_string()))
                });
                controller.receive_events(token, parsed);
            }
        }
    }

    /// Run a queued pass and hand collected notifications to JS.
    pub(super) fn flush_state(state: &Rc<RefCell<SharedState>>, outbox: &SharedOutbox) -> Result<()> {
        let callback = {
            let Ok(mut guard) = state.try_borrow_mut() else {
                // A pass is already running further up the stack; it will be
                // followed by a fresh frame.
                return Ok(());
            };
            let s = &mut *guard;
            s.controller.flush(&mut s.dom)?;
            s.render_callback.clone()
        };

        let rendered = std::mem::take(&mut outbox.borrow_mut().rendered);
        if let Some(callback) = callback {
            for row in rendered {
                let element = state.borrow().dom.element(row.element).cloned();
                let (Ok(resource), Some(element)) =
                    (serde_wasm_bindgen::to_value(&row.resource), element)
                else {
                    continue;
                };
                let view = JsValue::from_str(&state.borrow().controller.options().view_type);
                if let Err(e) = callback.call3(&JsValue::NULL, &resource, &element, &view) {
                    web_sys::console::error_1(&e);
                }
            }
        }
        deliver_errors(state, outbox);
        Ok(())
    }

    fn deliver_errors(state: &Rc<RefCell<SharedState>>, outbox: &SharedOutbox) {
        let errors = std::mem::take(&mut outbox.borrow_mut().errors);
        let callback = state.borrow().error_callback.clone();
        if let Some(callback) = callback {
            for message in errors {
                if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&message)) {
                    web_sys::console::error_1(&e);
                }
            }
        }
    }

    /// Used by scroll listeners to reach the DOM host.
    pub(super) fn with_dom(state: &Rc<RefCell<SharedState>>, f: impl FnOnce(&mut dyn DomHost)) {
        if let Ok(mut s) = state.try_borrow_mut() {
            f(&mut s.dom);
        }
    }
}
