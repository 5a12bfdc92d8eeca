//! Browser page backed by `web_sys`.
//!
//! DESIGN
//! ======
//! Columns are found with the configured selector, widgets are the column
//! children carrying the widget marker class, and widget parts are looked up
//! by their marker classes inside the widget container. Every listener is a
//! `Closure` kept until `unlisten`. A handler may detach the very listener
//! that is running it, so detached closures are parked and only freed when
//! the next DOM event arrives.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, Element, Event, HtmlElement, HtmlFormElement, HtmlInputElement};

use super::{
    BoardEvent, Control, Disposition, ListenerKey, Page, PageScan, ScannedColumn, ScannedTrigger, ScannedWidget, Target,
};
use crate::config::BoardConfig;
use crate::util::equal_height::{ColumnBox, css_px};
use crate::util::ident::{ClassMarker, IdCodec};

type Handler = Closure<dyn FnMut(Event)>;

/// Receiver of routed gestures. Empty until the board is built; events
/// arriving before that are swallowed.
pub type EventSink = Rc<RefCell<Option<Box<dyn Fn(BoardEvent) -> Disposition>>>>;

struct Listener {
    element: Element,
    event_type: &'static str,
    handler: Handler,
}

pub struct WebPage {
    document: Document,
    codec: IdCodec,
    column_selector: String,
    sink: EventSink,
    listeners: HashMap<ListenerKey, Listener>,
    retired: Rc<RefCell<Vec<Handler>>>,
    next_key: u64,
}

impl WebPage {
    pub fn new(document: Document, config: &BoardConfig) -> Self {
        Self {
            document,
            codec: config.codec(),
            column_selector: config.column_selector(),
            sink: Rc::new(RefCell::new(None)),
            listeners: HashMap::new(),
            retired: Rc::new(RefCell::new(Vec::new())),
            next_key: 0,
        }
    }

    /// Shared slot the mount point fills with the board's router.
    #[must_use]
    pub fn event_sink(&self) -> EventSink {
        Rc::clone(&self.sink)
    }

    fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        let Ok(list) = self.document.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn marker_selector(&self, marker: ClassMarker) -> String {
        format!(".{}", self.codec.class(marker))
    }

    fn find_in(&self, scope: &Element, marker: ClassMarker) -> Option<Element> {
        scope.query_selector(&self.marker_selector(marker)).ok().flatten()
    }

    fn part(&self, widget: &str, marker: ClassMarker) -> Option<Element> {
        self.find_in(&self.element(widget)?, marker)
    }

    fn styled_part(&self, widget: &str, marker: ClassMarker) -> Option<HtmlElement> {
        self.part(widget, marker)?.dyn_into::<HtmlElement>().ok()
    }

    /// Widget containers directly inside `column`, in display order.
    fn widgets_in(&self, column: &Element) -> Vec<Element> {
        let marker = self.codec.class(ClassMarker::Widget);
        let children = column.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|child| child.class_list().contains(&marker))
            .collect()
    }

    fn describe(&self, widget: &Element) -> ScannedWidget {
        let collapsed = self
            .find_in(widget, ClassMarker::CollapseButton)
            .is_some_and(|button| button.class_list().contains(&self.codec.class(ClassMarker::Collapsed)));
        ScannedWidget { element_id: widget.id(), class_list: widget.class_name(), collapsed }
    }

    fn target_element(&self, target: &Target) -> Option<(Element, &'static str)> {
        match target {
            Target::Trigger(id) => Some((self.element(id)?, "click")),
            Target::Control { widget, control } => match control {
                Control::DeleteButton => Some((self.part(widget, ClassMarker::DeleteButton)?, "click")),
                Control::EditButton => Some((self.part(widget, ClassMarker::EditButton)?, "click")),
                Control::CollapseButton => Some((self.part(widget, ClassMarker::CollapseButton)?, "click")),
                Control::SettingsForm => {
                    let selector = format!("{} form", self.marker_selector(ClassMarker::EditPanel));
                    let form = self.element(widget)?.query_selector(&selector).ok().flatten()?;
                    Some((form, "submit"))
                }
            },
        }
    }

    fn column_box(&self, column: &HtmlElement) -> ColumnBox {
        let style = self.document.default_view().and_then(|window| window.get_computed_style(column).ok().flatten());
        let read = |property: &str| style.as_ref().and_then(|s| s.get_property_value(property).ok()).unwrap_or_default();
        ColumnBox {
            border_box: read("box-sizing").trim() == "border-box",
            offset_height: f64::from(column.offset_height()),
            client_height: f64::from(column.client_height()),
            padding_top: css_px(&read("padding-top")),
            padding_bottom: css_px(&read("padding-bottom")),
        }
    }

    fn set_display(&self, widget: &str, marker: ClassMarker, visible: bool) {
        if let Some(part) = self.styled_part(widget, marker) {
            let _ = part.style().set_property("display", if visible { "block" } else { "none" });
        }
    }
}

/// Name/value pairs of a form's successful controls. File inputs are skipped.
fn form_fields(form: &HtmlFormElement) -> Vec<(String, String)> {
    let Ok(data) = web_sys::FormData::new_with_form(form) else {
        return Vec::new();
    };
    let Ok(Some(entries)) = js_sys::try_iter(&data) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let pair = js_sys::Array::from(&entry);
            Some((pair.get(0).as_string()?, pair.get(1).as_string()?))
        })
        .collect()
}

fn current_target<T: JsCast>(event: &Event) -> Option<T> {
    event.current_target()?.dyn_into::<T>().ok()
}

fn event_for(target: &Target, event: &Event) -> BoardEvent {
    match target {
        Target::Trigger(id) => BoardEvent::AddClicked { trigger: id.clone() },
        Target::Control { widget, control } => {
            let widget = widget.clone();
            match control {
                Control::DeleteButton => BoardEvent::DeleteClicked {
                    button: current_target::<Element>(event).map(|button| button.id()).unwrap_or_default(),
                    widget,
                },
                Control::EditButton => BoardEvent::EditToggled { widget },
                Control::CollapseButton => BoardEvent::CollapseToggled { widget },
                Control::SettingsForm => BoardEvent::SettingsSubmitted {
                    fields: current_target::<HtmlFormElement>(event).map(|form| form_fields(&form)).unwrap_or_default(),
                    widget,
                },
            }
        }
    }
}

impl Page for WebPage {
    fn has_widget_area(&self) -> bool {
        !self.query_all(&self.column_selector).is_empty()
    }

    fn scan(&self) -> PageScan {
        let columns = self
            .query_all(&self.column_selector)
            .iter()
            .map(|column| ScannedColumn {
                element_id: column.id(),
                widgets: self.widgets_in(column).iter().map(|w| self.describe(w)).collect(),
            })
            .collect();
        let triggers = self
            .query_all(&format!("{} li", self.marker_selector(ClassMarker::AddPanel)))
            .iter()
            .map(|li| ScannedTrigger { element_id: li.id(), class_list: li.class_name() })
            .collect();
        PageScan { columns, triggers }
    }

    fn context_value(&self) -> Option<String> {
        let input = self.document.query_selector("input[name='widget_context']").ok().flatten()?;
        Some(input.dyn_into::<HtmlInputElement>().ok()?.value())
    }

    fn listen(&mut self, target: &Target) -> Option<ListenerKey> {
        let (element, event_type) = self.target_element(target)?;
        let routed = target.clone();
        let sink = Rc::clone(&self.sink);
        let retired = Rc::clone(&self.retired);
        let handler = Closure::wrap(Box::new(move |event: Event| {
            retired.borrow_mut().clear();
            let board_event = event_for(&routed, &event);
            let disposition = sink.borrow().as_ref().map_or(Disposition::PREVENT, |route| route(board_event));
            if disposition.prevent_default {
                event.prevent_default();
            }
        }) as Box<dyn FnMut(Event)>);

        element
            .add_event_listener_with_callback(event_type, handler.as_ref().unchecked_ref())
            .ok()?;
        self.next_key += 1;
        let key = ListenerKey(self.next_key);
        self.listeners.insert(key, Listener { element, event_type, handler });
        Some(key)
    }

    fn unlisten(&mut self, key: ListenerKey) {
        let Some(listener) = self.listeners.remove(&key) else {
            return;
        };
        let _ = listener
            .element
            .remove_event_listener_with_callback(listener.event_type, listener.handler.as_ref().unchecked_ref());
        self.retired.borrow_mut().push(listener.handler);
    }

    fn set_trigger_available(&mut self, trigger: &str, available: bool) {
        let Some(element) = self.element(trigger) else {
            return;
        };
        let (on, off) = if available {
            (ClassMarker::Available, ClassMarker::Unavailable)
        } else {
            (ClassMarker::Unavailable, ClassMarker::Available)
        };
        let classes = element.class_list();
        let _ = classes.remove_1(&self.codec.class(off));
        let _ = classes.add_1(&self.codec.class(on));
    }

    fn prepend_fragment(&mut self, column: &str, html: &str) -> Option<ScannedWidget> {
        let column = self.element(column)?;
        column.insert_adjacent_html("afterbegin", html).ok()?;
        let widget = column.first_element_child()?;
        Some(self.describe(&widget)).filter(|scanned| !scanned.element_id.is_empty())
    }

    fn remove_widget(&mut self, widget: &str) -> bool {
        let Some(element) = self.element(widget) else {
            return false;
        };
        element.remove();
        true
    }

    fn content_html(&self, widget: &str) -> Option<String> {
        Some(self.part(widget, ClassMarker::Content)?.inner_html())
    }

    fn set_content_html(&mut self, widget: &str, html: &str) {
        if let Some(content) = self.part(widget, ClassMarker::Content) {
            content.set_inner_html(html);
        }
    }

    fn slide_settings(&mut self, widget: &str, visible: bool) {
        self.set_display(widget, ClassMarker::EditPanel, visible);
    }

    fn slide_body(&mut self, widget: &str, visible: bool) {
        self.set_display(widget, ClassMarker::Body, visible);
    }

    fn set_collapse_marker(&mut self, widget: &str, collapsed: bool) {
        if let Some(button) = self.part(widget, ClassMarker::CollapseButton) {
            let _ = button
                .class_list()
                .toggle_with_force(&self.codec.class(ClassMarker::Collapsed), collapsed);
        }
    }

    fn drop_position(&self, widget: &str) -> Option<(String, usize)> {
        let column = self.element(widget)?.parent_element()?;
        let index = self.widgets_in(&column).iter().position(|w| w.id() == widget)?;
        Some((column.id(), index))
    }

    fn column_order(&self, column: &str) -> Vec<String> {
        self.element(column)
            .map(|column| self.widgets_in(&column).iter().map(Element::id).collect())
            .unwrap_or_default()
    }

    fn reset_drag_offset(&mut self, widget: &str) {
        let Some(element) = self.element(widget).and_then(|e| e.dyn_into::<HtmlElement>().ok()) else {
            return;
        };
        let style = element.style();
        let _ = style.set_property("top", "0");
        let _ = style.set_property("left", "0");
    }

    /// Columns without an id cannot be addressed later and are skipped.
    /// Heights are reported in the box `min-height` applies to.
    fn column_heights(&self, selector: &str) -> Vec<(String, f64)> {
        self.query_all(selector)
            .into_iter()
            .filter(|column| !column.id().is_empty())
            .filter_map(|column| column.dyn_into::<HtmlElement>().ok())
            .map(|column| (column.id(), self.column_box(&column).min_height_basis()))
            .collect()
    }

    fn set_min_height(&mut self, column: &str, px: f64) {
        if let Some(column) = self.element(column).and_then(|e| e.dyn_into::<HtmlElement>().ok()) {
            let _ = column.style().set_property("min-height", &format!("{px}px"));
        }
    }
}
