//! In-memory page for tests and non-browser hosts.
//!
//! DESIGN
//! ======
//! `MemoryPage` is a cheap clone handle over shared state, so a test can keep
//! one clone for driving gestures and inspecting markup while the board owns
//! another. Fragments are not parsed as HTML: the first `id` and `class`
//! attributes name the widget container, and any `id` carrying the delete
//! button prefix names its delete control. The whole fragment stands in for
//! the widget's content region until it is replaced.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use super::{BoardEvent, Control, ListenerKey, Page, PageScan, ScannedColumn, ScannedTrigger, ScannedWidget, Target};
use crate::util::ident::{ClassMarker, IdCodec, IdKind, has_token};

/// Offset the drag helper leaves on a dropped element.
const DRAG_ARTIFACT_OFFSET: (f64, f64) = (12.0, 30.0);

#[derive(Clone, Debug)]
struct MemWidget {
    element_id: String,
    class_list: String,
    delete_button_id: Option<String>,
    content: String,
    settings_visible: bool,
    body_visible: bool,
    collapse_marker: bool,
    drag_offset: Option<(f64, f64)>,
}

#[derive(Clone, Debug)]
struct MemColumn {
    element_id: String,
    widgets: Vec<MemWidget>,
    height: f64,
    min_height: Option<f64>,
}

#[derive(Clone, Debug)]
struct MemTrigger {
    element_id: String,
    class_list: String,
}

#[derive(Debug, Default)]
struct MemoryDom {
    codec: IdCodec,
    columns: Vec<MemColumn>,
    triggers: Vec<MemTrigger>,
    context: Option<String>,
    listeners: BTreeMap<ListenerKey, Target>,
    next_key: u64,
    form_fields: HashMap<String, Vec<(String, String)>>,
}

impl MemoryDom {
    fn widget(&self, id: &str) -> Option<&MemWidget> {
        self.columns.iter().flat_map(|c| c.widgets.iter()).find(|w| w.element_id == id)
    }

    fn widget_mut(&mut self, id: &str) -> Option<&mut MemWidget> {
        self.columns.iter_mut().flat_map(|c| c.widgets.iter_mut()).find(|w| w.element_id == id)
    }

    fn column_mut(&mut self, id: &str) -> Option<&mut MemColumn> {
        self.columns.iter_mut().find(|c| c.element_id == id)
    }

    fn take_widget(&mut self, id: &str) -> Option<MemWidget> {
        self.columns.iter_mut().find_map(|c| {
            let index = c.widgets.iter().position(|w| w.element_id == id)?;
            Some(c.widgets.remove(index))
        })
    }

    fn parse_fragment(&self, html: &str) -> Option<MemWidget> {
        let element_id = attr_values(html, "id").next()?.to_owned();
        let class_list = attr_values(html, "class").next().unwrap_or_default().to_owned();
        let delete_prefix = self.codec.prefix(IdKind::DeleteButton);
        let delete_button_id = attr_values(html, "id").find(|id| id.contains(&delete_prefix)).map(str::to_owned);
        let collapsed_token = self.codec.class(ClassMarker::Collapsed);
        let collapsed = attr_values(html, "class").any(|classes| has_token(classes, &collapsed_token));
        Some(MemWidget {
            element_id,
            class_list,
            delete_button_id,
            content: html.to_owned(),
            settings_visible: false,
            body_visible: !collapsed,
            collapse_marker: collapsed,
            drag_offset: None,
        })
    }

    fn target_exists(&self, target: &Target) -> bool {
        match target {
            Target::Trigger(id) => self.triggers.iter().any(|t| &t.element_id == id),
            Target::Control { widget, control } => self
                .widget(widget)
                .is_some_and(|w| *control != Control::DeleteButton || w.delete_button_id.is_some()),
        }
    }

    fn event_for(&self, target: &Target) -> Option<BoardEvent> {
        match target {
            Target::Trigger(id) => Some(BoardEvent::AddClicked { trigger: id.clone() }),
            Target::Control { widget, control } => {
                let w = self.widget(widget)?;
                let widget = widget.clone();
                Some(match control {
                    Control::DeleteButton => BoardEvent::DeleteClicked {
                        widget,
                        button: w.delete_button_id.clone().unwrap_or_default(),
                    },
                    Control::EditButton => BoardEvent::EditToggled { widget },
                    Control::CollapseButton => BoardEvent::CollapseToggled { widget },
                    Control::SettingsForm => BoardEvent::SettingsSubmitted {
                        fields: self.form_fields.get(&widget).cloned().unwrap_or_default(),
                        widget,
                    },
                })
            }
        }
    }
}

/// Values of every `name="..."` attribute in `html`, in document order.
fn attr_values<'a>(html: &'a str, name: &str) -> impl Iterator<Item = &'a str> {
    let needle = format!("{name}=\"");
    let mut rest = html;
    std::iter::from_fn(move || {
        loop {
            let found = rest.find(&needle)?;
            let preceded_by_space = rest[..found].chars().next_back().is_some_and(char::is_whitespace);
            let after = &rest[found + needle.len()..];
            let end = after.find('"')?;
            rest = &after[end + 1..];
            if preceded_by_space {
                return Some(&after[..end]);
            }
        }
    })
}

/// Shared in-memory page. Clones observe the same state.
#[derive(Clone, Debug, Default)]
pub struct MemoryPage {
    dom: Rc<RefCell<MemoryDom>>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(namespace: &str) -> Self {
        let page = Self::default();
        page.dom.borrow_mut().codec = IdCodec::new(namespace);
        page
    }

    // ---- building -------------------------------------------------------

    pub fn add_column(&self, element_id: &str) {
        self.dom.borrow_mut().columns.push(MemColumn {
            element_id: element_id.to_owned(),
            widgets: Vec::new(),
            height: 0.0,
            min_height: None,
        });
    }

    /// Append a server-rendered widget to the end of `column`.
    pub fn push_fragment(&self, column: &str, html: &str) {
        let mut dom = self.dom.borrow_mut();
        let Some(widget) = dom.parse_fragment(html) else {
            return;
        };
        if let Some(col) = dom.column_mut(column) {
            col.widgets.push(widget);
        }
    }

    pub fn add_trigger(&self, element_id: &str, class_list: &str) {
        self.dom.borrow_mut().triggers.push(MemTrigger {
            element_id: element_id.to_owned(),
            class_list: class_list.to_owned(),
        });
    }

    pub fn set_context(&self, context: &str) {
        self.dom.borrow_mut().context = Some(context.to_owned());
    }

    pub fn set_height(&self, column: &str, height: f64) {
        if let Some(col) = self.dom.borrow_mut().column_mut(column) {
            col.height = height;
        }
    }

    /// Fields the settings form of `widget` serializes to on submit.
    pub fn set_form_fields(&self, widget: &str, fields: Vec<(String, String)>) {
        self.dom.borrow_mut().form_fields.insert(widget.to_owned(), fields);
    }

    // ---- gestures -------------------------------------------------------

    /// One event per listener attached to `target`.
    #[must_use]
    pub fn fire(&self, target: &Target) -> Vec<BoardEvent> {
        let dom = self.dom.borrow();
        dom.listeners
            .values()
            .filter(|t| *t == target)
            .filter_map(|t| dom.event_for(t))
            .collect()
    }

    #[must_use]
    pub fn click_trigger(&self, trigger: &str) -> Vec<BoardEvent> {
        self.fire(&Target::Trigger(trigger.to_owned()))
    }

    #[must_use]
    pub fn click(&self, widget: &str, control: Control) -> Vec<BoardEvent> {
        self.fire(&Target::Control { widget: widget.to_owned(), control })
    }

    /// Drop `widget` at `index` of `column` the way the drag helper would,
    /// leaving its stray offset behind.
    #[must_use]
    pub fn drag(&self, widget: &str, column: &str, index: usize) -> Option<BoardEvent> {
        let mut dom = self.dom.borrow_mut();
        if !dom.columns.iter().any(|c| c.element_id == column) {
            return None;
        }
        let mut moved = dom.take_widget(widget)?;
        moved.drag_offset = Some(DRAG_ARTIFACT_OFFSET);
        let col = dom.column_mut(column)?;
        let index = index.min(col.widgets.len());
        col.widgets.insert(index, moved);
        Some(BoardEvent::DragStopped { widget: widget.to_owned() })
    }

    // ---- inspection -----------------------------------------------------

    #[must_use]
    pub fn widget_ids(&self, column: &str) -> Vec<String> {
        self.dom
            .borrow()
            .columns
            .iter()
            .find(|c| c.element_id == column)
            .map(|c| c.widgets.iter().map(|w| w.element_id.clone()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_widget(&self, widget: &str) -> bool {
        self.dom.borrow().widget(widget).is_some()
    }

    #[must_use]
    pub fn trigger_classes(&self, trigger: &str) -> Option<String> {
        self.dom
            .borrow()
            .triggers
            .iter()
            .find(|t| t.element_id == trigger)
            .map(|t| t.class_list.clone())
    }

    #[must_use]
    pub fn listener_count(&self, target: &Target) -> usize {
        self.dom.borrow().listeners.values().filter(|t| *t == target).count()
    }

    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.dom.borrow().listeners.len()
    }

    #[must_use]
    pub fn content(&self, widget: &str) -> Option<String> {
        self.dom.borrow().widget(widget).map(|w| w.content.clone())
    }

    #[must_use]
    pub fn settings_visible(&self, widget: &str) -> Option<bool> {
        self.dom.borrow().widget(widget).map(|w| w.settings_visible)
    }

    #[must_use]
    pub fn body_visible(&self, widget: &str) -> Option<bool> {
        self.dom.borrow().widget(widget).map(|w| w.body_visible)
    }

    #[must_use]
    pub fn collapse_marker(&self, widget: &str) -> Option<bool> {
        self.dom.borrow().widget(widget).map(|w| w.collapse_marker)
    }

    #[must_use]
    pub fn drag_offset(&self, widget: &str) -> Option<(f64, f64)> {
        self.dom.borrow().widget(widget).and_then(|w| w.drag_offset)
    }

    #[must_use]
    pub fn min_height(&self, column: &str) -> Option<f64> {
        self.dom
            .borrow()
            .columns
            .iter()
            .find(|c| c.element_id == column)
            .and_then(|c| c.min_height)
    }
}

impl Page for MemoryPage {
    fn has_widget_area(&self) -> bool {
        !self.dom.borrow().columns.is_empty()
    }

    fn scan(&self) -> PageScan {
        let dom = self.dom.borrow();
        PageScan {
            columns: dom
                .columns
                .iter()
                .map(|c| ScannedColumn {
                    element_id: c.element_id.clone(),
                    widgets: c
                        .widgets
                        .iter()
                        .map(|w| ScannedWidget {
                            element_id: w.element_id.clone(),
                            class_list: w.class_list.clone(),
                            collapsed: w.collapse_marker,
                        })
                        .collect(),
                })
                .collect(),
            triggers: dom
                .triggers
                .iter()
                .map(|t| ScannedTrigger { element_id: t.element_id.clone(), class_list: t.class_list.clone() })
                .collect(),
        }
    }

    fn context_value(&self) -> Option<String> {
        self.dom.borrow().context.clone()
    }

    fn listen(&mut self, target: &Target) -> Option<ListenerKey> {
        let mut dom = self.dom.borrow_mut();
        if !dom.target_exists(target) {
            return None;
        }
        dom.next_key += 1;
        let key = ListenerKey(dom.next_key);
        dom.listeners.insert(key, target.clone());
        Some(key)
    }

    fn unlisten(&mut self, key: ListenerKey) {
        self.dom.borrow_mut().listeners.remove(&key);
    }

    fn set_trigger_available(&mut self, trigger: &str, available: bool) {
        let mut dom = self.dom.borrow_mut();
        let on = dom.codec.class(if available { ClassMarker::Available } else { ClassMarker::Unavailable });
        let off = dom.codec.class(if available { ClassMarker::Unavailable } else { ClassMarker::Available });
        let Some(t) = dom.triggers.iter_mut().find(|t| t.element_id == trigger) else {
            return;
        };
        let mut tokens: Vec<&str> = t.class_list.split_whitespace().filter(|c| *c != off && *c != on).collect();
        tokens.push(&on);
        t.class_list = tokens.join(" ");
    }

    fn prepend_fragment(&mut self, column: &str, html: &str) -> Option<ScannedWidget> {
        let mut dom = self.dom.borrow_mut();
        let widget = dom.parse_fragment(html)?;
        let scanned = ScannedWidget {
            element_id: widget.element_id.clone(),
            class_list: widget.class_list.clone(),
            collapsed: widget.collapse_marker,
        };
        dom.column_mut(column)?.widgets.insert(0, widget);
        Some(scanned)
    }

    fn remove_widget(&mut self, widget: &str) -> bool {
        self.dom.borrow_mut().take_widget(widget).is_some()
    }

    fn content_html(&self, widget: &str) -> Option<String> {
        self.content(widget)
    }

    fn set_content_html(&mut self, widget: &str, html: &str) {
        if let Some(w) = self.dom.borrow_mut().widget_mut(widget) {
            w.content = html.to_owned();
        }
    }

    fn slide_settings(&mut self, widget: &str, visible: bool) {
        if let Some(w) = self.dom.borrow_mut().widget_mut(widget) {
            w.settings_visible = visible;
        }
    }

    fn slide_body(&mut self, widget: &str, visible: bool) {
        if let Some(w) = self.dom.borrow_mut().widget_mut(widget) {
            w.body_visible = visible;
        }
    }

    fn set_collapse_marker(&mut self, widget: &str, collapsed: bool) {
        if let Some(w) = self.dom.borrow_mut().widget_mut(widget) {
            w.collapse_marker = collapsed;
        }
    }

    fn drop_position(&self, widget: &str) -> Option<(String, usize)> {
        let dom = self.dom.borrow();
        dom.columns.iter().find_map(|c| {
            let index = c.widgets.iter().position(|w| w.element_id == widget)?;
            Some((c.element_id.clone(), index))
        })
    }

    fn column_order(&self, column: &str) -> Vec<String> {
        self.widget_ids(column)
    }

    fn reset_drag_offset(&mut self, widget: &str) {
        if let Some(w) = self.dom.borrow_mut().widget_mut(widget) {
            w.drag_offset = Some((0.0, 0.0));
        }
    }

    /// Every column matches; the memory page has no other containers.
    fn column_heights(&self, _selector: &str) -> Vec<(String, f64)> {
        self.dom
            .borrow()
            .columns
            .iter()
            .map(|c| (c.element_id.clone(), c.height))
            .collect()
    }

    fn set_min_height(&mut self, column: &str, px: f64) {
        if let Some(col) = self.dom.borrow_mut().column_mut(column) {
            col.min_height = Some(px);
        }
    }
}
