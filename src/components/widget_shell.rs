//! Add panel and column containers.

#[cfg(test)]
#[path = "widget_shell_test.rs"]
mod widget_shell_test;

use leptos::prelude::*;

use crate::config::BoardConfig;
use crate::state::ids::{ColumnId, WidgetTypeId};
use crate::util::ident::{ClassMarker, IdCodec, IdKind};

/// One entry of the add panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerSpec {
    pub type_id: WidgetTypeId,
    pub label: String,
    pub multiple: bool,
    pub available: bool,
}

/// Class list of a trigger: exactly one availability marker, plus the
/// multiple marker when the type allows several instances.
#[must_use]
pub fn trigger_class_list(codec: &IdCodec, multiple: bool, available: bool) -> String {
    let state = if available { ClassMarker::Available } else { ClassMarker::Unavailable };
    let mut classes = vec![codec.class(state)];
    if multiple {
        classes.push(codec.class(ClassMarker::Multiple));
    }
    classes.join(" ")
}

/// Serialized config for the `data-widget-config` attribute.
#[must_use]
pub fn config_attribute(config: &BoardConfig) -> String {
    serde_json::to_string(config).unwrap_or_default()
}

/// Add panel listing every widget type. Carries the board config for the
/// browser bootstrap.
#[component]
pub fn AddPanel(config: BoardConfig, triggers: Vec<TriggerSpec>) -> impl IntoView {
    let codec = config.codec();
    let panel_class = codec.class(ClassMarker::AddPanel);
    let config_json = config_attribute(&config);
    let items = triggers
        .into_iter()
        .map(|trigger| {
            let id = codec.encode(IdKind::WidgetType, trigger.type_id.as_str());
            let class = trigger_class_list(&codec, trigger.multiple, trigger.available);
            view! {
                <li id=id class=class>
                    <span>{trigger.label}</span>
                </li>
            }
        })
        .collect_view();

    view! {
        <div class=panel_class data-widget-config=config_json>
            <ul>{items}</ul>
        </div>
    }
}

/// Empty column containers plus the hidden page-context input.
#[component]
pub fn WidgetColumns(config: BoardConfig, columns: Vec<ColumnId>, context: Option<String>) -> impl IntoView {
    let codec = config.codec();
    let column_class = codec.class(ClassMarker::Columns);
    let containers = columns
        .into_iter()
        .map(|column| {
            let id = codec.encode(IdKind::Column, column.as_str());
            view! { <div id=id class=column_class.clone()></div> }
        })
        .collect_view();

    view! {
        {context.map(|value| view! { <input type="hidden" name="widget_context" value=value /> })}
        {containers}
    }
}
