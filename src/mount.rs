//! Browser bootstrap.
//!
//! SYSTEM CONTEXT
//! ==============
//! The page calls `init_widgets()` once its markup is in place. The board is
//! built over the live document, page listeners are routed to it through a
//! weak handle, and JS keeps the returned [`BoardHandle`] for the
//! drag-and-drop collaborator's stop hook.

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::board::WidgetBoard;
use crate::config::BoardConfig;
use crate::dom::web::WebPage;
use crate::dom::{BoardEvent, Disposition};
use crate::net::api::GlooTransport;

const CONFIG_ATTRIBUTE: &str = "data-widget-config";

/// JS-facing handle to the page's board.
#[wasm_bindgen]
pub struct BoardHandle {
    board: WidgetBoard<WebPage>,
}

#[wasm_bindgen]
impl BoardHandle {
    /// Drop of `item_id` finished; sync its new placement.
    pub fn drag_stop(&self, item_id: &str) {
        self.board.handle(BoardEvent::DragStopped { widget: item_id.to_owned() });
    }

    /// Re-level column heights, e.g. after the page resized.
    pub fn level_heights(&self) {
        self.board.level_heights();
    }

    /// Resend failed requests; returns how many went out.
    pub fn retry_failed(&self) -> usize {
        self.board.retry_failed()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.board.failures().len()
    }
}

fn read_config(document: &web_sys::Document) -> BoardConfig {
    let raw = document
        .query_selector(&format!("[{CONFIG_ATTRIBUTE}]"))
        .ok()
        .flatten()
        .and_then(|element| element.get_attribute(CONFIG_ATTRIBUTE));
    BoardConfig::from_attribute(raw.as_deref())
}

/// Build the board for the current page. Returns `undefined` when the page
/// has no widget area.
#[wasm_bindgen]
pub fn init_widgets() -> Option<BoardHandle> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let document = web_sys::window()?.document()?;
    let config = read_config(&document);
    let page = WebPage::new(document, &config);
    let sink = page.event_sink();
    let transport = Rc::new(GlooTransport::from_config(&config));

    let Some(board) = WidgetBoard::init(page, transport, config) else {
        log::info!("no widget area on this page");
        return None;
    };

    let weak = board.downgrade();
    *sink.borrow_mut() = Some(Box::new(move |event: BoardEvent| {
        weak.upgrade().map_or(Disposition::PASS, |board| board.handle(event))
    }));
    Some(BoardHandle { board })
}
