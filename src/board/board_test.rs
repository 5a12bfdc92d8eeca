use super::*;
use crate::dom::Control;
use crate::dom::Target;
use crate::dom::memory::MemoryPage;
use crate::net::recording::RecordingTransport;
use crate::net::types::{ActionError, ActionRequest};

fn widget(id: u32, type_id: &str) -> String {
    format!(
        r##"<div id="elgg-widget-{id}" class="elgg-module elgg-widget elgg-widget-instance-{type_id}"><a id="elgg-widget-delete-button-{id}" class="elgg-widget-delete-button" href="#">x</a><div class="elgg-widget-content">{type_id} body</div></div>"##
    )
}

struct Fixture {
    page: MemoryPage,
    transport: RecordingTransport,
    board: WidgetBoard<MemoryPage>,
}

impl Fixture {
    /// Route every event the page produced to the board.
    fn route(&self, events: Vec<BoardEvent>) -> Vec<Disposition> {
        events.into_iter().map(|event| self.board.handle(event)).collect()
    }

    fn click_trigger(&self, trigger: &str) -> Vec<Disposition> {
        self.route(self.page.click_trigger(trigger))
    }

    fn click(&self, widget: &str, control: Control) -> Vec<Disposition> {
        self.route(self.page.click(widget, control))
    }

    fn drag(&self, widget: &str, column: &str, index: usize) -> Disposition {
        let event = self.page.drag(widget, column, index).expect("drag target exists");
        self.board.handle(event)
    }
}

/// Column 1 holds calendar(7) and blog(42); column 2 holds notes(3) and
/// blog(9). Calendar and profile are single-instance, blog is multiple.
fn seeded_page() -> MemoryPage {
    let page = MemoryPage::new();
    page.add_column("elgg-widget-col-1");
    page.add_column("elgg-widget-col-2");
    page.push_fragment("elgg-widget-col-1", &widget(7, "calendar"));
    page.push_fragment("elgg-widget-col-1", &widget(42, "blog"));
    page.push_fragment("elgg-widget-col-2", &widget(3, "notes"));
    page.push_fragment("elgg-widget-col-2", &widget(9, "blog"));
    page.add_trigger("elgg-widget-type-calendar", "elgg-widget-unavailable");
    page.add_trigger("elgg-widget-type-profile", "elgg-widget-available");
    page.add_trigger("elgg-widget-type-blog", "elgg-widget-available elgg-widget-multiple");
    page.set_context("dashboard");
    page
}

fn fixture_with(config: BoardConfig) -> Fixture {
    let page = seeded_page();
    let transport = RecordingTransport::default();
    let board = WidgetBoard::init(page.clone(), Rc::new(transport.clone()), config).expect("page has columns");
    Fixture { page, transport, board }
}

fn fixture() -> Fixture {
    fixture_with(BoardConfig::default())
}

fn trigger_target(type_id: &str) -> Target {
    Target::Trigger(format!("elgg-widget-type-{type_id}"))
}

// =============================================================
// Init
// =============================================================

#[test]
fn init_without_columns_is_inert() {
    let page = MemoryPage::new();
    page.add_trigger("elgg-widget-type-profile", "elgg-widget-available");
    let transport = RecordingTransport::default();

    let board = WidgetBoard::init(page.clone(), Rc::new(transport.clone()), BoardConfig::default());

    assert!(board.is_none());
    assert_eq!(page.total_listeners(), 0);
    assert_eq!(page.trigger_classes("elgg-widget-type-profile").as_deref(), Some("elgg-widget-available"));
    assert_eq!(transport.sent(), 0);
}

#[test]
fn init_builds_layout_from_page() {
    let f = fixture();
    let layout = f.board.layout();
    assert_eq!(
        layout.snapshot(),
        vec![
            (ColumnId::from("1"), vec![WidgetInstanceId::from("7"), WidgetInstanceId::from("42")]),
            (ColumnId::from("2"), vec![WidgetInstanceId::from("3"), WidgetInstanceId::from("9")]),
        ]
    );
    let blog = f.board.instance(&"42".into()).unwrap();
    assert_eq!(blog.type_id, WidgetTypeId::from("blog"));
    assert_eq!(blog.position, 1);
}

#[test]
fn init_binds_available_triggers_only() {
    let f = fixture();
    assert_eq!(f.page.listener_count(&trigger_target("profile")), 1);
    assert_eq!(f.page.listener_count(&trigger_target("blog")), 1);
    assert_eq!(f.page.listener_count(&trigger_target("calendar")), 0);
    assert!(f.board.is_available(&"profile".into()));
    assert!(!f.board.is_available(&"calendar".into()));
}

#[test]
fn init_binds_every_widget_control() {
    let f = fixture();
    for id in ["7", "42", "3", "9"] {
        assert_eq!(f.board.bound_controls(&id.into()), Control::ALL.len());
    }
}

#[test]
fn init_reenables_single_trigger_with_no_instance() {
    let page = seeded_page();
    page.add_trigger("elgg-widget-type-weather", "elgg-widget-unavailable");
    let board = WidgetBoard::init(page.clone(), Rc::new(RecordingTransport::default()), BoardConfig::default()).unwrap();
    assert!(board.is_available(&"weather".into()));
    assert_eq!(page.trigger_classes("elgg-widget-type-weather").as_deref(), Some("elgg-widget-available"));
}

#[test]
fn init_skips_widgets_without_type_marker() {
    let page = seeded_page();
    page.push_fragment("elgg-widget-col-2", r#"<div id="elgg-widget-77" class="elgg-widget"></div>"#);
    let board = WidgetBoard::init(page, Rc::new(RecordingTransport::default()), BoardConfig::default()).unwrap();
    assert!(board.instance(&"77".into()).is_none());
    assert_eq!(board.layout().len(), 4);
}

#[test]
fn init_levels_columns() {
    let page = seeded_page();
    page.set_height("elgg-widget-col-1", 300.0);
    page.set_height("elgg-widget-col-2", 120.0);
    let _board = WidgetBoard::init(page.clone(), Rc::new(RecordingTransport::default()), BoardConfig::default());
    assert_eq!(page.min_height("elgg-widget-col-1"), Some(300.0));
    assert_eq!(page.min_height("elgg-widget-col-2"), Some(300.0));
}

#[test]
fn custom_namespace_reads_its_own_markers() {
    let page = MemoryPage::with_namespace("hub");
    page.add_column("hub-widget-col-main");
    page.push_fragment("hub-widget-col-main", r#"<div id="hub-widget-5" class="hub-widget hub-widget-instance-clock"></div>"#);
    page.add_trigger("hub-widget-type-clock", "hub-widget-unavailable");
    let config = BoardConfig { namespace: "hub".into(), add_column: "main".into(), ..BoardConfig::default() };

    let board = WidgetBoard::init(page, Rc::new(RecordingTransport::default()), config).unwrap();

    assert_eq!(board.instance(&"5".into()).unwrap().column, ColumnId::from("main"));
    assert!(!board.is_available(&"clock".into()));
}

// =============================================================
// Add
// =============================================================

#[test]
fn add_sends_request_and_detaches_single_trigger() {
    let f = fixture();

    let dispositions = f.click_trigger("elgg-widget-type-profile");

    assert_eq!(dispositions, vec![Disposition::PREVENT]);
    assert_eq!(
        f.transport.requests(),
        vec![ActionRequest::Add {
            handler: "profile".into(),
            user_guid: None,
            context: Some("dashboard".into()),
        }]
    );
    let classes = f.page.trigger_classes("elgg-widget-type-profile").unwrap();
    assert!(classes.contains("elgg-widget-unavailable"));
    assert!(!classes.contains("elgg-widget-available"));
    assert!(f.page.click_trigger("elgg-widget-type-profile").is_empty());
}

#[test]
fn add_carries_configured_user_guid() {
    let config = BoardConfig { user_guid: Some("1001".into()), ..BoardConfig::default() };
    let f = fixture_with(config);
    f.click_trigger("elgg-widget-type-blog");
    let Some(ActionRequest::Add { user_guid, .. }) = f.transport.last() else {
        panic!("expected an add request");
    };
    assert_eq!(user_guid.as_deref(), Some("1001"));
}

#[test]
fn add_success_prepends_widget_to_add_column() {
    let f = fixture();
    f.click_trigger("elgg-widget-type-profile");

    f.transport.succeed_with(0, &widget(50, "profile"));

    assert_eq!(
        f.page.widget_ids("elgg-widget-col-1"),
        ["elgg-widget-50", "elgg-widget-7", "elgg-widget-42"]
    );
    let added = f.board.instance(&"50".into()).unwrap();
    assert_eq!(added.column, ColumnId::from("1"));
    assert_eq!(added.position, 0);
    assert_eq!(f.board.instance(&"7".into()).unwrap().position, 1);
    assert_eq!(f.board.bound_controls(&"50".into()), Control::ALL.len());
    assert!(!f.board.is_available(&"profile".into()));
    assert!(f.page.click_trigger("elgg-widget-type-profile").is_empty());
    assert_eq!(f.board.in_flight(), 0);
}

#[test]
fn added_widget_controls_work() {
    let f = fixture();
    f.click_trigger("elgg-widget-type-profile");
    f.transport.succeed_with(0, &widget(50, "profile"));

    f.click("elgg-widget-50", Control::DeleteButton);

    assert!(!f.page.has_widget("elgg-widget-50"));
    assert_eq!(f.transport.last(), Some(ActionRequest::Remove { guid: "50".into() }));
}

#[test]
fn add_to_configured_column() {
    let config = BoardConfig { add_column: "2".into(), ..BoardConfig::default() };
    let f = fixture_with(config);
    f.click_trigger("elgg-widget-type-blog");
    f.transport.succeed_with(0, &widget(60, "blog"));
    assert_eq!(f.page.widget_ids("elgg-widget-col-2")[0], "elgg-widget-60");
}

#[test]
fn multiple_type_stays_available_across_adds() {
    let f = fixture();
    f.click_trigger("elgg-widget-type-blog");
    f.click_trigger("elgg-widget-type-blog");
    assert_eq!(f.transport.sent(), 2);
    assert!(f.board.is_available(&"blog".into()));
    assert_eq!(f.page.listener_count(&trigger_target("blog")), 1);
}

#[test]
fn add_failure_restores_trigger_and_is_retryable() {
    let f = fixture();
    f.click_trigger("elgg-widget-type-profile");

    f.transport.fail(0);

    assert!(f.board.is_available(&"profile".into()));
    assert_eq!(f.page.listener_count(&trigger_target("profile")), 1);
    let failures = f.board.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error, ActionError::Status(500));
    assert!(matches!(failures[0].request, ActionRequest::Add { .. }));

    assert_eq!(f.board.retry_failed(), 1);
    assert!(f.board.failures().is_empty());
    assert_eq!(f.transport.sent(), 2);
    assert!(!f.board.is_available(&"profile".into()));
    assert_eq!(
        f.transport.last(),
        Some(ActionRequest::Add { handler: "profile".into(), user_guid: None, context: Some("dashboard".into()) })
    );
}

#[test]
fn add_without_markup_is_recorded_and_releases_trigger() {
    let f = fixture();
    f.click_trigger("elgg-widget-type-profile");

    f.transport.succeed(0);

    assert_eq!(f.board.failures()[0].error, ActionError::MissingOutput);
    assert!(f.board.is_available(&"profile".into()));
    assert_eq!(f.page.widget_ids("elgg-widget-col-1").len(), 2);
}

#[test]
fn add_of_unknown_type_sends_nothing() {
    let f = fixture();
    let disposition = f.board.handle(BoardEvent::AddClicked { trigger: "elgg-widget-type-ghost".into() });
    assert_eq!(disposition, Disposition::PREVENT);
    assert_eq!(f.transport.sent(), 0);
}

#[test]
fn malformed_trigger_id_sends_nothing() {
    let f = fixture();
    f.board.handle(BoardEvent::AddClicked { trigger: "sidebar-item".into() });
    assert_eq!(f.transport.sent(), 0);
}

#[test]
fn completion_after_board_is_dropped_does_nothing() {
    let Fixture { page, transport, board } = fixture();
    board.handle(BoardEvent::AddClicked { trigger: "elgg-widget-type-profile".into() });
    drop(board);

    transport.succeed_with(0, &widget(50, "profile"));

    assert!(!page.has_widget("elgg-widget-50"));
}

#[test]
fn weak_handle_follows_board_lifetime() {
    let Fixture { board, .. } = fixture();
    let weak = board.downgrade();
    assert!(weak.upgrade().is_some());
    drop(board);
    assert!(weak.upgrade().is_none());
}

// =============================================================
// Move
// =============================================================

#[test]
fn drop_sends_move_with_new_placement() {
    let f = fixture();

    let disposition = f.drag("elgg-widget-42", "elgg-widget-col-2", 1);

    assert_eq!(disposition, Disposition::PASS);
    assert_eq!(
        f.transport.last(),
        Some(ActionRequest::Move { guid: "42".into(), column: "2".into(), position: 1 })
    );
    assert_eq!(f.page.drag_offset("elgg-widget-42"), Some((0.0, 0.0)));
    assert_eq!(
        f.board.layout().snapshot(),
        vec![
            (ColumnId::from("1"), vec![WidgetInstanceId::from("7")]),
            (
                ColumnId::from("2"),
                vec![WidgetInstanceId::from("3"), WidgetInstanceId::from("42"), WidgetInstanceId::from("9")]
            ),
        ]
    );
    assert!(f.board.layout().is_compact());
}

#[test]
fn drop_within_column_reorders() {
    let f = fixture();
    f.drag("elgg-widget-7", "elgg-widget-col-1", 1);
    assert_eq!(
        f.transport.last(),
        Some(ActionRequest::Move { guid: "7".into(), column: "1".into(), position: 1 })
    );
    assert_eq!(f.board.instance(&"42".into()).unwrap().position, 0);
}

#[test]
fn moves_of_one_widget_coalesce() {
    let f = fixture();
    f.drag("elgg-widget-42", "elgg-widget-col-2", 0);
    f.drag("elgg-widget-42", "elgg-widget-col-1", 0);
    f.drag("elgg-widget-42", "elgg-widget-col-2", 2);
    assert_eq!(f.transport.sent(), 1);

    f.transport.succeed(0);

    assert_eq!(f.transport.sent(), 2);
    assert_eq!(
        f.transport.last(),
        Some(ActionRequest::Move { guid: "42".into(), column: "2".into(), position: 2 })
    );
    assert_eq!(f.board.in_flight(), 1);
}

#[test]
fn moves_of_different_widgets_do_not_coalesce() {
    let f = fixture();
    f.drag("elgg-widget-42", "elgg-widget-col-2", 0);
    f.drag("elgg-widget-9", "elgg-widget-col-1", 0);
    assert_eq!(f.transport.sent(), 2);
}

#[test]
fn failed_move_retries_with_current_placement() {
    let f = fixture();
    f.drag("elgg-widget-42", "elgg-widget-col-2", 0);
    f.transport.fail(0);
    assert_eq!(f.board.failures().len(), 1);

    f.drag("elgg-widget-3", "elgg-widget-col-1", 0);
    assert_eq!(f.board.retry_failed(), 1);

    assert_eq!(
        f.transport.last(),
        Some(ActionRequest::Move { guid: "42".into(), column: "2".into(), position: 0 })
    );
}

#[test]
fn move_position_is_the_displayed_index() {
    let page = seeded_page();
    page.push_fragment("elgg-widget-col-2", r#"<div id="elgg-widget-77" class="elgg-widget"></div>"#);
    let transport = RecordingTransport::default();
    let board = WidgetBoard::init(page.clone(), Rc::new(transport.clone()), BoardConfig::default()).unwrap();

    let event = page.drag("elgg-widget-42", "elgg-widget-col-2", 3).unwrap();
    board.handle(event);

    assert_eq!(
        transport.last(),
        Some(ActionRequest::Move { guid: "42".into(), column: "2".into(), position: 3 })
    );
    assert_eq!(board.instance(&"42".into()).unwrap().position, 2);
}

#[test]
fn drop_of_unknown_widget_sends_nothing() {
    let f = fixture();
    let disposition = f.board.handle(BoardEvent::DragStopped { widget: "elgg-widget-999".into() });
    assert_eq!(disposition, Disposition::PASS);
    assert_eq!(f.transport.sent(), 0);
}

// =============================================================
// Remove
// =============================================================

#[test]
fn delete_removes_widget_before_confirmation() {
    let f = fixture();

    let dispositions = f.click("elgg-widget-7", Control::DeleteButton);

    assert_eq!(dispositions, vec![Disposition::PREVENT]);
    assert!(!f.page.has_widget("elgg-widget-7"));
    assert_eq!(f.transport.last(), Some(ActionRequest::Remove { guid: "7".into() }));
    assert!(f.board.instance(&"7".into()).is_none());
    assert_eq!(f.board.instance(&"42".into()).unwrap().position, 0);
    assert_eq!(f.board.bound_controls(&"7".into()), 0);
}

#[test]
fn delete_reenables_single_trigger_once() {
    let f = fixture();

    f.click("elgg-widget-7", Control::DeleteButton);

    let classes = f.page.trigger_classes("elgg-widget-type-calendar").unwrap();
    assert!(classes.contains("elgg-widget-available"));
    assert!(!classes.contains("elgg-widget-unavailable"));
    assert_eq!(f.page.listener_count(&trigger_target("calendar")), 1);

    // A second delete of the same widget is rejected and binds nothing.
    f.board.handle(BoardEvent::DeleteClicked {
        widget: "elgg-widget-7".into(),
        button: "elgg-widget-delete-button-7".into(),
    });
    assert_eq!(f.page.listener_count(&trigger_target("calendar")), 1);
    assert_eq!(f.page.click_trigger("elgg-widget-type-calendar").len(), 1);
    assert_eq!(f.transport.sent(), 1);
}

#[test]
fn delete_of_one_multiple_instance_leaves_trigger_alone() {
    let f = fixture();
    let before = f.page.total_listeners();
    f.click("elgg-widget-9", Control::DeleteButton);
    assert_eq!(f.page.listener_count(&trigger_target("blog")), 1);
    assert_eq!(f.page.total_listeners(), before - Control::ALL.len());
}

#[test]
fn delete_drops_queued_move() {
    let f = fixture();
    f.drag("elgg-widget-42", "elgg-widget-col-2", 0);
    f.drag("elgg-widget-42", "elgg-widget-col-1", 0);
    f.click("elgg-widget-42", Control::DeleteButton);
    assert_eq!(f.transport.sent(), 2);

    f.transport.succeed(0);

    assert_eq!(f.transport.sent(), 2);
    assert_eq!(f.transport.last(), Some(ActionRequest::Remove { guid: "42".into() }));
}

#[test]
fn failed_delete_is_recorded_and_retried() {
    let f = fixture();
    f.click("elgg-widget-7", Control::DeleteButton);
    f.transport.fail(0);
    assert!(!f.page.has_widget("elgg-widget-7"));

    assert_eq!(f.board.retry_failed(), 1);
    assert_eq!(f.transport.last(), Some(ActionRequest::Remove { guid: "7".into() }));
}

// =============================================================
// Settings, edit and collapse
// =============================================================

#[test]
fn edit_toggle_reveals_and_hides_settings() {
    let f = fixture();
    f.click("elgg-widget-3", Control::EditButton);
    assert_eq!(f.page.settings_visible("elgg-widget-3"), Some(true));
    assert!(f.board.instance(&"3".into()).unwrap().edit_open);

    f.click("elgg-widget-3", Control::EditButton);
    assert_eq!(f.page.settings_visible("elgg-widget-3"), Some(false));
    assert_eq!(f.transport.sent(), 0);
}

#[test]
fn collapse_toggle_is_local() {
    let f = fixture();

    assert_eq!(f.click("elgg-widget-7", Control::CollapseButton), vec![Disposition::PREVENT]);
    assert_eq!(f.page.collapse_marker("elgg-widget-7"), Some(true));
    assert_eq!(f.page.body_visible("elgg-widget-7"), Some(false));
    assert!(f.board.instance(&"7".into()).unwrap().collapsed);

    f.click("elgg-widget-7", Control::CollapseButton);
    assert_eq!(f.page.collapse_marker("elgg-widget-7"), Some(false));
    assert_eq!(f.page.body_visible("elgg-widget-7"), Some(true));
    assert_eq!(f.transport.sent(), 0);
}

#[test]
fn settings_submit_shows_loading_then_saved_markup() {
    let f = fixture();
    let fields = vec![("guid".to_owned(), "3".to_owned()), ("title".to_owned(), "Notes".to_owned())];
    f.page.set_form_fields("elgg-widget-3", fields.clone());
    f.click("elgg-widget-3", Control::EditButton);

    let dispositions = f.click("elgg-widget-3", Control::SettingsForm);

    assert_eq!(dispositions, vec![Disposition::PREVENT]);
    assert_eq!(f.page.content("elgg-widget-3").as_deref(), Some("loading"));
    assert_eq!(f.page.settings_visible("elgg-widget-3"), Some(false));
    assert_eq!(
        f.transport.last(),
        Some(ActionRequest::SaveSettings { guid: Some("3".into()), fields })
    );

    f.transport.succeed_with(0, "<p>My notes</p>");
    assert_eq!(f.page.content("elgg-widget-3").as_deref(), Some("<p>My notes</p>"));
}

#[test]
fn settings_placeholder_is_configurable() {
    let config = BoardConfig { loading_placeholder: "<div class=\"elgg-ajax-loader\"></div>".into(), ..BoardConfig::default() };
    let f = fixture_with(config);
    f.click("elgg-widget-3", Control::SettingsForm);
    assert_eq!(f.page.content("elgg-widget-3").as_deref(), Some("<div class=\"elgg-ajax-loader\"></div>"));
}

#[test]
fn failed_save_restores_previous_content() {
    let f = fixture();
    let before = f.page.content("elgg-widget-3");
    f.click("elgg-widget-3", Control::SettingsForm);

    f.transport.fail(0);

    assert_eq!(f.page.content("elgg-widget-3"), before);
    assert_eq!(f.board.failures().len(), 1);
}

#[test]
fn failed_resubmit_keeps_content_of_earlier_save() {
    let f = fixture();
    f.click("elgg-widget-3", Control::SettingsForm);
    f.click("elgg-widget-3", Control::SettingsForm);
    assert_eq!(f.transport.sent(), 2);

    f.transport.succeed_with(0, "<p>saved</p>");
    f.transport.fail(1);

    assert_eq!(f.page.content("elgg-widget-3").as_deref(), Some("<p>saved</p>"));
}

#[test]
fn failed_resubmit_before_first_reply_waits_for_it() {
    let f = fixture();
    let before = f.page.content("elgg-widget-3");
    f.click("elgg-widget-3", Control::SettingsForm);
    f.click("elgg-widget-3", Control::SettingsForm);

    f.transport.fail(1);
    assert_eq!(f.page.content("elgg-widget-3").as_deref(), Some("loading"));

    f.transport.fail(0);
    assert_eq!(f.page.content("elgg-widget-3"), before);
}

#[test]
fn save_without_markup_restores_content_and_is_recorded() {
    let f = fixture();
    let before = f.page.content("elgg-widget-3");
    f.click("elgg-widget-3", Control::SettingsForm);

    f.transport.succeed(0);

    assert_eq!(f.page.content("elgg-widget-3"), before);
    assert_eq!(f.board.failures().len(), 1);
    assert_eq!(f.board.failures()[0].error, ActionError::MissingOutput);

    assert_eq!(f.board.retry_failed(), 1);
    assert_eq!(f.page.content("elgg-widget-3").as_deref(), Some("loading"));
    assert_eq!(f.transport.last().map(|r| r.kind()), Some(crate::net::types::ActionKind::SaveSettings));
}

// =============================================================
// Heights
// =============================================================

#[test]
fn layout_change_relevels_when_enabled() {
    let config = BoardConfig { relevel_on_change: true, ..BoardConfig::default() };
    let f = fixture_with(config);
    f.page.set_height("elgg-widget-col-2", 500.0);

    f.click("elgg-widget-7", Control::DeleteButton);

    assert_eq!(f.page.min_height("elgg-widget-col-1"), Some(500.0));
}

#[test]
fn layout_change_keeps_heights_by_default() {
    let f = fixture();
    f.page.set_height("elgg-widget-col-2", 500.0);

    f.click("elgg-widget-7", Control::DeleteButton);

    assert_eq!(f.page.min_height("elgg-widget-col-1"), Some(0.0));
    assert_eq!(f.board.level_heights(), Some(500.0));
    assert_eq!(f.page.min_height("elgg-widget-col-1"), Some(500.0));
}
