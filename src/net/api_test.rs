use super::*;

#[test]
fn action_url_joins_base_and_endpoint() {
    assert_eq!(action_url("/action/", ActionKind::Add), "/action/widgets/add");
    assert_eq!(action_url("https://site.test/action", ActionKind::Remove), "https://site.test/action/widgets/delete");
}

#[test]
fn action_url_without_base_is_relative_endpoint() {
    assert_eq!(action_url("", ActionKind::Move), "widgets/move");
}

#[test]
fn request_fields_append_security_tokens() {
    let request = ActionRequest::Remove { guid: "7".into() };
    let tokens = vec![("__elgg_ts".to_owned(), "100".to_owned()), ("__elgg_token".to_owned(), "abc".to_owned())];
    assert_eq!(
        request_fields(&request, &tokens),
        vec![
            ("guid".to_owned(), "7".to_owned()),
            ("__elgg_ts".to_owned(), "100".to_owned()),
            ("__elgg_token".to_owned(), "abc".to_owned()),
        ]
    );
}

#[test]
fn request_fields_do_not_duplicate_tokens_already_in_form() {
    let request = ActionRequest::SaveSettings {
        guid: None,
        fields: vec![("__elgg_token".to_owned(), "from-form".to_owned())],
    };
    let tokens = vec![("__elgg_token".to_owned(), "config".to_owned())];
    assert_eq!(request_fields(&request, &tokens), vec![("__elgg_token".to_owned(), "from-form".to_owned())]);
}
