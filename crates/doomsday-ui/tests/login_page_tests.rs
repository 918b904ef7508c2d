//! Integration tests for the login form page.

use doomsday_client::{AUTH_PATH, CACHE_PATH, HttpMethod, TransportFailure};
use doomsday_test_support::{DocumentEvent, Harness};
use doomsday_ui::{
    CREDENTIALS_MISMATCH_MESSAGE, GENERIC_FAILURE_MESSAGE, LoginPage, LoginView, PageKind,
    PagerState, Surface, UiEvent, View,
};

fn shown_message(harness: &Harness) -> Option<String> {
    match harness.document.last_render(Surface::LoginPanel) {
        Some(View::Login(LoginView { error_message })) => error_message,
        other => panic!("expected login view, got {other:?}"),
    }
}

#[test]
fn login_page_tests_renders_form_and_hides_menu() {
    let harness = Harness::new();

    harness.pager.display(LoginPage::new());

    assert_eq!(harness.pager.state(), PagerState::Showing(PageKind::Login));
    assert_eq!(shown_message(&harness), None);
    assert_eq!(harness.document.is_visible(Surface::LoginPanel), Some(true));
    assert_eq!(harness.document.is_visible(Surface::HamburgerMenu), Some(false));
    assert!(harness.document.is_bound(UiEvent::LoginSubmit));
}

#[test]
fn login_page_tests_shows_message_passed_at_construction() {
    let harness = Harness::new();

    let page = LoginPage::with_message(GENERIC_FAILURE_MESSAGE);
    assert_eq!(page.message(), Some(GENERIC_FAILURE_MESSAGE));
    harness.pager.display(page);

    assert_eq!(shown_message(&harness).as_deref(), Some(GENERIC_FAILURE_MESSAGE));
}

#[test]
fn login_page_tests_submit_posts_credentials_and_clears_password() {
    let harness = Harness::new();
    harness.pager.display(LoginPage::new());
    harness.document.type_credentials("admin", "hunter2");

    assert!(harness.document.trigger(UiEvent::LoginSubmit));

    assert_eq!(harness.document.password_field(), "");
    assert!(harness.document.events().contains(&DocumentEvent::ClearPassword));
    assert_eq!(harness.transport.pending(), 1);
    assert_eq!(harness.transport.sent_paths(), vec![AUTH_PATH.to_string()]);

    let request = harness.transport.respond(200, "{}");
    assert_eq!(request.method, HttpMethod::Post);
    let body: serde_json::Value =
        serde_json::from_str(request.body.as_deref().expect("login has a body"))
            .expect("body is json");
    assert_eq!(body["username"], "admin");
    assert_eq!(body["password"], "hunter2");
}

#[test]
fn login_page_tests_success_moves_to_dashboard() {
    let harness = Harness::new();
    harness.pager.display(LoginPage::new());
    harness.document.type_credentials("admin", "hunter2");
    harness.document.trigger(UiEvent::LoginSubmit);

    harness.transport.respond(200, "");

    assert_eq!(harness.pager.state(), PagerState::Showing(PageKind::Dashboard));
    assert_eq!(harness.document.is_visible(Surface::LoginPanel), Some(false));
    assert!(!harness.document.is_bound(UiEvent::LoginSubmit));
    assert_eq!(
        harness.transport.sent_paths(),
        vec![AUTH_PATH.to_string(), CACHE_PATH.to_string()]
    );
}

#[test]
fn login_page_tests_wrong_password_shows_mismatch_message() {
    let harness = Harness::new();
    harness.pager.display(LoginPage::new());
    harness.document.type_credentials("admin", "wrong");
    harness.document.trigger(UiEvent::LoginSubmit);

    harness.transport.respond(401, r#"{"error":"unauthorized"}"#);

    assert_eq!(harness.pager.state(), PagerState::Showing(PageKind::Login));
    assert_eq!(
        shown_message(&harness).as_deref(),
        Some(CREDENTIALS_MISMATCH_MESSAGE)
    );
    assert!(harness.document.is_bound(UiEvent::LoginSubmit));
    assert_eq!(harness.transport.pending(), 0);
}

#[test]
fn login_page_tests_server_error_shows_generic_message() {
    let harness = Harness::new();
    harness.pager.display(LoginPage::new());
    harness.document.type_credentials("admin", "hunter2");
    harness.document.trigger(UiEvent::LoginSubmit);

    harness.transport.respond(500, "internal error");

    assert_eq!(shown_message(&harness).as_deref(), Some(GENERIC_FAILURE_MESSAGE));
}

#[test]
fn login_page_tests_network_failure_shows_generic_message() {
    let harness = Harness::new();
    harness.pager.display(LoginPage::new());
    harness.document.type_credentials("admin", "hunter2");
    harness.document.trigger(UiEvent::LoginSubmit);

    harness
        .transport
        .complete(Err(TransportFailure("connection reset".to_string())));

    assert_eq!(harness.pager.state(), PagerState::Showing(PageKind::Login));
    assert_eq!(shown_message(&harness).as_deref(), Some(GENERIC_FAILURE_MESSAGE));
}

#[test]
fn login_page_tests_ignores_completion_after_teardown() {
    let harness = Harness::new();
    harness.pager.display(LoginPage::new());
    harness.document.type_credentials("admin", "hunter2");
    harness.document.trigger(UiEvent::LoginSubmit);

    // The user navigates elsewhere before the login reply arrives.
    harness.pager.display(LoginPage::with_message("replaced"));
    let renders_before = harness.document.render_count(Surface::LoginPanel);

    harness.transport.respond(200, "");

    assert_eq!(harness.pager.state(), PagerState::Showing(PageKind::Login));
    assert_eq!(harness.document.render_count(Surface::LoginPanel), renders_before);
    assert_eq!(shown_message(&harness).as_deref(), Some("replaced"));
}
