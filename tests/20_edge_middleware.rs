mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use plantops::auth::Role;

#[tokio::test]
async fn anonymous_visitor_is_redirected_with_return_path() {
    let app = TestApp::new().await;

    let res = app.request(Method::GET, "/quality/audits?week=42", None, None).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location(), Some("/login?from=%2Fquality%2Faudits%3Fweek%3D42"));
}

#[tokio::test]
async fn wrong_role_lands_on_its_home_page() {
    let app = TestApp::new().await;
    let engineer = app.user(Some(app.acme.id), "eng", Role::Engineer).await;

    let res = app.get("/quality", &app.cookie(&engineer)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location(), Some("/view"));

    let worker = app.user(Some(app.acme.id), "line1", Role::Worker).await;
    let res = app.get("/admin/settings", &app.cookie(&worker)).await;
    assert_eq!(res.location(), Some("/worker"));
}

#[tokio::test]
async fn permitted_role_passes_through() {
    let app = TestApp::new().await;
    let worker = app.user(Some(app.acme.id), "line1", Role::Worker).await;

    // No page is rendered here, so a pass-through reaches the JSON fallback.
    let res = app.get("/documents/sop", &app.cookie(&worker)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.location().is_none());
}

#[tokio::test]
async fn super_admin_opens_every_page() {
    let app = TestApp::new().await;
    let root = app.user(None, "platform", Role::SuperAdmin).await;
    let cookie = app.cookie(&root);

    for page in ["/admin", "/worker", "/shipping/dock", "/lab", "/super-admin"] {
        let res = app.get(page, &cookie).await;
        assert!(res.location().is_none(), "{} redirected", page);
    }
}

#[tokio::test]
async fn login_page_and_unlisted_paths_are_public() {
    let app = TestApp::new().await;

    let res = app.request(Method::GET, "/login", None, None).await;
    assert!(res.location().is_none());

    let res = app.request(Method::GET, "/administrator", None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(res.location().is_none());
}

#[tokio::test]
async fn forged_cookie_counts_as_anonymous() {
    let app = TestApp::new().await;

    let res = app
        .request(
            Method::GET,
            "/shipping",
            Some("plantops_session=eyJhbGciOiJIUzI1NiJ9.e30.forged"),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location(), Some("/login?from=%2Fshipping"));
}
