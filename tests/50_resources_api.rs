mod common;

use axum::http::StatusCode;
use common::TestApp;
use plantops::auth::Role;
use serde_json::json;

#[tokio::test]
async fn other_company_records_do_not_exist() {
    let app = TestApp::new().await;
    let acme_qt = app.user(Some(app.acme.id), "acme.qt", Role::QualityTech).await;
    let globex_qt = app.user(Some(app.globex.id), "globex.qt", Role::QualityTech).await;

    let created = app
        .post(
            "/api/incidents",
            &app.cookie(&acme_qt),
            json!({ "title": "Coolant leak", "description": "Press 4 bay" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.data()["severity"], "medium");
    let id = created.data()["id"].as_str().unwrap().to_string();

    let outsider = app.cookie(&globex_qt);
    let res = app.get(&format!("/api/incidents/{}", id), &outsider).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app
        .patch(&format!("/api/incidents/{}", id), &outsider, json!({ "status": "closed" }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let list = app.get("/api/incidents", &outsider).await;
    assert_eq!(list.data().as_array().unwrap().len(), 0);

    // A tenantId in the body cannot move a record into another company.
    let res = app
        .post(
            "/api/incidents",
            &outsider,
            json!({ "title": "Spill", "description": "x", "tenantId": app.acme.id }),
        )
        .await;
    assert_eq!(res.data()["tenantId"], app.globex.id.to_string());
}

#[tokio::test]
async fn failed_response_flags_the_submission() {
    let app = TestApp::new().await;
    let engineer = app.user(Some(app.acme.id), "eng", Role::Engineer).await;
    let worker = app.user(Some(app.acme.id), "line1", Role::Worker).await;

    let template = app
        .post(
            "/api/checklists/templates",
            &app.cookie(&engineer),
            json!({
                "name": "Press start-up",
                "items": [
                    { "label": "Guards closed", "required": true },
                    { "label": "Oil level", "required": true },
                    { "label": "Radio on" }
                ]
            }),
        )
        .await;
    assert_eq!(template.status, StatusCode::CREATED);
    let template_id = template.data()["id"].as_str().unwrap().to_string();
    let cookie = app.cookie(&worker);

    let incomplete = app
        .post(
            "/api/checklists/submissions",
            &cookie,
            json!({
                "templateId": template_id,
                "responses": [{ "label": "Guards closed", "passed": true }]
            }),
        )
        .await;
    assert_eq!(incomplete.status, StatusCode::BAD_REQUEST);

    let flagged = app
        .post(
            "/api/checklists/submissions",
            &cookie,
            json!({
                "templateId": template_id,
                "responses": [
                    { "label": "Guards closed", "passed": true },
                    { "label": "Oil level", "passed": false, "note": "below min" }
                ]
            }),
        )
        .await;
    assert_eq!(flagged.status, StatusCode::CREATED);
    assert_eq!(flagged.data()["status"], "flagged");
    assert_eq!(flagged.data()["submittedByUsername"], "line1");

    // Workers submit but do not review.
    let res = app.get("/api/checklists/submissions", &cookie).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .get("/api/checklists/submissions?status=flagged", &app.cookie(&engineer))
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_members_read_a_message_group() {
    let app = TestApp::new().await;
    let engineer = app.user(Some(app.acme.id), "eng", Role::Engineer).await;
    let member = app.user(Some(app.acme.id), "line1", Role::Worker).await;
    let bystander = app.user(Some(app.acme.id), "line2", Role::Worker).await;
    let foreigner = app.user(Some(app.globex.id), "spy", Role::Worker).await;

    let res = app
        .post(
            "/api/messages/groups",
            &app.cookie(&engineer),
            json!({ "name": "Night shift", "memberIds": [foreigner.id] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let group = app
        .post(
            "/api/messages/groups",
            &app.cookie(&engineer),
            json!({ "name": "Night shift", "memberIds": [member.id] }),
        )
        .await;
    assert_eq!(group.status, StatusCode::CREATED);
    let messages_uri = format!("/api/messages/groups/{}/messages", group.data()["id"].as_str().unwrap());

    let posted = app
        .post(&messages_uri, &app.cookie(&member), json!({ "body": "Line 3 is down" }))
        .await;
    assert_eq!(posted.status, StatusCode::CREATED);

    let res = app
        .post(&messages_uri, &app.cookie(&bystander), json!({ "body": "hello?" }))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.get(&messages_uri, &app.cookie(&foreigner)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get(&messages_uri, &app.cookie(&engineer)).await;
    assert_eq!(res.data()[0]["body"], "Line 3 is down");
}

#[tokio::test]
async fn shipping_desk_roles_only() {
    let app = TestApp::new().await;
    let shipping = app.user(Some(app.acme.id), "dock", Role::Shipping).await;
    let lab = app.user(Some(app.acme.id), "lab", Role::LabTech).await;

    let body = json!({ "trackingNumber": "1Z999", "carrier": "UPS", "direction": "inbound" });
    let res = app.post("/api/shipments", &app.cookie(&lab), body.clone()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post("/api/shipments", &app.cookie(&shipping), body).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["status"], "pending");
    let id = res.data()["id"].as_str().unwrap().to_string();

    let res = app
        .patch(
            &format!("/api/shipments/{}", id),
            &app.cookie(&shipping),
            json!({ "status": "in_transit" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "in_transit");

    let res = app
        .get("/api/shipments?direction=outbound", &app.cookie(&shipping))
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn super_admin_must_name_a_tenant_when_creating() {
    let app = TestApp::new().await;
    let root = app.user(None, "platform", Role::SuperAdmin).await;
    let cookie = app.cookie(&root);
    let body = json!({ "trackingNumber": "TRK-1", "carrier": "DHL", "direction": "outbound" });

    let res = app.post("/api/shipments", &cookie, body.clone()).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let mut scoped = body;
    scoped["tenantId"] = json!(app.acme.id);
    let res = app.post("/api/shipments", &cookie, scoped).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["tenantId"], app.acme.id.to_string());
}

#[tokio::test]
async fn folders_must_be_empty_before_removal() {
    let app = TestApp::new().await;
    let engineer = app.user(Some(app.acme.id), "eng", Role::Engineer).await;
    let admin = app.user(Some(app.acme.id), "boss", Role::Admin).await;

    let folder = app
        .post("/api/documents/folders", &app.cookie(&engineer), json!({ "name": "SOPs" }))
        .await;
    let folder_id = folder.data()["id"].as_str().unwrap().to_string();

    let doc = app
        .post(
            &format!("/api/documents/folders/{}/documents", folder_id),
            &app.cookie(&engineer),
            json!({ "title": "Lockout", "url": "https://docs.acme.test/loto.pdf" }),
        )
        .await;
    assert_eq!(doc.status, StatusCode::CREATED);

    let res = app
        .delete(&format!("/api/documents/folders/{}", folder_id), &app.cookie(&admin))
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error(), "Folder is not empty");

    let doc_id = doc.data()["id"].as_str().unwrap();
    let res = app
        .delete(&format!("/api/documents/{}", doc_id), &app.cookie(&engineer))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app
        .delete(&format!("/api/documents/folders/{}", folder_id), &app.cookie(&admin))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn user_administration_rules() {
    let app = TestApp::new().await;
    let admin = app.user(Some(app.acme.id), "boss", Role::Admin).await;
    let cookie = app.cookie(&admin);

    let res = app
        .post(
            "/api/users",
            &cookie,
            json!({ "username": "new.hire", "password": "long-enough-1", "role": "worker" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["tenantId"], app.acme.id.to_string());
    assert!(res.data().get("passwordHash").is_none());

    let res = app
        .post(
            "/api/users",
            &cookie,
            json!({ "username": "NEW.HIRE", "password": "long-enough-1", "role": "worker" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error(), "Username already exists");

    let res = app
        .post(
            "/api/users",
            &cookie,
            json!({ "username": "climber", "password": "long-enough-1", "role": "owner" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.delete(&format!("/api/users/{}", admin.id), &cookie).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error(), "You cannot delete your own account");
}

#[tokio::test]
async fn password_length_counts_characters() {
    let app = TestApp::new().await;
    let admin = app.user(Some(app.acme.id), "boss", Role::Admin).await;
    let cookie = app.cookie(&admin);

    // Seven characters, fourteen bytes.
    let res = app
        .post(
            "/api/users",
            &cookie,
            json!({ "username": "short.pw", "password": "ééééééé", "role": "worker" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["fieldErrors"]["password"], "must be at least 8 characters");

    let res = app
        .post(
            "/api/users",
            &cookie,
            json!({ "username": "long.pw", "password": "éééééééé", "role": "worker" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
}
