mod common;

use reqwest::multipart;
use serde_json::Value;
use uuid::Uuid;

use common::{receivable_body, TestApp};

async fn create_receivable_id(app: &TestApp, token: &str) -> String {
    let created: Value = app
        .create_receivable(token, &receivable_body())
        .await
        .json()
        .await
        .unwrap();
    created["id"].as_str().unwrap().to_string()
}

fn pdf_part() -> multipart::Form {
    multipart::Form::new().part(
        "file",
        multipart::Part::bytes(b"%PDF-1.4 test content".to_vec()).file_name("contract.pdf"),
    )
}

#[tokio::test]
async fn upload_returns_201_with_reference_and_list_reflects_it() {
    let app = TestApp::spawn().await;
    let token = app.token_for("accountant");
    let id = create_receivable_id(&app, &token).await;

    // Document upload only needs an authenticated identity, no role.
    let nobody = app.token_for("nobody");
    let response = app
        .client
        .post(format!("{}/receivables/{}/documents", app.address, id))
        .bearer_auth(&nobody)
        .multipart(pdf_part())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);

    let reference = response.text().await.unwrap();
    assert!(reference.starts_with("receivable-doc-"));

    let documents: Vec<String> = app
        .get(&token, &format!("/receivables/{}/documents", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(documents, vec![reference.clone()]);

    let record: Value = app
        .get(&token, &format!("/receivables/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(record["documentReferences"][0], reference);
}

#[tokio::test]
async fn upload_to_unknown_receivable_is_404() {
    let app = TestApp::spawn().await;
    let token = app.token_for("accountant");

    let response = app
        .client
        .post(format!(
            "{}/receivables/{}/documents",
            app.address,
            Uuid::new_v4()
        ))
        .bearer_auth(&token)
        .multipart(pdf_part())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.token_for("accountant");
    let id = create_receivable_id(&app, &token).await;

    let form = multipart::Form::new().part(
        "file",
        multipart::Part::bytes(Vec::new()).file_name("empty.pdf"),
    );
    let response = app
        .client
        .post(format!("{}/receivables/{}/documents", app.address, id))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn missing_file_field_is_rejected() {
    let app = TestApp::spawn().await;
    let token = app.token_for("accountant");
    let id = create_receivable_id(&app, &token).await;

    let form = multipart::Form::new().text("other", "value");
    let response = app
        .client
        .post(format!("{}/receivables/{}/documents", app.address, id))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn delete_is_204_and_idempotent() {
    let app = TestApp::spawn().await;
    let token = app.token_for("accountant");
    // Deletes anywhere under the collection require the admin role.
    let admin = app.token_for("admin");
    let id = create_receivable_id(&app, &token).await;

    let reference = app
        .client
        .post(format!("{}/receivables/{}/documents", app.address, id))
        .bearer_auth(&token)
        .multipart(pdf_part())
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let url = format!("{}/receivables/{}/documents/{}", app.address, id, reference);
    let response = app.client.delete(&url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(response.status(), 204);

    // Deleting an already-removed reference stays 204.
    let response = app.client.delete(&url).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(response.status(), 204);

    let documents: Vec<String> = app
        .get(&token, &format!("/receivables/{}/documents", id))
        .await
        .json()
        .await
        .unwrap();
    assert!(documents.is_empty());
}
