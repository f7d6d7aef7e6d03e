use jsontools::axum::{
    body::Bytes,
    extract::{Path, State},
    routing::get,
};
use jsontools::prelude::*;
use jsontools::testing::JsonClient;
use serde_json::{Value, json};
use std::sync::Mutex;

type Users = Arc<Mutex<Vec<Value>>>;

fn users() -> Users {
    Arc::new(Mutex::new(vec![
        json!({"id": 1, "name": "a"}),
        json!({"id": 2, "name": "b"}),
        json!({"id": 3, "name": "c"}),
    ]))
}

async fn list_users(State(users): State<Users>) -> JsonApi<Vec<Value>> {
    JsonApi(users.lock().unwrap().clone())
}

async fn get_user(State(users): State<Users>, Path(id): Path<usize>) -> Response {
    match users.lock().unwrap().get(id.wrapping_sub(1)) {
        Some(user) => JsonApi(json!({"user": user})).into_response(),
        None => (StatusCode::NOT_FOUND, format!("User #{id} not found")).into_response(),
    }
}

async fn patch_user(
    State(users): State<Users>,
    Path(id): Path<usize>,
    body: Bytes,
) -> Result<JsonResponse> {
    if id == 1 {
        return make_json_response((json!({"error": "Denied"}), StatusCode::FORBIDDEN));
    }
    let body: Value = serde_json::from_slice(&body)?;
    let mut users = users.lock().unwrap();
    let slot = users
        .get_mut(id - 1)
        .ok_or_else(|| JsonToolsError::Internal(format!("no user #{id}")))?;
    *slot = body["user"].clone();
    make_json_response(slot.clone())
}

async fn delete_user(State(users): State<Users>, Path(id): Path<usize>) -> Result<JsonResponse> {
    if id == 1 {
        return Ok(JsonResponse::new(&json!({"error": "Denied"}))?.with_status(StatusCode::FORBIDDEN));
    }
    users.lock().unwrap().remove(id - 1);
    make_json_response(json!(true))
}

fn client() -> JsonClient {
    let app = Router::new()
        .route("/user", get(list_users))
        .route("/user/{id}", get(get_user).patch(patch_user).delete(delete_user))
        .with_state(users());
    JsonClient::new(app)
}

#[tokio::test]
async fn test_list() {
    let rv = client().get("/user").await.unwrap();
    assert_eq!(rv.status, StatusCode::OK);
    assert_eq!(rv.headers["content-type"], "application/json");
    assert_eq!(
        rv.get_json(),
        Some(&json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}, {"id": 3, "name": "c"}]))
    );
}

#[tokio::test]
async fn test_get() {
    let client = client();

    let rv = client.get("/user/1").await.unwrap();
    assert_eq!(rv.status, StatusCode::OK);
    assert_eq!(rv.get_json(), Some(&json!({"user": {"id": 1, "name": "a"}})));

    let rv = client.get("/user/99").await.unwrap();
    assert_eq!(rv.status, StatusCode::NOT_FOUND);
    assert_eq!(rv.get_json(), None);
    assert!(rv.text().contains("User #99 not found"));
}

#[tokio::test]
async fn test_update() {
    let client = client();

    let rv = client.patch("/user/1", None).await.unwrap();
    assert_eq!(rv.status, StatusCode::FORBIDDEN);
    assert_eq!(rv.get_json(), Some(&json!({"error": "Denied"})));

    let body = json!({"user": {"id": 2, "name": "bbb"}});
    let rv = client.patch("/user/2", Some(&body)).await.unwrap();
    assert_eq!(rv.status, StatusCode::OK);
    assert_eq!(rv.get_json(), Some(&json!({"id": 2, "name": "bbb"})));

    // the update is visible to later requests
    let rv = client.get("/user/2").await.unwrap();
    assert_eq!(rv["user"]["name"], "bbb");

    let rv = client.patch("/user/99", Some(&json!({"user": {}}))).await.unwrap();
    assert_eq!(rv.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(rv["error"]["name"], "Internal");
}

#[tokio::test]
async fn test_delete() {
    let client = client();

    let rv = client.delete("/user/1").await.unwrap();
    assert_eq!(rv.status, StatusCode::FORBIDDEN);
    assert_eq!(rv.get_json(), Some(&json!({"error": "Denied"})));

    let rv = client.delete("/user/2").await.unwrap();
    assert_eq!(rv.status, StatusCode::OK);
    assert_eq!(rv.get_json(), Some(&json!(true)));

    let rv = client.get("/user").await.unwrap();
    assert_eq!(rv.get_json().and_then(Value::as_array).map(Vec::len), Some(2));
}
