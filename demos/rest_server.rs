use jsontools::config;
use jsontools::prelude::*;
use serde::Serialize;
use std::sync::RwLock;

#[derive(Clone, Serialize)]
struct User {
    id: u32,
    login: String,
}

pub struct UserView {
    users: RwLock<Vec<User>>,
}

#[view(primary_key = "id")]
impl UserView {
    fn list(&self) -> Result<JsonApi<Vec<User>>> {
        let users = self
            .users
            .read()
            .map_err(|e| JsonToolsError::Internal(e.to_string()))?;
        Ok(JsonApi(users.clone()))
    }

    fn get(&self, id: u32) -> Result<JsonResponse> {
        let users = self
            .users
            .read()
            .map_err(|e| JsonToolsError::Internal(e.to_string()))?;
        match users.iter().find(|u| u.id == id) {
            Some(user) => JsonResponse::new(user),
            None => make_json_response((
                serde_json::json!({"error": format!("User #{id} not found")}),
                StatusCode::NOT_FOUND,
            )),
        }
    }

    fn delete(&self, id: u32) -> Result<JsonApi<bool>> {
        let mut users = self
            .users
            .write()
            .map_err(|e| JsonToolsError::Internal(e.to_string()))?;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(JsonApi(users.len() != before))
    }

    #[methodview("PURGE", if_not_set = "id")]
    fn purge(&self) -> Result<JsonApi<usize>> {
        let mut users = self
            .users
            .write()
            .map_err(|e| JsonToolsError::Internal(e.to_string()))?;
        let removed = users.len();
        users.clear();
        Ok(JsonApi(removed))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    config::install(JsonConfig::from_env());

    let view = UserView {
        users: RwLock::new(vec![
            User { id: 1, login: "kolypto".to_string() },
            User { id: 2, login: "guest".to_string() },
        ]),
    };
    let app = route_as_view(Router::new(), "user", &["/user/", "/user/{id}"], view)?;

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    tracing::info!("Server running on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    jsontools::axum::serve(listener, app).await?;
    Ok(())
}
