pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::chat::handlers as chat;
use crate::grocery::handlers as grocery;
use crate::inventory::handlers as inventory;
use crate::recipes::handlers as recipes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Chat
        .route("/chat", post(chat::handle_chat))
        .route(
            "/chat/history/:user_id",
            get(chat::handle_chat_history).delete(chat::handle_clear_chat_history),
        )
        // Inventory
        .route("/inventory/:user_id", get(inventory::handle_get_inventory))
        .route(
            "/inventory/:user_id/expiring",
            get(inventory::handle_expiring),
        )
        .route("/inventory/items/:id", delete(inventory::handle_delete_item))
        .route("/update-inventory", post(inventory::handle_update_inventory))
        // Recipes
        .route(
            "/recipes",
            get(recipes::handle_list_recipes).post(recipes::handle_create_recipe),
        )
        .route(
            "/recipes/",
            get(recipes::handle_list_recipes).post(recipes::handle_create_recipe),
        )
        .route("/recipes/search", get(recipes::handle_search_recipes))
        .route(
            "/recipes/:id",
            get(recipes::handle_get_recipe).delete(recipes::handle_delete_recipe),
        )
        .route(
            "/recipes/:id/availability",
            get(recipes::handle_availability),
        )
        .route("/recipes/:id/cook", post(recipes::handle_cook))
        .route("/recipes/:id/grocery-list", post(grocery::handle_list_from_missing))
        .route("/process-recipe", post(recipes::handle_process_recipe))
        // Grocery lists
        .route(
            "/grocery-lists",
            get(grocery::handle_list_grocery_lists).post(grocery::handle_create_grocery_list),
        )
        .route(
            "/grocery-lists/from-recipes",
            post(grocery::handle_list_from_recipes),
        )
        .route(
            "/grocery-lists/:id",
            get(grocery::handle_get_grocery_list).delete(grocery::handle_delete_grocery_list),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::Config;
    use crate::intent::scripted::ScriptedIntentService;
    use crate::inventory::reconcile::InventoryOp;
    use crate::store::memory::MemoryStore;
    use crate::store::Store;

    fn app(store: Arc<MemoryStore>, intents: ScriptedIntentService) -> Router {
        build_router(AppState {
            store,
            intents: Arc::new(intents),
            config: Config::for_tests(),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedIntentService::new());
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "plates-api");
    }

    #[tokio::test]
    async fn test_chat_saves_recipe_then_fetch_by_id() {
        let store = Arc::new(MemoryStore::new());
        let intents = ScriptedIntentService::new().with_reply(
            r#"{"intent":"save_recipe","ai_response":"Saved it",
                "recipe":{"title":"Pancakes","ingredients":[{"name":"eggs","amount":2}],
                          "steps":["Mix","Fry"]}}"#,
        );
        let app = app(store.clone(), intents);
        let user = Uuid::new_v4();

        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"user_id": user, "message": "save my pancakes"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let recipe_id = body["recipe_id"].as_i64().unwrap();

        let (status, recipe) = send(&app, Method::GET, &format!("/recipes/{recipe_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(recipe["title"], "Pancakes");
        assert_eq!(recipe["ingredients"][0]["amount"], "2");
        assert_eq!(recipe["steps"][1]["step_number"], 2);

        let (_, history) = send(&app, Method::GET, &format!("/chat/history/{user}"), None).await;
        assert_eq!(history.as_array().unwrap().len(), 2);
        assert_eq!(history[0]["role"], "user");
    }

    #[tokio::test]
    async fn test_error_shapes() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedIntentService::new());

        let (status, body) = send(&app, Method::GET, "/recipes/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"user_id": Uuid::new_v4(), "message": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Nothing scripted: the classifier fails and the turn is rejected.
        let (status, body) = send(
            &app,
            Method::POST,
            "/chat",
            Some(json!({"user_id": Uuid::new_v4(), "message": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "CLASSIFICATION_FAILED");
    }

    #[tokio::test]
    async fn test_create_search_and_delete_recipe() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedIntentService::new());

        let (status, created) = send(
            &app,
            Method::POST,
            "/recipes/",
            Some(json!({"title": "Tomato Soup", "keywords": ["vegan", "soup"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["recipe_id"].as_i64().unwrap();

        let (_, hits) = send(&app, Method::GET, "/recipes/search?q=vegan", None).await;
        assert_eq!(hits[0]["id"].as_i64(), Some(id));

        let (status, _) = send(&app, Method::DELETE, &format!("/recipes/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &format!("/recipes/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_availability_and_cook() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store.clone(), ScriptedIntentService::new());
        let user = Uuid::new_v4();
        store
            .apply_inventory_ops(
                user,
                &[InventoryOp::Insert {
                    name: "Eggs".to_string(),
                    amount: Some("3".to_string()),
                    expires_at: None,
                }],
            )
            .await
            .unwrap();

        let (_, created) = send(
            &app,
            Method::POST,
            "/recipes",
            Some(json!({
                "title": "Omelette",
                "ingredients": [{"name": "eggs", "amount": "2"}, {"name": "chives"}]
            })),
        )
        .await;
        let id = created["recipe_id"].as_i64().unwrap();

        let (status, availability) = send(
            &app,
            Method::GET,
            &format!("/recipes/{id}/availability?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(availability["has_all_ingredients"], false);
        assert_eq!(availability["missing"][0]["name"], "chives");

        let (status, inventory) = send(
            &app,
            Method::POST,
            &format!("/recipes/{id}/cook"),
            Some(json!({"user_id": user})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(inventory[0]["amount"], "1");
    }

    #[tokio::test]
    async fn test_expiring_rejects_oversized_window() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedIntentService::new());
        let user = Uuid::new_v4();

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/inventory/{user}/expiring?days=1000000000"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/inventory/{user}/expiring?days=30"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_clear_chat_history() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store.clone(), ScriptedIntentService::new());
        let user = Uuid::new_v4();
        store.seed_chat(user, "hi", "hello");
        store.seed_chat(user, "again", "hello again");

        let (status, body) = send(&app, Method::DELETE, &format!("/chat/history/{user}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 2);

        let (_, history) = send(&app, Method::GET, &format!("/chat/history/{user}"), None).await;
        assert_eq!(history, json!([]));
    }

    #[tokio::test]
    async fn test_grocery_list_from_missing_ingredients() {
        let store = Arc::new(MemoryStore::new());
        let app = app(store.clone(), ScriptedIntentService::new());
        let user = Uuid::new_v4();
        store
            .apply_inventory_ops(
                user,
                &[InventoryOp::Insert {
                    name: "Eggs".to_string(),
                    amount: Some("6".to_string()),
                    expires_at: None,
                }],
            )
            .await
            .unwrap();

        let (_, created) = send(
            &app,
            Method::POST,
            "/recipes",
            Some(json!({
                "title": "Omelette",
                "ingredients": [
                    {"name": "eggs", "amount": "2"},
                    {"name": "milk", "amount": "50 ml"},
                    {"name": "chives"}
                ]
            })),
        )
        .await;
        let id = created["recipe_id"].as_i64().unwrap();

        let (status, list) = send(
            &app,
            Method::POST,
            &format!("/recipes/{id}/grocery-list"),
            Some(json!({"user_id": user})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(list["name"], "Shopping for Omelette");
        assert_eq!(list["user_id"], json!(user));
        let items = list["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "milk");
        assert_eq!(items[0]["amount"], "50 ml");
        assert_eq!(items[0]["category"], "Dairy");
        assert_eq!(items[1]["name"], "chives");
        assert_eq!(items[1]["is_checked"], false);

        // With everything stocked there is nothing to shop for.
        let (_, stocked) = send(
            &app,
            Method::POST,
            "/recipes",
            Some(json!({"title": "Boiled eggs", "ingredients": [{"name": "eggs", "amount": "2"}]})),
        )
        .await;
        let stocked_id = stocked["recipe_id"].as_i64().unwrap();
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/recipes/{stocked_id}/grocery-list"),
            Some(json!({"user_id": user})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_grocery_list_from_recipes_merges_ingredients() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedIntentService::new());
        let user = Uuid::new_v4();

        let mut ids = Vec::new();
        for (title, eggs) in [("Pancakes", "2"), ("Omelette", "3")] {
            let (_, created) = send(
                &app,
                Method::POST,
                "/recipes",
                Some(json!({"title": title, "ingredients": [{"name": "Eggs", "amount": eggs}]})),
            )
            .await;
            ids.push(created["recipe_id"].as_i64().unwrap());
        }

        let (status, list) = send(
            &app,
            Method::POST,
            "/grocery-lists/from-recipes",
            Some(json!({"user_id": user, "recipe_ids": ids})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(list["name"], "Shopping List");
        assert_eq!(list["items"].as_array().unwrap().len(), 1);
        assert_eq!(list["items"][0]["amount"], "5");

        let (status, _) = send(
            &app,
            Method::POST,
            "/grocery-lists/from-recipes",
            Some(json!({"user_id": user, "recipe_ids": [ids[0], 9999]})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_grocery_list_create_list_and_delete() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedIntentService::new());
        let user = Uuid::new_v4();

        let (status, created) = send(
            &app,
            Method::POST,
            "/grocery-lists",
            Some(json!({
                "user_id": user,
                "name": "Weekend",
                "items": [
                    {"name": "salmon", "amount": "2 fillets"},
                    {"name": "candles", "category": "Household"}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["items"][0]["category"], "Seafood");
        assert_eq!(created["items"][1]["category"], "Household");

        let (_, lists) = send(&app, Method::GET, &format!("/grocery-lists?user_id={user}"), None).await;
        assert_eq!(lists.as_array().unwrap().len(), 1);
        assert_eq!(lists[0]["name"], "Weekend");

        let (status, _) = send(&app, Method::DELETE, &format!("/grocery-lists/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::GET, &format!("/grocery-lists/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_process_recipe_requires_text() {
        let app = app(Arc::new(MemoryStore::new()), ScriptedIntentService::new());
        let (status, _) = send(
            &app,
            Method::POST,
            "/process-recipe",
            Some(json!({"text": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
