//! Recipe ingestion and search integration tests.
//!
//! Runs the recipe service against an in-memory database with wiremock
//! standing in for the chat and embeddings APIs.

mod common;

use common::*;
use larder::{db, Error};

const PANCAKES_URL: &str = "https://example.com/pancakes";

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn test_add_by_url_creates_and_links() {
    let app = TestApp::spawn().await;
    let user = app.user("alice").await;

    mock_chat(&app.server, "example.com/pancakes", &extraction_json("Fluffy Pancakes"), 1).await;
    mock_embedding(&app.server, "Fluffy Pancakes", &[1.0, 0.0, 0.0, 0.0]).await;

    let recipe = app
        .state
        .recipes
        .add_by_url(Some(&user), PANCAKES_URL)
        .await
        .unwrap();

    assert_eq!(recipe.title, "Fluffy Pancakes");
    assert_eq!(recipe.source, PANCAKES_URL);
    assert_eq!(recipe.user_id, user.id);
    assert_eq!(recipe.embedding, vec![1.0, 0.0, 0.0, 0.0]);
    assert!(recipe.slug.starts_with("fluffy-pancakes-"));
    assert_eq!(recipe.slug.len(), "fluffy-pancakes-".len() + 6);

    assert!(app
        .state
        .collections
        .is_in_collection(Some(&user), &recipe.id)
        .await
        .unwrap());

    let stored = app.state.recipes.get_by_slug(&recipe.slug).await.unwrap();
    assert_eq!(stored, Some(recipe));
}

#[tokio::test]
async fn test_same_source_is_never_duplicated() {
    let app = TestApp::spawn().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;

    // Only the first add reaches the model
    mock_chat(&app.server, "example.com/pancakes", &extraction_json("Pancakes"), 1).await;
    mock_embedding(&app.server, "Pancakes", &[1.0, 0.0, 0.0, 0.0]).await;

    let first = app
        .state
        .recipes
        .add_by_url(Some(&alice), PANCAKES_URL)
        .await
        .unwrap();

    // Same page, different spelling of the URL
    let second = app
        .state
        .recipes
        .add_by_url(Some(&bob), "HTTPS://EXAMPLE.com/pancakes")
        .await
        .unwrap();

    assert_eq!(second, first);
    assert_eq!(db::list_recipes(&app.state.db).await.unwrap().len(), 1);

    // Bob still gets the recipe in his collection
    let bobs = app.state.collections.list(Some(&bob)).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].id, first.id);
}

#[tokio::test]
async fn test_add_requires_user() {
    let app = TestApp::spawn().await;
    forbid_chat(&app.server).await;

    let err = app
        .state
        .recipes
        .add_by_url(None, PANCAKES_URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unauthenticated));
}

#[tokio::test]
async fn test_add_rejects_unparseable_url() {
    let app = TestApp::spawn().await;
    let user = app.user("alice").await;
    forbid_chat(&app.server).await;

    let err = app
        .state
        .recipes
        .add_by_url(Some(&user), "not a url")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_null_extraction_stores_nothing() {
    let app = TestApp::spawn().await;
    let user = app.user("alice").await;

    mock_chat(&app.server, "example.com/about", "null", 1).await;
    forbid_embeddings(&app.server).await;

    let err = app
        .state
        .recipes
        .add_by_url(Some(&user), "https://example.com/about")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Extraction(ref msg) if msg == "No recipe found"));
    assert!(db::list_recipes(&app.state.db).await.unwrap().is_empty());
    assert!(app.state.collections.list(Some(&user)).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_json_extraction_fails() {
    let app = TestApp::spawn().await;
    let user = app.user("alice").await;

    mock_chat(
        &app.server,
        "example.com/blog",
        "I'm sorry, I cannot browse the web.",
        1,
    )
    .await;
    forbid_embeddings(&app.server).await;

    let err = app
        .state
        .recipes
        .add_by_url(Some(&user), "https://example.com/blog")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Extraction(_)));
    assert_eq!(err.status_code(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    assert!(db::list_recipes(&app.state.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_dimension_embedding_fails() {
    let app = TestApp::spawn().await;
    let user = app.user("alice").await;

    mock_chat(&app.server, "example.com/pancakes", &extraction_json("Pancakes"), 1).await;
    mock_embedding(&app.server, "Pancakes", &[1.0, 0.0]).await;

    let err = app
        .state
        .recipes
        .add_by_url(Some(&user), PANCAKES_URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Embedding(_)));
    assert!(db::list_recipes(&app.state.db).await.unwrap().is_empty());
}

// ============================================================================
// Retrieval and search
// ============================================================================

#[tokio::test]
async fn test_get_by_slug_missing_is_none() {
    let app = TestApp::spawn().await;
    assert!(app.state.recipes.get_by_slug("nope-abc123").await.unwrap().is_none());
    assert!(app.state.recipes.get_by_slug("").await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_orders_by_similarity() {
    let app = TestApp::spawn().await;
    let owner = app.user("alice").await;

    let pancakes = app.insert_recipe(&owner, "Pancakes", [1.0, 0.0, 0.0, 0.0]).await;
    let curry = app.insert_recipe(&owner, "Curry", [0.0, 1.0, 0.0, 0.0]).await;
    let chili = app.insert_recipe(&owner, "Chili", [0.2, 0.8, 0.0, 0.0]).await;

    mock_embedding(&app.server, "something spicy", &[0.0, 1.0, 0.1, 0.0]).await;

    let results = app.state.recipes.search("something spicy").await.unwrap();
    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();

    assert_eq!(ids, vec![curry.id.as_str(), chili.id.as_str(), pancakes.id.as_str()]);
}

#[tokio::test]
async fn test_search_skips_deleted_recipes() {
    let app = TestApp::spawn().await;
    let owner = app.user("alice").await;

    let kept = app.insert_recipe(&owner, "Pancakes", [1.0, 0.0, 0.0, 0.0]).await;
    let gone = app.insert_recipe(&owner, "Waffles", [0.9, 0.1, 0.0, 0.0]).await;

    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(&gone.id)
        .execute(&app.state.db)
        .await
        .unwrap();

    mock_embedding(&app.server, "breakfast", &[1.0, 0.0, 0.0, 0.0]).await;

    let results = app.state.recipes.search("breakfast").await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, kept.id);
}

#[tokio::test]
async fn test_blank_search_makes_no_calls() {
    let app = TestApp::spawn().await;
    forbid_embeddings(&app.server).await;

    assert!(app.state.recipes.search("   ").await.unwrap().is_empty());
}
