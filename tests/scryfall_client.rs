//! Scryfall client tests against a local mock server

use mtg_collection::{
    core::{Color, Rarity},
    loader::{CardLookup, Comparison, ScryfallClient, SearchQuery},
    MtgError, Result,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn bolt_json() -> serde_json::Value {
    json!({
        "object": "card",
        "id": "e3285e6b-3e79-4d7c-bf96-d920f973b80c",
        "name": "Lightning Bolt",
        "set": "LEA",
        "set_name": "Limited Edition Alpha",
        "rarity": "common",
        "mana_cost": "{R}",
        "cmc": 1.0,
        "type_line": "Instant",
        "colors": ["R"],
        "color_identity": ["R"],
        "oracle_text": "Lightning Bolt deals 3 damage to any target.",
        "collector_number": "161"
    })
}

fn not_found_json() -> serde_json::Value {
    json!({
        "object": "error",
        "code": "not_found",
        "status": 404,
        "details": "No cards found matching your query"
    })
}

fn client(server: &MockServer) -> Result<ScryfallClient> {
    ScryfallClient::new(server.uri(), Duration::from_secs(5))
}

#[tokio::test]
async fn test_exact_name_lookup() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("exact", "Lightning Bolt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bolt_json()))
        .expect(1)
        .mount(&server)
        .await;

    let card = client(&server)?
        .find_by_name("Lightning Bolt")
        .await?
        .expect("card resolves");

    assert_eq!(card.name, "Lightning Bolt");
    assert_eq!(card.id.to_string(), "e3285e6b-3e79-4d7c-bf96-d920f973b80c");
    assert_eq!(card.set.as_deref(), Some("lea"));
    assert_eq!(card.rarity, Rarity::Common);
    assert_eq!(card.mana_value, 1.0);
    assert!(card.colors.contains(Color::Red));
    Ok(())
}

#[tokio::test]
async fn test_falls_back_to_fuzzy() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("exact", "lightnin bolt"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_json()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .and(query_param("fuzzy", "lightnin bolt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bolt_json()))
        .expect(1)
        .mount(&server)
        .await;

    let card = client(&server)?.find_by_name("lightnin bolt").await?;
    assert_eq!(card.map(|c| c.name), Some("Lightning Bolt".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_unknown_name_is_none() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_json()))
        .mount(&server)
        .await;

    assert!(client(&server)?.find_by_name("Not A Card").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_server_error_is_lookup_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/named"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "object": "error",
            "status": 500,
            "details": "backend unavailable"
        })))
        .mount(&server)
        .await;

    let err = client(&server)?
        .find_by_name("Lightning Bolt")
        .await
        .unwrap_err();
    match err {
        MtgError::Lookup(msg) => assert!(msg.contains("backend unavailable"), "{msg}"),
        other => panic!("expected lookup error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_search_sends_query_and_page() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/search"))
        .and(query_param("q", "bolt c:r t:instant mv<=1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "total_cards": 177,
            "has_more": false,
            // The second record has no id and is dropped
            "data": [bolt_json(), { "name": "Broken Record" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = SearchQuery {
        text: Some("bolt".to_string()),
        colors: Some("R".parse()?),
        type_line: Some("Instant".to_string()),
        mana_value: Some((Comparison::LessOrEqual, 1)),
        ..Default::default()
    };
    let page = client(&server)?.search(&query, 2).await?;

    assert_eq!(page.page, 2);
    assert_eq!(page.total_cards, 177);
    assert!(!page.has_more);
    assert_eq!(page.cards.len(), 1);
    assert_eq!(page.cards[0].name, "Lightning Bolt");
    Ok(())
}

#[tokio::test]
async fn test_search_without_matches_is_empty_page() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cards/search"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_json()))
        .mount(&server)
        .await;

    let page = client(&server)?
        .search(&SearchQuery::text("zzzz"), 1)
        .await?;
    assert!(page.cards.is_empty());
    assert_eq!(page.total_cards, 0);

    // An empty query never reaches the server
    let page = client(&server)?.search(&SearchQuery::default(), 1).await?;
    assert!(page.cards.is_empty());
    Ok(())
}
