mod common;

use common::{FakeElder, TOKEN};
use elder_console::elder::keys::ListParams;
use elder_console::elder::types::{Label, Organization};
use elder_console::elder::{ApiError, Resource};

#[tokio::test]
async fn test_list_sends_page_and_filters() {
  let server = FakeElder::start().await;
  let client = server.client();

  let params = ListParams::new(3, 25).filter("parent_id", "2");
  let page = client.list::<Organization>(&params).await.unwrap();

  assert_eq!(page.total, 120);
  assert_eq!(page.items[0].name, "Acme");
  assert_eq!(
    server.requests(),
    vec!["GET /api/v1/organizations?page=3&parent_id=2&per_page=25"]
  );
}

#[tokio::test]
async fn test_search_uses_search_endpoint() {
  let server = FakeElder::start().await;
  let client = server.client();

  let page = client
    .search::<Organization>("Umbrella", &ListParams::new(1, 50))
    .await
    .unwrap();

  assert_eq!(page.items[0].name, "Umbrella Corp");
  assert_eq!(
    server.requests(),
    vec!["GET /api/v1/organizations/search?page=1&per_page=50&q=Umbrella"]
  );
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
  let server = FakeElder::start().await;

  let profile = server.client().profile().await.unwrap();
  assert!(profile.is_admin());

  let auth = server.state.lock().unwrap().authorization.clone();
  assert_eq!(auth, vec![Some(format!("Bearer {}", TOKEN))]);
}

#[tokio::test]
async fn test_server_message_reaches_the_user_verbatim() {
  let server = FakeElder::start().await;

  let err = server.anonymous_client().profile().await.unwrap_err();
  assert_eq!(err.status(), Some(401));
  assert_eq!(err.user_message(), "Authentication required");
}

#[tokio::test]
async fn test_malformed_payload_is_a_decode_error() {
  let server = FakeElder::start().await;

  let err = server
    .client()
    .list::<Label>(&ListParams::default())
    .await
    .unwrap_err();
  match err {
    ApiError::Decode { endpoint, .. } => assert_eq!(endpoint, "/api/v1/labels"),
    other => panic!("expected decode error, got {:?}", other),
  }
}

#[tokio::test]
async fn test_delete_and_not_found() {
  let server = FakeElder::start().await;
  let client = server.client();

  client.delete(Resource::Entities, 12).await.unwrap();
  assert_eq!(server.state.lock().unwrap().deleted, vec![12]);

  let err = client.delete(Resource::Entities, 404).await.unwrap_err();
  assert_eq!(err.status(), Some(404));
  assert_eq!(err.to_string(), "Entity not found");
}

#[tokio::test]
async fn test_restore_sends_dry_run_flag() {
  let server = FakeElder::start().await;

  let result = server.client().restore_backup(5, true).await.unwrap();
  assert!(result.dry_run);
  assert_eq!(result.message.as_deref(), Some("Restore planned"));
  assert_eq!(result.extra.get("tables"), Some(&serde_json::json!(12)));

  let bodies = server.state.lock().unwrap().restore_bodies.clone();
  assert_eq!(bodies, vec![serde_json::json!({"dry_run": true})]);
}

#[tokio::test]
async fn test_health_needs_no_token() {
  let server = FakeElder::start().await;

  let health = server.anonymous_client().health().await.unwrap();
  assert_eq!(health.status, "healthy");
  assert_eq!(health.service, "elder");
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
  // Bind then drop so nothing is listening on the port
  let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let client = elder_console::elder::ElderClient::with_base(
    &format!("http://{}", addr),
    None,
    std::time::Duration::from_secs(2),
  )
  .unwrap();
  let err = client.health().await.unwrap_err();
  assert!(err.is_transport());
}
