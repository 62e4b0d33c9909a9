//! Behaviour of the data layer across backends.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use backend_core::{
    async_trait, to_fields, BackendError, Document, DocumentStore, Fields, ObjectStore, Payload,
    Query, SnapshotStream,
};
use database::Database;
use farm_services::{
    chat, crops, locations, market, users, weather, AlertType, Backend, BackendKind,
    FarmLocationUpdate, NewChatMessage, NewCropRecord, NewFarmLocation, NewPriceAlert,
    NewWeatherAlert, PriceDirection, ServiceError, UserProfileUpdate,
};
use futures::stream;
use mock_backend::{FailingBackend, MockAuth};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::timeout;

async fn sqlite_backend() -> Backend {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    Backend::from_database(db)
}

fn field(name: &str) -> NewFarmLocation {
    NewFarmLocation {
        name: name.to_string(),
        address: "Ludhiana, Punjab".to_string(),
        coordinates: None,
        area: 12.0,
        crop_type: "Wheat".to_string(),
        soil_type: "Loamy".to_string(),
    }
}

fn crop() -> NewCropRecord {
    NewCropRecord {
        crop_type: "Rice".to_string(),
        field_name: "South Field".to_string(),
        notes: "Transplanted last week".to_string(),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mock_never_persists() {
    let backend = Backend::mock();
    assert_eq!(backend.kind(), BackendKind::Mock);

    let id = locations::add_farm_location(&backend, "u1", &field("North"))
        .await
        .unwrap();
    locations::update_farm_location(
        &backend,
        &id,
        &FarmLocationUpdate {
            area: Some(99.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    crops::add_crop_record(&backend, "u1", &crop(), Some(Payload::new("a.jpg", vec![1])))
        .await
        .unwrap();
    chat::add_chat_message(&backend, "u1", &NewChatMessage::from_user("hi"))
        .await
        .unwrap();
    users::update_user_profile(&backend, "u1", &UserProfileUpdate::default())
        .await
        .unwrap();

    assert!(locations::get_farm_locations(&backend, "u1").await.unwrap().is_empty());
    assert!(crops::get_crop_records(&backend, "u1").await.unwrap().is_empty());
    assert!(chat::get_chat_history(&backend, "u1").await.unwrap().is_empty());
    assert!(weather::get_weather_alerts(&backend, "u1").await.unwrap().is_empty());
    assert!(market::get_market_prices(&backend, None).await.unwrap().is_empty());
    assert!(users::get_user_profile(&backend, "u1").await.unwrap().is_none());
    assert!(backend.documents().get("farmLocations", &id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_mock_sign_in_uses_email_local_part() {
    let backend = Backend::mock();
    let user = backend
        .auth()
        .sign_in("jane@example.com", "anything")
        .await
        .unwrap();
    assert_eq!(user.display_name.as_deref(), Some("jane"));
    assert!(user.photo_url.is_none());

    let auth = MockAuth::new();
    let signed_up = backend_core::AuthProvider::sign_up(&auth, "jane@example.com", "x")
        .await
        .unwrap();
    assert_eq!(signed_up.uid, user.uid);
}

// ---------------------------------------------------------------------------
// Crop records upload before writing
// ---------------------------------------------------------------------------

/// Records the order of object and document writes.
#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
    inserted: Arc<Mutex<Vec<Fields>>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn inserted(&self) -> Vec<Fields> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for Recorder {
    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Document>, BackendError> {
        Ok(None)
    }

    async fn query(&self, _query: &Query) -> Result<Vec<Document>, BackendError> {
        Ok(Vec::new())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> Result<String, BackendError> {
        self.events.lock().unwrap().push(format!("insert {}", collection));
        self.inserted.lock().unwrap().push(fields);
        Ok("doc-1".to_string())
    }

    async fn merge(&self, _collection: &str, _id: &str, _fields: Fields) -> Result<(), BackendError> {
        Ok(())
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<(), BackendError> {
        Ok(())
    }

    async fn listen(&self, _query: Query) -> Result<SnapshotStream, BackendError> {
        Ok(Box::pin(stream::empty()))
    }

    fn name(&self) -> &str {
        "Recorder"
    }
}

#[async_trait]
impl ObjectStore for Recorder {
    async fn put(&self, path: &str, _payload: Payload) -> Result<(), BackendError> {
        self.events.lock().unwrap().push(format!("put {}", path));
        Ok(())
    }

    async fn download_url(&self, path: &str) -> Result<String, BackendError> {
        self.events.lock().unwrap().push(format!("url {}", path));
        Ok(format!("https://objects.test/{}", path))
    }

    fn name(&self) -> &str {
        "Recorder"
    }
}

fn recording_backend(recorder: &Recorder) -> Backend {
    Backend::from_parts(
        BackendKind::Real,
        Arc::new(recorder.clone()),
        Arc::new(recorder.clone()),
        Arc::new(MockAuth::new()),
    )
}

#[tokio::test]
async fn test_crop_image_uploads_before_document_write() {
    let recorder = Recorder::default();
    let backend = recording_backend(&recorder);

    let id = crops::add_crop_record(
        &backend,
        "u1",
        &crop(),
        Some(Payload::new("paddy.jpg", vec![1, 2, 3])),
    )
    .await
    .unwrap();
    assert_eq!(id, "doc-1");

    let events = recorder.events();
    assert_eq!(events.len(), 3);
    assert!(events[0].starts_with("put crop-images/u1/"));
    assert!(events[0].ends_with("-paddy.jpg"));
    assert!(events[1].starts_with("url crop-images/u1/"));
    assert_eq!(events[2], "insert cropRecords");

    let path = events[0].trim_start_matches("put ");
    let written = &recorder.inserted()[0];
    assert_eq!(
        written["imageUrl"],
        json!(format!("https://objects.test/{}", path))
    );
    assert_eq!(written["userId"], json!("u1"));
}

#[tokio::test]
async fn test_crop_without_image_writes_null_url() {
    let recorder = Recorder::default();
    let backend = recording_backend(&recorder);

    crops::add_crop_record(&backend, "u1", &crop(), None)
        .await
        .unwrap();

    assert_eq!(recorder.events(), vec!["insert cropRecords"]);
    assert_eq!(recorder.inserted()[0]["imageUrl"], Value::Null);
}

#[tokio::test]
async fn test_failed_upload_writes_nothing() {
    let recorder = Recorder::default();
    let failing = FailingBackend::new("quota exceeded");
    let backend = Backend::from_parts(
        BackendKind::Real,
        Arc::new(recorder.clone()),
        Arc::new(failing.clone()),
        Arc::new(failing),
    );

    let result =
        crops::add_crop_record(&backend, "u1", &crop(), Some(Payload::new("a.jpg", vec![1]))).await;

    assert!(matches!(
        result,
        Err(ServiceError::Backend(BackendError::Unavailable(_)))
    ));
    assert!(recorder.events().is_empty());
}

// ---------------------------------------------------------------------------
// Ownership and ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_owners_never_see_each_others_documents() {
    let backend = sqlite_backend().await;

    for i in 0..3 {
        locations::add_farm_location(&backend, "alice", &field(&format!("A{}", i)))
            .await
            .unwrap();
        locations::add_farm_location(&backend, "bob", &field(&format!("B{}", i)))
            .await
            .unwrap();
    }

    let alice = locations::get_farm_locations(&backend, "alice").await.unwrap();
    let bob = locations::get_farm_locations(&backend, "bob").await.unwrap();

    assert_eq!(alice.len(), 3);
    assert!(alice.iter().all(|l| l.user_id == "alice"));
    assert!(bob.iter().all(|l| l.user_id == "bob"));
    assert!(alice.windows(2).all(|w| w[0].created_at > w[1].created_at));
    assert_eq!(
        alice.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
        vec!["A2", "A1", "A0"]
    );
}

#[tokio::test]
async fn test_equal_created_at_breaks_ties_by_insertion() {
    let backend = sqlite_backend().await;
    let stamp = "2024-01-15T10:30:00.000000Z";

    for name in ["first", "second", "third"] {
        let mut fields = to_fields(&field(name)).unwrap();
        fields.insert("userId".to_string(), json!("u1"));
        fields.insert("createdAt".to_string(), json!(stamp));
        fields.insert("updatedAt".to_string(), json!(stamp));
        backend
            .documents()
            .insert("farmLocations", fields)
            .await
            .unwrap();
    }

    let names: Vec<_> = locations::get_farm_locations(&backend, "u1")
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(names, vec!["third", "second", "first"]);
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_touches_only_named_fields() {
    let backend = sqlite_backend().await;
    let id = locations::add_farm_location(&backend, "u1", &field("North"))
        .await
        .unwrap();
    let before = backend
        .documents()
        .get("farmLocations", &id)
        .await
        .unwrap()
        .unwrap();

    locations::update_farm_location(
        &backend,
        &id,
        &FarmLocationUpdate {
            soil_type: Some("Clay".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let after = backend
        .documents()
        .get("farmLocations", &id)
        .await
        .unwrap()
        .unwrap();

    for (key, value) in &before.fields {
        match key.as_str() {
            "soilType" => assert_eq!(after.fields[key], json!("Clay")),
            "updatedAt" => {
                let old = value.as_str().unwrap();
                let new = after.fields[key].as_str().unwrap();
                assert!(new > old, "{} should be later than {}", new, old);
            }
            _ => assert_eq!(&after.fields[key], value, "field {} changed", key),
        }
    }
    assert_eq!(after.fields.len(), before.fields.len());
}

#[tokio::test]
async fn test_update_of_missing_document_creates_it() {
    let backend = sqlite_backend().await;
    locations::update_farm_location(
        &backend,
        "never-added",
        &FarmLocationUpdate {
            name: Some("Ghost".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let stored = backend
        .documents()
        .get("farmLocations", "never-added")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get("name"), Some(&json!("Ghost")));
    assert!(stored.get("updatedAt").is_some());
    assert!(stored.get("userId").is_none());
}

// ---------------------------------------------------------------------------
// Live chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_no_callbacks_after_unsubscribe() {
    let backend = sqlite_backend().await;
    let (tx, mut rx) = mpsc::unbounded_channel();

    let subscription = chat::subscribe_to_chat_messages(&backend, "u1", move |messages| {
        let _ = tx.send(messages);
    })
    .await
    .unwrap();

    let initial = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert!(initial.is_empty());

    chat::add_chat_message(&backend, "u1", &NewChatMessage::from_user("one"))
        .await
        .unwrap();
    let update = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
    assert_eq!(update.len(), 1);

    subscription.unsubscribe();
    subscription.unsubscribe();
    assert!(!subscription.is_active());

    chat::add_chat_message(&backend, "u1", &NewChatMessage::from_user("two"))
        .await
        .unwrap();

    // The callback is dropped with the listener, closing the channel.
    let after = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert!(after.is_none());
}

#[tokio::test]
async fn test_snapshots_are_full_and_ordered() {
    let backend = sqlite_backend().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = chat::subscribe_to_chat_messages(&backend, "u1", move |messages| {
        let contents: Vec<String> = messages.into_iter().map(|m| m.content).collect();
        let _ = tx.send(contents);
    })
    .await
    .unwrap();

    assert_eq!(
        timeout(Duration::from_secs(5), rx.recv()).await.unwrap(),
        Some(Vec::<String>::new())
    );

    for text in ["a", "b"] {
        chat::add_chat_message(&backend, "u1", &NewChatMessage::from_user(text))
            .await
            .unwrap();
        let mut latest = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        while latest.last().map(String::as_str) != Some(text) {
            latest = timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
        }
        assert_eq!(latest.first().map(String::as_str), Some("a"));
    }

    subscription.unsubscribe();
}

// ---------------------------------------------------------------------------
// Failure propagation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_backend_failures_reach_the_caller() {
    let failing = FailingBackend::new("network unreachable");
    let backend = Backend::from_parts(
        BackendKind::Real,
        Arc::new(failing.clone()),
        Arc::new(failing.clone()),
        Arc::new(failing),
    );

    fn is_unavailable<T: std::fmt::Debug>(result: Result<T, ServiceError>) -> bool {
        matches!(
            result,
            Err(ServiceError::Backend(BackendError::Unavailable(ref reason))) if reason == "network unreachable"
        )
    }

    assert!(is_unavailable(users::get_user_profile(&backend, "u1").await));
    assert!(is_unavailable(locations::get_farm_locations(&backend, "u1").await));
    assert!(is_unavailable(
        locations::add_farm_location(&backend, "u1", &field("N")).await
    ));
    assert!(is_unavailable(locations::delete_farm_location(&backend, "x").await));
    assert!(is_unavailable(crops::add_crop_record(&backend, "u1", &crop(), None).await));
    assert!(is_unavailable(
        weather::add_weather_alert(
            &backend,
            "u1",
            &NewWeatherAlert {
                alert_type: AlertType::Severe,
                title: "Hailstorm".to_string(),
                description: "Expected tonight".to_string(),
                time: None,
            }
        )
        .await
    ));
    assert!(is_unavailable(
        market::add_price_alert(
            &backend,
            "u1",
            &NewPriceAlert {
                crop: "Rice".to_string(),
                target_price: 3000.0,
                direction: PriceDirection::Below,
            }
        )
        .await
    ));
    assert!(is_unavailable(market::get_market_prices(&backend, Some("north")).await));
    assert!(is_unavailable(chat::get_chat_history(&backend, "u1").await));
    assert!(chat::subscribe_to_chat_messages(&backend, "u1", |_| {}).await.is_err());
}
