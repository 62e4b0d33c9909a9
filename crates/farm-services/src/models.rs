//! Typed entities stored by the farm dashboard.
//!
//! Every entity is a document in one collection. Field names are camelCase
//! on the wire. The `New*` structs are what callers supply on insert and the
//! `*Update` structs are partial patches; neither carries the owner id or
//! any stamp, so those are always injected by the facade.

use std::fmt;
use std::str::FromStr;

use backend_core::{AuthUser, Document, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Field names the facade injects.
pub mod fields {
    pub const USER_ID: &str = "userId";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const TIMESTAMP: &str = "timestamp";
    pub const IMAGE_URL: &str = "imageUrl";
    pub const REGION: &str = "region";
}

/// The seven entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    UserProfile,
    FarmLocation,
    CropRecord,
    WeatherAlert,
    MarketPrice,
    PriceAlert,
    ChatMessage,
}

impl EntityKind {
    /// Every kind, in dashboard order.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::UserProfile,
        EntityKind::FarmLocation,
        EntityKind::CropRecord,
        EntityKind::WeatherAlert,
        EntityKind::MarketPrice,
        EntityKind::PriceAlert,
        EntityKind::ChatMessage,
    ];

    /// Collection holding documents of this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::UserProfile => "users",
            EntityKind::FarmLocation => "farmLocations",
            EntityKind::CropRecord => "cropRecords",
            EntityKind::WeatherAlert => "weatherAlerts",
            EntityKind::MarketPrice => "marketPrices",
            EntityKind::PriceAlert => "priceAlerts",
            EntityKind::ChatMessage => "chatMessages",
        }
    }

    /// Look up the kind stored in `collection`.
    pub fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.collection() == collection)
    }

    /// Decode a raw document of this kind.
    pub fn decode(&self, document: &Document) -> Result<Entity, serde_json::Error> {
        Ok(match self {
            EntityKind::UserProfile => Entity::UserProfile(document.decode()?),
            EntityKind::FarmLocation => Entity::FarmLocation(document.decode()?),
            EntityKind::CropRecord => Entity::CropRecord(document.decode()?),
            EntityKind::WeatherAlert => Entity::WeatherAlert(document.decode()?),
            EntityKind::MarketPrice => Entity::MarketPrice(document.decode()?),
            EntityKind::PriceAlert => Entity::PriceAlert(document.decode()?),
            EntityKind::ChatMessage => Entity::ChatMessage(document.decode()?),
        })
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// Error returned when parsing an unknown collection name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for EntityKind {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_collection(s).ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

/// A typed record stored in a known collection.
pub trait Record: DeserializeOwned + Send + 'static {
    const KIND: EntityKind;
}

/// Any stored entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Entity {
    UserProfile(UserProfile),
    FarmLocation(FarmLocation),
    CropRecord(CropRecord),
    WeatherAlert(WeatherAlert),
    MarketPrice(MarketPrice),
    PriceAlert(PriceAlert),
    ChatMessage(ChatMessage),
}

impl Entity {
    /// Kind of this entity.
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::UserProfile(_) => EntityKind::UserProfile,
            Entity::FarmLocation(_) => EntityKind::FarmLocation,
            Entity::CropRecord(_) => EntityKind::CropRecord,
            Entity::WeatherAlert(_) => EntityKind::WeatherAlert,
            Entity::MarketPrice(_) => EntityKind::MarketPrice,
            Entity::PriceAlert(_) => EntityKind::PriceAlert,
            Entity::ChatMessage(_) => EntityKind::ChatMessage,
        }
    }

    /// Document id of this entity.
    pub fn id(&self) -> &str {
        match self {
            Entity::UserProfile(e) => &e.id,
            Entity::FarmLocation(e) => &e.id,
            Entity::CropRecord(e) => &e.id,
            Entity::WeatherAlert(e) => &e.id,
            Entity::MarketPrice(e) => &e.id,
            Entity::PriceAlert(e) => &e.id,
            Entity::ChatMessage(e) => &e.id,
        }
    }
}

// ---------------------------------------------------------------------------
// User profiles
// ---------------------------------------------------------------------------

/// A user's profile, keyed by the auth user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl UserProfile {
    /// Basic profile built from auth information alone.
    pub fn from_auth(user: &AuthUser) -> Self {
        Self {
            id: user.uid.clone(),
            email: Some(user.email.clone()),
            display_name: user.display_name.clone(),
            photo_url: user.photo_url.clone(),
            farm_name: None,
            phone: None,
            updated_at: None,
        }
    }
}

impl Record for UserProfile {
    const KIND: EntityKind = EntityKind::UserProfile;
}

/// Partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// ---------------------------------------------------------------------------
// Farm locations
// ---------------------------------------------------------------------------

/// Geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A field or farm site owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmLocation {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Area in acres.
    pub area: f64,
    pub crop_type: String,
    pub soil_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record for FarmLocation {
    const KIND: EntityKind = EntityKind::FarmLocation;
}

/// Fields supplied when adding a farm location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFarmLocation {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub area: f64,
    pub crop_type: String,
    pub soil_type: String,
}

/// Partial farm location update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmLocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Crop records
// ---------------------------------------------------------------------------

/// Overall crop health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Result of analysing a crop photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropAnalysis {
    /// 0-100.
    pub health_score: u8,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub yield_prediction: String,
    pub status: HealthStatus,
}

/// A crop observation, optionally with a photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecord {
    pub id: String,
    pub user_id: String,
    pub crop_type: String,
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CropAnalysis>,
    #[serde(default)]
    pub notes: String,
    /// Set only when a photo was uploaded with the record.
    pub image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Record for CropRecord {
    const KIND: EntityKind = EntityKind::CropRecord;
}

/// Fields supplied when adding a crop record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCropRecord {
    pub crop_type: String,
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CropAnalysis>,
    #[serde(default)]
    pub notes: String,
}

/// Partial crop record update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRecordUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<CropAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Weather alerts
// ---------------------------------------------------------------------------

/// Severity of a weather alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Warning,
    Info,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlert {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub title: String,
    pub description: String,
    /// Free-form time of the event, e.g. "Tomorrow 2:00 PM".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub created_at: Timestamp,
}

impl Record for WeatherAlert {
    const KIND: EntityKind = EntityKind::WeatherAlert;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWeatherAlert {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

// ---------------------------------------------------------------------------
// Market prices and price alerts
// ---------------------------------------------------------------------------

/// Direction a price moved since the previous quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Up,
    Down,
    Stable,
}

/// A quote for one crop at one market. Not owned by any user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrice {
    pub id: String,
    pub crop: String,
    pub current_price: f64,
    pub previous_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub unit: String,
    pub market: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl MarketPrice {
    pub fn trend(&self) -> PriceTrend {
        if self.change > 0.0 {
            PriceTrend::Up
        } else if self.change < 0.0 {
            PriceTrend::Down
        } else {
            PriceTrend::Stable
        }
    }
}

impl Record for MarketPrice {
    const KIND: EntityKind = EntityKind::MarketPrice;
}

/// A new quote. `change` and `changePercent` are derived from the prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarketPrice {
    pub crop: String,
    pub current_price: f64,
    pub previous_price: f64,
    pub unit: String,
    pub market: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl NewMarketPrice {
    pub fn change(&self) -> f64 {
        self.current_price - self.previous_price
    }

    pub fn change_percent(&self) -> f64 {
        if self.previous_price == 0.0 {
            return 0.0;
        }
        (self.change() / self.previous_price * 10000.0).round() / 100.0
    }
}

/// Side of the target price that triggers an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: String,
    pub user_id: String,
    pub crop: String,
    pub target_price: f64,
    pub direction: PriceDirection,
    pub created_at: Timestamp,
}

impl PriceAlert {
    /// Whether `price` meets this alert's target.
    pub fn is_triggered_by(&self, price: &MarketPrice) -> bool {
        price.crop.eq_ignore_ascii_case(&self.crop)
            && match self.direction {
                PriceDirection::Above => price.current_price >= self.target_price,
                PriceDirection::Below => price.current_price <= self.target_price,
            }
    }
}

impl Record for PriceAlert {
    const KIND: EntityKind = EntityKind::PriceAlert;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPriceAlert {
    pub crop: String,
    pub target_price: f64,
    pub direction: PriceDirection,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Suggestion,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub sender: Sender,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
    pub timestamp: Timestamp,
}

impl Record for ChatMessage {
    const KIND: EntityKind = EntityKind::ChatMessage;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatMessage {
    pub content: String,
    pub sender: Sender,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
}

impl NewChatMessage {
    /// A plain message typed by the user.
    pub fn from_user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender: Sender::User,
            message_type: Some(MessageType::Text),
        }
    }

    /// A message written by the advisor.
    pub fn from_ai(content: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            content: content.into(),
            sender: Sender::Ai,
            message_type: Some(message_type),
        }
    }
}
