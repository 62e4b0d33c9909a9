//! Market prices and per-user price alerts.

use backend_core::{Direction, Fields, Query};
use serde_json::{json, Value};

use crate::backend::Backend;
use crate::documents;
use crate::error::Result;
use crate::models::{
    fields, EntityKind, MarketPrice, NewMarketPrice, NewPriceAlert, PriceAlert,
};

/// Region name that matches every region.
pub const ALL_REGIONS: &str = "all";

/// Latest quotes, most recently updated first.
///
/// `None` or [`ALL_REGIONS`] returns every region.
pub async fn get_market_prices(backend: &Backend, region: Option<&str>) -> Result<Vec<MarketPrice>> {
    let mut query = Query::collection(EntityKind::MarketPrice.collection());
    if let Some(region) = region.filter(|r| *r != ALL_REGIONS) {
        query = query.where_eq(fields::REGION, Value::String(region.to_string()));
    }
    let query = query.order_by(fields::UPDATED_AT, Direction::Descending);
    documents::list(backend, &query).await
}

/// Publish a quote. Prices are global, so no owner is recorded.
pub async fn add_market_price(backend: &Backend, quote: &NewMarketPrice) -> Result<String> {
    let mut document = documents::encode(EntityKind::MarketPrice, quote)?;
    document.insert("change".to_string(), json!(quote.change()));
    document.insert("changePercent".to_string(), json!(quote.change_percent()));
    document.insert(
        fields::UPDATED_AT.to_string(),
        Value::String(backend.clock().now().to_string()),
    );

    let id = backend
        .documents()
        .insert(EntityKind::MarketPrice.collection(), document)
        .await?;
    Ok(id)
}

/// The user's price alerts, newest first.
pub async fn get_user_price_alerts(backend: &Backend, user_id: &str) -> Result<Vec<PriceAlert>> {
    documents::list_for_owner(backend, user_id).await
}

pub async fn add_price_alert(backend: &Backend, user_id: &str, alert: &NewPriceAlert) -> Result<String> {
    documents::insert_owned(
        backend,
        EntityKind::PriceAlert,
        user_id,
        alert,
        Fields::new(),
        &[fields::CREATED_AT],
    )
    .await
}

/// Alerts of `user_id` whose target is met by one of `prices`.
pub async fn triggered_price_alerts(
    backend: &Backend,
    user_id: &str,
    prices: &[MarketPrice],
) -> Result<Vec<(PriceAlert, MarketPrice)>> {
    let alerts = get_user_price_alerts(backend, user_id).await?;
    Ok(alerts
        .into_iter()
        .filter_map(|alert| {
            prices
                .iter()
                .find(|price| alert.is_triggered_by(price))
                .cloned()
                .map(|price| (alert, price))
        })
        .collect())
}
