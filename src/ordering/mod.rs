//! Order placement: validation, pricing, numbering and persistence.

pub mod number;
pub mod pricing;

use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::db::orders::{NewOrder, NewOrderItem};
use crate::error::AppError;
use crate::models::{LocationType, Order, PaymentMethod, Restaurant};

/// Attempts at numbering an order before a sequence collision is surfaced.
pub const MAX_NUMBERING_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct OrderDraft {
    pub customer_name: String,
    pub location_type: LocationType,
    pub room_number: Option<String>,
    pub table_number: Option<String>,
    pub items: Vec<DraftItem>,
    pub payment_method: PaymentMethod,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DraftItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub special_instructions: Option<String>,
}

impl OrderDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.customer_name.trim().is_empty() {
            return Err(AppError::BadRequest("Customer name is required".to_string()));
        }
        if self.items.is_empty() {
            return Err(AppError::BadRequest(
                "An order needs at least one item".to_string(),
            ));
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(AppError::BadRequest("Item name is required".to_string()));
            }
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(AppError::BadRequest(format!(
                    "Invalid price for item '{}'",
                    item.name
                )));
            }
            if item.quantity < 1 {
                return Err(AppError::BadRequest(format!(
                    "Quantity for item '{}' must be at least 1",
                    item.name
                )));
            }
        }
        Ok(())
    }
}

/// Price, number and store a new order for `restaurant`.
///
/// The day's sequence is read before the insert without a lock, so two
/// concurrent orders can pick the same number. The unique index rejects the
/// loser, which recounts and tries again.
pub async fn place(
    pool: &PgPool,
    restaurant: &Restaurant,
    draft: &OrderDraft,
) -> Result<Order, AppError> {
    draft.validate()?;

    let prefix = number::prefix(&restaurant.name);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let now = Utc::now();
        let (start, end) = number::day_bounds(now);
        let today = db::orders::count_created_between(pool, restaurant.id, start, end).await?;
        let order_number = number::format(&prefix, now.date_naive(), today + 1);

        match insert(pool, restaurant.id, &order_number, draft).await {
            Err(AppError::Conflict(msg)) if attempt < MAX_NUMBERING_ATTEMPTS => {
                tracing::warn!(
                    restaurant_id = %restaurant.id,
                    order_number = %order_number,
                    attempt,
                    "Order number taken, retrying: {msg}"
                );
            }
            result => return result,
        }
    }
}

/// Store `draft` under a specific order number. A number already used by the
/// restaurant is a `Conflict`.
pub async fn insert(
    pool: &PgPool,
    restaurant_id: Uuid,
    order_number: &str,
    draft: &OrderDraft,
) -> Result<Order, AppError> {
    let totals = pricing::totals(draft.items.iter().map(|i| (i.price, i.quantity)));
    let new = NewOrder {
        restaurant_id,
        order_number,
        customer_name: draft.customer_name.trim(),
        location_type: draft.location_type,
        room_number: draft.room_number.as_deref(),
        table_number: draft.table_number.as_deref(),
        subtotal: totals.subtotal,
        tax: totals.tax,
        delivery_fee: totals.delivery_fee,
        total: totals.total,
        payment_method: draft.payment_method,
        special_instructions: draft.special_instructions.as_deref(),
        estimated_delivery_time: pricing::estimated_delivery(Utc::now()),
        items: draft
            .items
            .iter()
            .map(|item| NewOrderItem {
                menu_item_id: item.menu_item_id,
                name: item.name.trim(),
                price: item.price,
                quantity: item.quantity,
                special_instructions: item.special_instructions.as_deref(),
            })
            .collect(),
    };

    let mut tx = pool.begin().await?;
    let order = db::orders::create(&mut *tx, &new)
        .await
        .map_err(AppError::conflict_on_unique(
            "An order with this number already exists, please retry",
        ))?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        restaurant_id = %restaurant_id,
        order_number = %order.order_number,
        total = order.total,
        "Order placed"
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(items: Vec<DraftItem>) -> OrderDraft {
        OrderDraft {
            customer_name: "Ada".to_string(),
            location_type: LocationType::Lodge,
            room_number: Some("12".to_string()),
            table_number: None,
            items,
            payment_method: PaymentMethod::RoomCharge,
            special_instructions: None,
        }
    }

    fn item(price: f64, quantity: i32) -> DraftItem {
        DraftItem {
            menu_item_id: Uuid::now_v7(),
            name: "Jollof".to_string(),
            price,
            quantity,
            special_instructions: None,
        }
    }

    #[test]
    fn accepts_a_well_formed_draft() {
        assert!(draft(vec![item(10.0, 2), item(0.0, 1)]).validate().is_ok());
    }

    #[test]
    fn rejects_empty_basket() {
        assert!(matches!(
            draft(vec![]).validate(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(draft(vec![item(-1.0, 1)]).validate().is_err());
        assert!(draft(vec![item(f64::NAN, 1)]).validate().is_err());
        assert!(draft(vec![item(5.0, 0)]).validate().is_err());
    }

    #[test]
    fn rejects_blank_customer() {
        let mut d = draft(vec![item(1.0, 1)]);
        d.customer_name = "  ".to_string();
        assert!(d.validate().is_err());
    }

    #[test]
    fn deserializes_wire_format() {
        let d: OrderDraft = serde_json::from_value(serde_json::json!({
            "customer_name": "Ada",
            "location_type": "bar-lounge",
            "table_number": "T4",
            "payment_method": "cash",
            "items": [{
                "menu_item_id": Uuid::now_v7(),
                "name": "Chapman",
                "price": 4.5,
                "quantity": 2
            }]
        }))
        .unwrap();
        assert_eq!(d.location_type, LocationType::BarLounge);
        assert_eq!(d.payment_method, PaymentMethod::Cash);
        assert_eq!(d.items[0].quantity, 2);
    }
}
