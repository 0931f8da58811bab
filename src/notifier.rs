use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

use crate::{
    audit::log_audit,
    error::{AppError, AppResult},
    state::AppState,
};

/// Outbound event: a user's balance changed. Delivered to every subscriber,
/// not just the affected user's connections.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceUpdate {
    pub username: String,
    pub balance: Decimal,
}

/// Fan-out hub for balance change events. The socket transport subscribes
/// here and forwards events to connected clients.
#[derive(Clone)]
pub struct BalanceNotifier {
    tx: broadcast::Sender<BalanceUpdate>,
}

impl BalanceNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BalanceUpdate> {
        self.tx.subscribe()
    }

    /// Receivers that lagged or disconnected are not an error here.
    pub fn publish(&self, update: BalanceUpdate) {
        let _ = self.tx.send(update);
    }
}

impl Default for BalanceNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Inbound "add money" event handler. Credits the account and broadcasts the
/// new balance. The amount is applied as sent; only checkout guards against
/// the balance going negative.
pub async fn add_money(
    state: &AppState,
    username: &str,
    amount: Decimal,
) -> AppResult<BalanceUpdate> {
    let row: Option<(uuid::Uuid, Decimal)> = sqlx::query_as(
        "UPDATE users SET balance = balance + $2 WHERE username = $1 RETURNING id, balance",
    )
    .bind(username)
    .bind(amount)
    .fetch_optional(&state.pool)
    .await?;

    let (user_id, balance) = match row {
        Some(row) => row,
        None => return Err(AppError::NotFound),
    };

    log_audit(
        &state.pool,
        Some(user_id),
        "balance_add",
        Some("users"),
        Some(serde_json::json!({ "amount": amount.to_string() })),
    )
    .await;

    let update = BalanceUpdate {
        username: username.to_string(),
        balance,
    };
    state.notifier.publish(update.clone());
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn every_subscriber_sees_every_update() {
        let notifier = BalanceNotifier::new(8);
        let mut rx_a = notifier.subscribe();
        let mut rx_b = notifier.subscribe();

        notifier.publish(BalanceUpdate {
            username: "frodo1".into(),
            balance: Decimal::new(1250, 2),
        });
        notifier.publish(BalanceUpdate {
            username: "samwise".into(),
            balance: Decimal::new(300, 2),
        });

        for rx in [&mut rx_a, &mut rx_b] {
            let first = rx.recv().await.expect("first event");
            assert_eq!(first.username, "frodo1");
            let second = rx.recv().await.expect("second event");
            assert_eq!(second.username, "samwise");
        }
    }

    #[test]
    fn publish_without_subscribers_is_ok() {
        let notifier = BalanceNotifier::new(8);
        notifier.publish(BalanceUpdate {
            username: "nobody1".into(),
            balance: Decimal::ZERO,
        });
    }
}
