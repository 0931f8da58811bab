use crate::db::{DbPool, OrmConn};
use crate::notifier::BalanceNotifier;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub notifier: BalanceNotifier,
}
