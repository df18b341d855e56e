use std::sync::Arc;

use crate::balance::engine::BalanceEngine;
use crate::accrual::intake::IntakeService;
use crate::users::service::UserService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub intake_service: Arc<IntakeService>,
    pub balance_engine: Arc<BalanceEngine>,
    pub jwt_secret: String,
}
