//! Plan-product index: which external products grant which plans.

use std::sync::Arc;

use chrono::Utc;
use turnstile_core::models::ProductLink;
use turnstile_core::types::{PlanId, ProductId};

use crate::errors::TurnstileResult;
use crate::storage::{self, ConnectionPool};

#[derive(Clone)]
pub struct PlanProductIndex {
    pool: Arc<ConnectionPool>,
}

impl PlanProductIndex {
    pub(crate) fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Plans granted by purchasing a product. Empty for products with
    /// no membership attached.
    pub fn plans_for_product(&self, product_id: ProductId) -> TurnstileResult<Vec<PlanId>> {
        self.pool
            .with_reader(|conn| storage::products::plans_for_product(conn, product_id))
    }

    pub fn products_for_plan(&self, plan_id: PlanId) -> TurnstileResult<Vec<ProductLink>> {
        self.pool
            .with_reader(|conn| storage::products::products_for_plan(conn, plan_id))
    }

    /// Replace a plan's full product set.
    pub fn set_for_plan(
        &self,
        plan_id: PlanId,
        products: &[(ProductId, &str)],
    ) -> TurnstileResult<()> {
        self.pool
            .with_writer(|conn| storage::products::replace_for_plan(conn, plan_id, products, Utc::now()))
    }
}
