use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::AuditStamps;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(type_name = "revenue_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RevenueKind {
    RegistrationFee,
    Rent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Prepaid,
    Postpaid,
}

/// One ledger row; which amount columns are filled depends on `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RevenueEntry {
    pub id: Uuid,
    pub kind: RevenueKind,
    pub customer_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub deposit: Option<Decimal>,
    pub deposit_discount_pct: Option<Decimal>,
    pub deposit_after: Option<Decimal>,
    pub initial_fee: Option<Decimal>,
    pub initial_fee_discount_pct: Option<Decimal>,
    pub initial_fee_after: Option<Decimal>,
    pub rent: Option<Decimal>,
    pub rent_discount_pct: Option<Decimal>,
    pub rent_after: Option<Decimal>,
    pub internet: Option<Decimal>,
    pub utilities: Option<Decimal>,
    pub total_amount: Decimal,
    pub payment_type: Option<PaymentType>,
    pub prepaid_amount: Option<Decimal>,
    pub memo: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostRevenueRequest {
    RegistrationFee(RegistrationFeeInput),
    Rent(RentInput),
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegistrationFeeInput {
    pub customer_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub deposit: Decimal,
    #[serde(default)]
    pub deposit_discount_pct: Decimal,
    pub initial_fee: Decimal,
    #[serde(default)]
    pub initial_fee_discount_pct: Decimal,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RentInput {
    pub customer_id: Uuid,
    pub year: i32,
    pub month: u32,
    pub rent: Decimal,
    #[serde(default)]
    pub rent_discount_pct: Decimal,
    pub internet: Decimal,
    pub utilities: Decimal,
    pub payment_type: Option<PaymentType>,
    pub prepaid_amount: Option<Decimal>,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RevenueQuery {
    pub customer_id: Option<Uuid>,
    pub kind: Option<RevenueKind>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
