use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::AuditStamps;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
    ToSchema,
)]
#[sqlx(type_name = "expense_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpenseType {
    Internet,
    Electricity,
    Gas,
    Water,
}

impl ExpenseType {
    pub fn label(&self) -> &'static str {
        match self {
            ExpenseType::Internet => "Internet",
            ExpenseType::Electricity => "Electricity",
            ExpenseType::Gas => "Gas",
            ExpenseType::Water => "Water",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UtilityExpense {
    pub id: Uuid,
    pub hostel_id: Uuid,
    pub expense_type: ExpenseType,
    pub billing_year: i32,
    pub billing_month: i32,
    pub amount: Decimal,
    pub memo: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUtilityExpenseRequest {
    pub hostel_id: Uuid,
    pub expense_type: ExpenseType,
    pub billing_year: i32,
    pub billing_month: u32,
    pub amount: Decimal,
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct UtilityExpenseQuery {
    pub hostel_id: Option<Uuid>,
    pub expense_type: Option<ExpenseType>,
    pub billing_year: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
