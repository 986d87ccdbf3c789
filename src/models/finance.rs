use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::AuditStamps;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "target_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Active,
    Completed,
    Overdue,
    Cancelled,
}

impl Default for TargetStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Target {
    pub id: Uuid,
    pub user_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub target_amount: Decimal,
    pub status: TargetStatus,
    pub description: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TargetResponse {
    #[serde(flatten)]
    pub target: Target,
    pub achieved_amount: Decimal,
    pub achievement_rate: Decimal,
    pub contract_count: i64,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTargetRequest {
    pub user_id: Uuid,
    pub year: i32,
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
    #[serde(alias = "amount")]
    pub target_amount: Decimal,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkAssignTargetsRequest {
    pub user_ids: Vec<Uuid>,
    pub year: i32,
    pub month: u32,
    #[serde(alias = "amount")]
    pub target_amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTargetStatusRequest {
    pub status: TargetStatus,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TargetsQuery {
    pub user_id: Option<Uuid>,
    pub year: Option<i32>,
    pub month: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "contract_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    FixTerm,
    Regular,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RentalContract {
    pub id: Uuid,
    pub target_id: Uuid,
    pub customer_name: String,
    pub customer_number: String,
    pub building_address: String,
    pub contract_date: NaiveDate,
    pub agent_fee: Decimal,
    pub ad_fee: Decimal,
    pub contract_type: ContractType,
    pub contract_terms: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

impl RentalContract {
    pub fn total_amount(&self) -> Decimal {
        self.agent_fee + self.ad_fee
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RentalContractResponse {
    #[serde(flatten)]
    pub contract: RentalContract,
    pub total_amount: Decimal,
}

impl From<RentalContract> for RentalContractResponse {
    fn from(contract: RentalContract) -> Self {
        let total_amount = contract.total_amount();
        Self {
            contract,
            total_amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRentalContractRequest {
    #[validate(length(min = 1, max = 100))]
    pub customer_name: String,
    pub customer_number: String,
    #[validate(length(min = 1, max = 255))]
    pub building_address: String,
    pub contract_date: NaiveDate,
    pub agent_fee: Decimal,
    pub ad_fee: Decimal,
    pub contract_type: ContractType,
    #[validate(length(max = 2000))]
    pub contract_terms: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_amount_accepts_amount_key() {
        let user_id = Uuid::new_v4();
        let request: CreateTargetRequest = serde_json::from_value(json!({
            "user_id": user_id,
            "year": 2025,
            "month": 3,
            "amount": "300000"
        }))
        .unwrap();
        assert_eq!(request.target_amount, Decimal::new(300000, 0));

        let bulk: BulkAssignTargetsRequest = serde_json::from_value(json!({
            "user_ids": [user_id],
            "year": 2025,
            "month": 3,
            "target_amount": "150000.50"
        }))
        .unwrap();
        assert_eq!(bulk.target_amount, Decimal::new(15000050, 2));
    }
}
