use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::AuditStamps;
use crate::error::{AppError, AppResult};
use crate::utils::validators::validate_money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "hostel_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HostelType {
    Boys,
    Girls,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Hostel {
    pub id: Uuid,
    pub name: String,
    pub hostel_type: HostelType,
    pub total_rooms: i32,
    pub address: String,
    pub contract_start_date: NaiveDate,
    pub contract_end_date: Option<NaiveDate>,
    pub deposit_fee: Decimal,
    pub initial_fee: Decimal,
    pub internet_fee: Decimal,
    pub utilities_fee: Decimal,
    pub rent: Decimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateHostelRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub hostel_type: HostelType,
    #[validate(range(min = 1))]
    pub total_rooms: i32,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    pub contract_start_date: NaiveDate,
    pub contract_end_date: Option<NaiveDate>,
    pub deposit_fee: Decimal,
    pub initial_fee: Decimal,
    pub internet_fee: Decimal,
    pub utilities_fee: Decimal,
    pub rent: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "unit_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Bedroom,
    Kitchen,
    Bathroom,
    Toilet,
    ToiletBathroom,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Unit {
    pub id: Uuid,
    pub hostel_id: Uuid,
    pub unit_type: UnitType,
    pub room_num: Option<String>,
    pub num_of_beds: Option<i32>,
    pub unit_id: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUnitRequest {
    pub unit_type: UnitType,
    pub room_num: Option<String>,
    pub num_of_beds: Option<i32>,
    pub unit_id: Option<String>,
}

/// Validated shape of a unit: bedrooms carry a room number and bed count,
/// every other unit type carries its own identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitKind {
    Bedroom { room_num: String, num_of_beds: i32 },
    Facility { unit_type: UnitType, unit_id: String },
}

impl UnitKind {
    pub fn unit_type(&self) -> UnitType {
        match self {
            UnitKind::Bedroom { .. } => UnitType::Bedroom,
            UnitKind::Facility { unit_type, .. } => *unit_type,
        }
    }
}

impl CreateUnitRequest {
    pub fn kind(&self) -> AppResult<UnitKind> {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        match self.unit_type {
            UnitType::Bedroom => {
                let room_num = text(&self.room_num).ok_or_else(|| {
                    AppError::validation("room_num", "a bedroom needs a room number")
                })?;
                let num_of_beds = self.num_of_beds.filter(|n| *n >= 1).ok_or_else(|| {
                    AppError::validation("num_of_beds", "a bedroom needs at least one bed")
                })?;
                Ok(UnitKind::Bedroom {
                    room_num,
                    num_of_beds,
                })
            }
            unit_type => {
                let unit_id = text(&self.unit_id).ok_or_else(|| {
                    AppError::validation("unit_id", "a facility unit needs an identifier")
                })?;
                Ok(UnitKind::Facility { unit_type, unit_id })
            }
        }
    }
}

impl CreateHostelRequest {
    /// Fee schedule amounts are non-negative with at most two decimals.
    pub fn validate_fees(&self) -> AppResult<()> {
        validate_money("deposit_fee", self.deposit_fee)?;
        validate_money("initial_fee", self.initial_fee)?;
        validate_money("internet_fee", self.internet_fee)?;
        validate_money("utilities_fee", self.utilities_fee)?;
        validate_money("rent", self.rent)?;
        if let Some(end) = self.contract_end_date {
            if end < self.contract_start_date {
                return Err(AppError::validation(
                    "contract_end_date",
                    "contract end date precedes start date",
                ));
            }
        }
        Ok(())
    }
}
