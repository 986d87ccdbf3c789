use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::AuditStamps;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Bed {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub bed_num: String,
    pub customer_id: Option<Uuid>,
    pub assigned_date: Option<NaiveDate>,
    pub released_date: Option<NaiveDate>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

/// Append-only record of a finished bed tenure.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BedAssignmentHistory {
    pub id: Uuid,
    pub bed_id: Uuid,
    pub customer_id: Uuid,
    pub assigned_date: NaiveDate,
    pub released_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBedRequest {
    #[validate(length(min = 1, max = 10))]
    pub bed_num: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignBedRequest {
    pub bed_id: Uuid,
    pub customer_id: Uuid,
    pub assigned_date: NaiveDate,
}

/// `released_date = null` withdraws a pending release.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetReleasedDateRequest {
    pub bed_id: Uuid,
    pub released_date: Option<NaiveDate>,
}
