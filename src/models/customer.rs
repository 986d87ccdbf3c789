use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::AuditStamps;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "visa_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VisaType {
    Student,
    Engineer,
    SpecifiedSkilledWorker,
    TechnicalIntern,
    DesignatedActivities,
    WorkingHoliday,
    Dependent,
    Spouse,
    PermanentResident,
    LongTermResident,
    TemporaryVisitor,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub nationality: String,
    pub visa_type: VisaType,
    pub residence_card_number: String,
    pub residence_card_expiry: NaiveDate,
    pub passport_document_url: Option<String>,
    pub residence_card_document_url: Option<String>,
    pub active: bool,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditStamps,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub date_of_birth: NaiveDate,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    #[validate(length(equal = 2))]
    pub nationality: String,
    pub visa_type: VisaType,
    #[validate(length(min = 1, max = 20))]
    pub residence_card_number: String,
    pub residence_card_expiry: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCustomerStatusRequest {
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerDocumentKind {
    Passport,
    ResidenceCard,
}

impl CustomerDocumentKind {
    pub fn column(&self) -> &'static str {
        match self {
            CustomerDocumentKind::Passport => "passport_document_url",
            CustomerDocumentKind::ResidenceCard => "residence_card_document_url",
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CustomersQuery {
    pub active: Option<bool>,
    pub query: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
