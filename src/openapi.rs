use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hostel Back-Office API",
        version = "1.0.0",
        description = "Occupancy, revenue ledger and sales targets for the hostel back office"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "auth", description = "Sign-in and session refresh"),
        (name = "users", description = "Back-office users"),
        (name = "hostels", description = "Hostels and their units"),
        (name = "beds", description = "Beds, assignment and release"),
        (name = "customers", description = "Tenants and their documents"),
        (name = "revenue", description = "Revenue ledger"),
        (name = "utilities", description = "Utility bills paid per hostel"),
        (name = "reports", description = "Defaulters and unpaid utility bills"),
        (name = "targets", description = "Monthly sales targets and rental contracts")
    ),
    paths(
        // Auth
        crate::api::auth::login,
        crate::api::auth::refresh_token,
        // Users
        crate::api::users::get_me,
        crate::api::users::create_user,
        crate::api::users::list_users,
        // Hostels
        crate::api::hostels::create_hostel,
        crate::api::hostels::list_hostels,
        crate::api::hostels::get_hostel,
        crate::api::hostels::create_unit,
        crate::api::hostels::list_units,
        // Beds
        crate::api::beds::create_bed,
        crate::api::beds::list_beds,
        crate::api::beds::assign_bed,
        crate::api::beds::set_released_date,
        crate::api::beds::settle_bed,
        crate::api::beds::bed_history,
        // Customers
        crate::api::customers::create_customer,
        crate::api::customers::list_customers,
        crate::api::customers::get_customer,
        crate::api::customers::update_customer_status,
        crate::api::customers::upload_document,
        // Revenue
        crate::api::revenue::post_revenue,
        crate::api::revenue::list_revenue,
        // Utilities
        crate::api::utility_expenses::create_expense,
        crate::api::utility_expenses::list_expenses,
        // Reports
        crate::api::reports::defaulters,
        crate::api::reports::utility_status,
        // Targets
        crate::api::targets::create_target,
        crate::api::targets::bulk_assign_targets,
        crate::api::targets::update_target_status,
        crate::api::targets::list_targets,
        crate::api::targets::create_rental_contract,
        crate::api::targets::list_contracts,
    ),
    components(
        schemas(
            crate::models::AuditStamps,
            // Users
            crate::models::UserPublic,
            crate::models::LoginRequest,
            crate::models::TokenResponse,
            crate::models::CreateUserRequest,
            // Hostels
            crate::models::HostelType,
            crate::models::Hostel,
            crate::models::CreateHostelRequest,
            crate::models::UnitType,
            crate::models::Unit,
            crate::models::CreateUnitRequest,
            // Beds
            crate::models::Bed,
            crate::models::BedAssignmentHistory,
            crate::models::CreateBedRequest,
            crate::models::AssignBedRequest,
            crate::models::SetReleasedDateRequest,
            crate::services::occupancy_service::OccupancyOutcome,
            // Customers
            crate::models::VisaType,
            crate::models::Customer,
            crate::models::CreateCustomerRequest,
            crate::models::UpdateCustomerStatusRequest,
            crate::models::CustomerDocumentKind,
            // Revenue
            crate::models::RevenueKind,
            crate::models::PaymentType,
            crate::models::RevenueEntry,
            crate::models::PostRevenueRequest,
            crate::models::RegistrationFeeInput,
            crate::models::RentInput,
            // Utilities
            crate::models::ExpenseType,
            crate::models::UtilityExpense,
            crate::models::CreateUtilityExpenseRequest,
            // Reports
            crate::utils::period::YearMonth,
            crate::services::defaulter_service::TenancyType,
            crate::services::defaulter_service::Defaulter,
            crate::services::utility_status_service::UtilityStatus,
            // Targets
            crate::models::TargetStatus,
            crate::models::Target,
            crate::models::TargetResponse,
            crate::models::CreateTargetRequest,
            crate::models::BulkAssignTargetsRequest,
            crate::models::UpdateTargetStatusRequest,
            crate::models::ContractType,
            crate::models::RentalContract,
            crate::models::RentalContractResponse,
            crate::models::CreateRentalContractRequest,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
