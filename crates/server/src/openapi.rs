use utoipa::{IntoParams, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct MessageDoc { pub message: String }

#[derive(ToSchema)]
pub struct ErrorDoc { pub error: String }

#[derive(ToSchema)]
pub struct ContactInputDoc {
    #[schema(min_length = 1, max_length = 50)]
    pub first_name: String,
    #[schema(min_length = 1, max_length = 50)]
    pub last_name: String,
    #[schema(example = "john.doe@example.com")]
    pub email: String,
    #[schema(min_length = 1, max_length = 20)]
    pub phone: String,
    #[schema(example = "1990-01-31")]
    pub birth_date: String,
    #[schema(max_length = 150)]
    pub notes: Option<String>,
}

#[derive(ToSchema)]
pub struct ContactDoc {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[schema(example = "1990-01-31")]
    pub birth_date: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(ToSchema)]
pub struct ContactListDoc {
    pub total_count: u64,
    pub items: Vec<ContactDoc>,
}

#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
#[allow(dead_code)]
pub struct ListContactsParams {
    /// Number of records to skip
    skip: Option<u64>,
    /// Max number of records to return (<= 500)
    limit: Option<u64>,
    /// Filter by first name, last name or email
    search_text: Option<String>,
    /// Only contacts with a birthday in the next 7 days
    upcoming_birthdays: Option<bool>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::healthchecker,
        crate::routes::contacts::list,
        crate::routes::contacts::get,
        crate::routes::contacts::create,
        crate::routes::contacts::update,
        crate::routes::contacts::delete,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            ErrorDoc,
            ContactInputDoc,
            ContactDoc,
            ContactListDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "contacts")
    )
)]
pub struct ApiDoc;
