use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConsentListQuery {
    pub user_id: Option<String>,
    pub application_id: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConsentCreateRequest {
    pub user_id: String,
    pub application_id: String,
    pub scope: String,
}
