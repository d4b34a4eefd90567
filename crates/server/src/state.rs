use service::contacts::ContactService;

/// Shared handler state; cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub contacts: ContactService,
}

impl AppState {
    pub fn new(contacts: ContactService) -> Self { Self { contacts } }
}
