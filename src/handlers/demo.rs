//! Plain-text pages served behind the access log.

/// `GET /`
pub async fn home_handler() -> &'static str {
    "home"
}

/// `GET /people`
pub async fn people_handler() -> &'static str {
    "people"
}

/// `GET /services`
pub async fn services_handler() -> &'static str {
    "services"
}
