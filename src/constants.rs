pub mod accounts {

    pub const MIN_USERNAME_LEN: usize = 3;

    pub const MIN_SECRET_LEN: usize = 6;

    pub const DEFAULT_EXPIRATION_DAYS: i64 = 7;

    pub const EXPIRING_SOON_DAYS: i64 = 2;

    pub const DEFAULT_CREATED_BY: &str = "admin";

    pub const CLI_CREATED_BY: &str = "cli";
}

pub mod cookies {

    pub const SITE_COOKIE: &str = "site_auth";

    pub const ADMIN_COOKIE: &str = "admin_auth";

    /// Hard ceiling on an end-user session, independent of account expiry.
    pub const SESSION_MAX_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

    pub const ADMIN_MAX_AGE_MS: i64 = 2 * 60 * 60 * 1000;
}

pub mod routes {

    pub const LOGIN_PAGE: &str = "/login";

    pub const ADMIN_LOGIN_PAGE: &str = "/admin/login";

    pub const PUBLIC_PATHS: &[&str] = &[
        "/",
        "/health",
        "/login",
        "/favicon.ico",
        "/api/login",
        "/api/logout",
        "/admin/login",
        "/admin/logout",
    ];

    pub const PUBLIC_PREFIXES: &[&str] = &["/static/"];

    pub const ADMIN_ROOT: &str = "/admin";

    pub const API_PREFIX: &str = "/api/";

    pub const ADMIN_API_PREFIX: &str = "/admin/api/";
}
