use axum::{
    body::Body,
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets"]
struct Asset;

fn serve(path: &str) -> Response {
    match Asset::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [
                    (header::CONTENT_TYPE, mime.as_ref()),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                Body::from(content.data),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// GET /
pub async fn landing() -> Response {
    serve("index.html")
}

/// GET /login
pub async fn login_page() -> Response {
    serve("login.html")
}

/// GET /admin/login
pub async fn admin_login_page() -> Response {
    serve("admin-login.html")
}

/// GET /admin
pub async fn admin_page() -> Response {
    serve("admin.html")
}

/// GET /static/{*path}
pub async fn static_asset(Path(path): Path<String>) -> Response {
    if path.split('/').any(|segment| segment == "..") {
        return (StatusCode::NOT_FOUND, "404 Not Found").into_response();
    }
    serve(&format!("static/{path}"))
}
