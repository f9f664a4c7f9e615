use axum::extract::RawQuery;
use axum::response::Html;

use super::flow::{ErrorReason, LOGIN_PATH};

/// Landing page with the single sign-in entry point.
pub(super) async fn home() -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in</title></head>
<body>
  <main>
    <h1>Welcome</h1>
    <p>Sign in with your organization account to continue.</p>
    <a class="button" href="{LOGIN_PATH}">Entrar com Auth0</a>
  </main>
</body>
</html>
"#
    ))
}

/// Terminal error surface. Always 200, never a redirect.
///
/// The `e` parameter only selects the message; its value is never echoed.
pub(super) async fn auth_error(RawQuery(query): RawQuery) -> Html<String> {
    let reason = query
        .as_deref()
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(k, _)| k == "e")
                .map(|(_, v)| ErrorReason::from_code(&v))
        })
        .unwrap_or(ErrorReason::Unknown);

    tracing::debug!(reason = %reason, "Rendering auth error page");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Login Failed</title></head>
<body>
  <main>
    <h1>Login Failed</h1>
    <p>{message}</p>
    <a class="button" href="{LOGIN_PATH}">Try Again</a>
    <a href="/">Go to home page</a>
  </main>
</body>
</html>
"#,
        message = reason.message()
    ))
}
