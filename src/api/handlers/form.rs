use axum::response::Html;

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Upload profile photos</title>
</head>
<body>
  <h1>Upload profile photos</h1>
  <form action="/api/upload" method="post" enctype="multipart/form-data">
    <p><label>Name <input type="text" name="name" required></label></p>
    <p><label>Email <input type="email" name="email" required></label></p>
    <p><label>Password <input type="password" name="password" required></label></p>
    <p><label>Photos <input type="file" name="profilePhotos" accept="image/*" multiple required></label></p>
    <p><button type="submit">Upload</button></p>
  </form>
</body>
</html>
"#;

#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "HTML upload form", body = String, content_type = "text/html")
    ),
    tag = "images"
)]
pub async fn upload_form() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}
