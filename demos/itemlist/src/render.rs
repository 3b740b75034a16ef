//! HTML pages.

use axum::http::StatusCode;

use docforms_core::utils::text::escape;
use docforms_document::{Document, Value};

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body>
<nav><a href="/item/">Items</a> | <a href="/item/add/">Add</a> | <a href="/auth/logout/">Log out</a></nav>
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = escape(title)
    )
}

fn error_line(error: Option<&str>) -> String {
    error.map_or_else(String::new, |e| {
        format!(r#"<p class="error">{}</p>"#, escape(e))
    })
}

fn item_id(item: &Document) -> String {
    item.id().map(|id| id.to_string()).unwrap_or_default()
}

fn picture_tag(item: &Document) -> String {
    match item.get("picture") {
        Value::File(handle) => format!(
            r#"<img src="/item/{}/picture/" alt="{}" />"#,
            item_id(item),
            escape(&handle.name)
        ),
        _ => String::new(),
    }
}

/// The current user's items.
pub fn item_list(username: &str, items: &[Document]) -> String {
    let mut body = format!("<p>Logged in as {}</p>\n<ul>\n", escape(username));
    for item in items {
        let id = item_id(item);
        body.push_str(&format!(
            r#"<li><a href="/item/{id}/">{}</a> <a href="/item/edit/{id}/">edit</a> <a href="/item/delete/{id}/">delete</a></li>"#,
            escape(&item.get("text").to_string())
        ));
        body.push('\n');
    }
    body.push_str("</ul>");
    page("Items", &body)
}

/// One item.
pub fn item_detail(item: &Document) -> String {
    let body = format!(
        "<p>{}</p>\n{}\n<p>Created {}</p>",
        escape(&item.get("text").to_string()),
        picture_tag(item),
        escape(&item.get("created").to_form_string())
    );
    page("Item", &body)
}

/// The add or edit page around a rendered item form.
pub fn item_form(title: &str, action: &str, form_html: &str, item: Option<&Document>) -> String {
    let current = item.map(picture_tag).unwrap_or_default();
    let body = format!(
        r#"{current}
<form method="post" action="{action}" enctype="multipart/form-data">
{form_html}
<input type="submit" value="Save" />
</form>"#
    );
    page(title, &body)
}

/// The login page.
pub fn login(form_html: &str, error: Option<&str>) -> String {
    let body = format!(
        r#"{}<form method="post" action="/auth/login/">
{form_html}
<input type="submit" value="Log in" />
</form>
<p><a href="/auth/create/">Create an account</a></p>"#,
        error_line(error)
    );
    page("Log in", &body)
}

/// The sign-up page.
pub fn create_user(form_html: &str, error: Option<&str>) -> String {
    let body = format!(
        r#"{}<form method="post" action="/auth/create/">
{form_html}
<input type="submit" value="Create" />
</form>"#,
        error_line(error)
    );
    page("Create an account", &body)
}

/// A page for a failed request.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    page(title, &format!("<p>{}</p>", escape(message)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item_schema;

    #[test]
    fn test_item_list_escapes_text() {
        let mut item = Document::new(item_schema());
        item.set("text", "<b>milk</b>");
        let html = item_list("ann", &[item]);
        assert!(html.contains("&lt;b&gt;milk&lt;/b&gt;"));
        assert!(!html.contains("<b>milk"));
    }

    #[test]
    fn test_login_error_line() {
        let html = login("", Some("Invalid username or password"));
        assert!(html.contains(r#"<p class="error">Invalid username or password</p>"#));
        assert!(!login("", None).contains("class=\"error\""));
    }

    #[test]
    fn test_error_page_title() {
        let html = error_page(StatusCode::NOT_FOUND, "gone");
        assert!(html.contains("<h1>Not Found</h1>"));
    }
}
