//! Server-rendered HTML. Every user-supplied string goes through [`escape`].

use std::fmt::Write as _;

use axum::{http::StatusCode, response::Html};

use blogr_types::api::PostForm;
use blogr_types::models::{Post, User};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, user: Option<&User>, error: Option<&str>, content: &str) -> Html<String> {
    let nav = match user {
        Some(user) => format!(
            "<li><span>{}</span></li><li><a href=\"/auth/logout\">Log Out</a></li>",
            escape(&user.username)
        ),
        None => "<li><a href=\"/auth/register\">Register</a></li>\
                 <li><a href=\"/auth/login\">Log In</a></li>"
            .to_string(),
    };
    let flash = error
        .map(|msg| format!("<div class=\"flash\">{}</div>", escape(msg)))
        .unwrap_or_default();

    Html(format!(
        "<!doctype html>\n\
         <html><head><meta charset=\"utf-8\"><title>{title} - Blogr</title></head>\n\
         <body><nav><h1><a href=\"/\">Blogr</a></h1><ul>{nav}</ul></nav>\n\
         <section class=\"content\"><header><h1>{title}</h1></header>\n\
         {flash}{content}</section></body></html>\n",
        title = escape(title),
    ))
}

pub fn index(user: Option<&User>, posts: &[Post]) -> Html<String> {
    let mut content = String::new();
    if user.is_some() {
        content.push_str("<a class=\"action\" href=\"/create\">New</a>");
    }

    for post in posts {
        let edit = match user {
            Some(user) if post.is_owned_by(user) => {
                format!("<a class=\"action\" href=\"/{}/update\">Edit</a>", post.id)
            }
            _ => String::new(),
        };
        let _ = write!(
            content,
            "<article class=\"post\"><header><div><h1>{}</h1>\
             <div class=\"about\">by {} on {}</div></div>{}</header>\
             <p class=\"body\">{}</p></article>",
            escape(&post.title),
            escape(&post.author_username),
            post.created.format("%Y-%m-%d"),
            edit,
            escape(&post.body),
        );
    }

    layout("Posts", user, None, &content)
}

fn credentials_form(action: &str, button: &str, username: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\
         <label for=\"username\">Username</label>\
         <input name=\"username\" id=\"username\" value=\"{}\" required>\
         <label for=\"password\">Password</label>\
         <input type=\"password\" name=\"password\" id=\"password\" required>\
         <input type=\"submit\" value=\"{button}\"></form>",
        escape(username),
    )
}

pub fn register(user: Option<&User>, error: Option<&str>, username: &str) -> Html<String> {
    layout(
        "Register",
        user,
        error,
        &credentials_form("/auth/register", "Register", username),
    )
}

pub fn login(user: Option<&User>, error: Option<&str>, username: &str) -> Html<String> {
    layout(
        "Log In",
        user,
        error,
        &credentials_form("/auth/login", "Log In", username),
    )
}

fn post_form(action: &str, form: &PostForm) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\
         <label for=\"title\">Title</label>\
         <input name=\"title\" id=\"title\" value=\"{}\" required>\
         <label for=\"body\">Body</label>\
         <textarea name=\"body\" id=\"body\">{}</textarea>\
         <input type=\"submit\" value=\"Save\"></form>",
        escape(&form.title),
        escape(&form.body),
    )
}

pub fn create(user: Option<&User>, error: Option<&str>, form: &PostForm) -> Html<String> {
    layout("New Post", user, error, &post_form("/create", form))
}

pub fn update(user: Option<&User>, post: &Post, error: Option<&str>, form: &PostForm) -> Html<String> {
    let mut content = post_form(&format!("/{}/update", post.id), form);
    let _ = write!(
        content,
        "<hr><form action=\"/{}/delete\" method=\"post\">\
         <input class=\"danger\" type=\"submit\" value=\"Delete\" \
         onclick=\"return confirm('Are you sure?');\"></form>",
        post.id
    );

    layout(&format!("Edit \"{}\"", post.title), user, error, &content)
}

pub fn error_page(status: StatusCode, message: &str) -> Html<String> {
    let title = status.canonical_reason().unwrap_or("Error");
    layout(title, None, None, &format!("<p>{}</p>", escape(message)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn layout_shows_signed_in_user() {
        let alice = User {
            id: 1,
            username: "alice".into(),
        };
        let Html(page) = index(Some(&alice), &[]);
        assert!(page.contains("alice"));
        assert!(page.contains("/auth/logout"));
        assert!(page.contains("href=\"/create\""));

        let Html(page) = index(None, &[]);
        assert!(page.contains("/auth/login"));
        assert!(!page.contains("href=\"/create\""));
    }

    #[test]
    fn form_errors_are_escaped() {
        let Html(page) = login(None, Some("<b>bad</b>"), "<eve>");
        assert!(page.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(page.contains("value=\"&lt;eve&gt;\""));
    }
}
