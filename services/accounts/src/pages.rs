//! HTML pages served by the accounts service

use crate::models::User;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Accounts</title></head>
<body>
<h1>Login</h1>
<form method="post" action="/login">
    <label for="login-username">Username</label>
    <input type="text" id="login-username" name="username"><br>
    <label for="login-password">Password</label>
    <input type="password" id="login-password" name="password"><br>
    <button type="submit">Login</button>
</form>
<br><h1>Create Account</h1>
<form method="post" action="/signup">
    <label for="signup-username">Username</label>
    <input type="text" id="signup-username" name="username"><br>
    <label for="signup-email">Email Address</label>
    <input type="text" id="signup-email" name="email"><br>
    <label for="signup-password">Password</label>
    <input type="password" id="signup-password" name="password"><br>
    <button type="submit">Create Account</button>
</form>
</body>
</html>
"#;

/// Login and signup forms
pub fn index() -> &'static str {
    INDEX_PAGE
}

/// Profile page for a logged-in user
pub fn profile(user: &User) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Accounts</title></head>
<body>
<h1>Internal</h1>
User: {username}
<form method="post" action="/logout">
    <button type="submit">Logout</button>
</form>
<br><h1>Update Information</h1>
<form method="post" action="/update">
    <label for="email">Email Address</label>
    <input type="text" id="email" name="email" value="{email}"><br>
    <label for="password">Password</label>
    <input type="password" id="password" name="password"><br>
    <button type="submit">Update</button>
</form>
</body>
</html>
"#,
        username = escape(&user.username),
        email = escape(&user.email),
    )
}

fn escape(raw: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(email: &str) -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_index_has_both_forms() {
        assert!(index().contains(r#"action="/login""#));
        assert!(index().contains(r#"action="/signup""#));
    }

    #[test]
    fn test_profile_shows_username_and_email() {
        let page = profile(&user("alice@example.com"));
        assert!(page.contains("User: alice"));
        assert!(page.contains(r#"value="alice@example.com""#));
        assert!(!page.contains("argon2id"));
    }

    #[test]
    fn test_profile_escapes_user_data() {
        let page = profile(&user("\"><script>alert(1)</script>\"@example.com"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("&quot;&gt;&lt;script&gt;"));
    }
}
