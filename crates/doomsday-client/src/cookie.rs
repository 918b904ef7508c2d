//! Session cookie access.
//!
//! The jar is a primitive get/set capability over the raw `document.cookie`
//! string; lookup is a small character-driven state machine.

use std::fmt;
use std::rc::Rc;

/// Cookie holding the session token issued by the backend.
pub const SESSION_COOKIE_NAME: &str = "doomsday-token";

/// Raw cookie storage, e.g. `document.cookie` in a browser.
pub trait CookieJar {
    /// Returns the full `name=value; name2=value2` cookie string.
    fn cookie_string(&self) -> String;
    /// Writes one `Set-Cookie`-style assignment.
    fn write_cookie(&self, assignment: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Key,
    Value,
    SkipWhitespace,
}

/// Looks up `name` in a `document.cookie`-style string.
///
/// A bare token without `=` is a value with an empty name, so it is only
/// found by looking up `""`. Whitespace after a `;` separator is skipped;
/// whitespace inside keys and values is kept.
pub fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    let mut state = ParseState::Key;
    let mut key = String::new();
    let mut value = String::new();

    for c in cookies.chars() {
        match (state, c) {
            (ParseState::Key, '=') => state = ParseState::Value,
            (ParseState::Key | ParseState::Value, ';') => {
                if let Some(found) = finish_pair(state, &mut key, &mut value, name) {
                    return Some(found);
                }
                state = ParseState::SkipWhitespace;
            }
            (ParseState::Key, _) => key.push(c),
            (ParseState::Value, _) => value.push(c),
            (ParseState::SkipWhitespace, ' ' | '\t' | ';') => {}
            (ParseState::SkipWhitespace, '=') => state = ParseState::Value,
            (ParseState::SkipWhitespace, _) => {
                key.push(c);
                state = ParseState::Key;
            }
        }
    }

    match state {
        ParseState::SkipWhitespace => None,
        _ => finish_pair(state, &mut key, &mut value, name),
    }
}

/// Closes the pair parsed so far and returns its value if it is `name`.
fn finish_pair(
    state: ParseState,
    key: &mut String,
    value: &mut String,
    name: &str,
) -> Option<String> {
    let (key, value) = (std::mem::take(key), std::mem::take(value));
    let (key, value) = match state {
        // Empty segment, e.g. a leading `;` or an empty string.
        ParseState::Key if key.is_empty() => return None,
        ParseState::Key => (String::new(), key),
        _ => (key, value),
    };
    (key == name).then_some(value)
}

/// Assignment that makes the browser drop cookie `name`.
pub fn expired_cookie_assignment(name: &str) -> String {
    format!("{name}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT;")
}

/// Handle to the session token cookie.
#[derive(Clone)]
pub struct SessionCookie {
    jar: Rc<dyn CookieJar>,
    name: String,
}

impl SessionCookie {
    /// Wraps `jar`, reading the cookie called `name`.
    pub fn new(jar: Rc<dyn CookieJar>, name: impl Into<String>) -> Self {
        Self {
            jar,
            name: name.into(),
        }
    }

    /// Cookie name this handle reads.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the session token, treating an empty value as absent.
    pub fn token(&self) -> Option<String> {
        cookie_value(&self.jar.cookie_string(), &self.name).filter(|token| !token.is_empty())
    }

    /// Returns `true` when a non-empty session token is present.
    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Expires the session cookie.
    pub fn clear(&self) {
        tracing::info!(stage = "session", action = "clear_token", cookie = %self.name);
        self.jar.write_cookie(&expired_cookie_assignment(&self.name));
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_values_anywhere_in_the_string() {
        let cookies = "theme=dark; doomsday-token=abc123;\tlang=en";
        assert_eq!(cookie_value(cookies, "theme").as_deref(), Some("dark"));
        assert_eq!(
            cookie_value(cookies, SESSION_COOKIE_NAME).as_deref(),
            Some("abc123")
        );
        assert_eq!(cookie_value(cookies, "lang").as_deref(), Some("en"));
        assert_eq!(cookie_value(cookies, "missing"), None);
    }

    #[test]
    fn keeps_equals_signs_inside_values() {
        assert_eq!(
            cookie_value("doomsday-token=a=b==", SESSION_COOKIE_NAME).as_deref(),
            Some("a=b==")
        );
    }

    #[test]
    fn bare_tokens_are_values_with_an_empty_name() {
        assert_eq!(cookie_value("tok; a=1", "").as_deref(), Some("tok"));
        assert_eq!(cookie_value("tok; a=1", "tok"), None);
        assert_eq!(cookie_value("a=1; tok", "").as_deref(), Some("tok"));
        assert_eq!(cookie_value("a=1; tok", "a").as_deref(), Some("1"));
    }

    #[test]
    fn handles_empty_values_and_strings() {
        assert_eq!(cookie_value("doomsday-token=", SESSION_COOKIE_NAME).as_deref(), Some(""));
        assert_eq!(cookie_value("", SESSION_COOKIE_NAME), None);
        assert_eq!(cookie_value("a=1; ", ""), None);
    }

    #[test]
    fn does_not_match_key_prefixes() {
        assert_eq!(cookie_value("doomsday-token-old=x", SESSION_COOKIE_NAME), None);
        assert_eq!(cookie_value("xdoomsday-token=x", SESSION_COOKIE_NAME), None);
    }

    #[test]
    fn expired_assignment_targets_root_path() {
        assert_eq!(
            expired_cookie_assignment(SESSION_COOKIE_NAME),
            "doomsday-token=; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT;"
        );
    }
}
