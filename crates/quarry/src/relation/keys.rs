//! Foreign-key naming.

use heck::{ToLowerCamelCase, ToSnakeCase};

/// How inferred foreign-key columns are cased.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KeyStyle {
    /// `user_id`
    #[default]
    SnakeCase,
    /// `userId`
    CamelCase,
}

impl KeyStyle {
    fn apply(self, name: &str) -> String {
        match self {
            KeyStyle::SnakeCase => name.to_snake_case(),
            KeyStyle::CamelCase => name.to_lower_camel_case(),
        }
    }
}

/// Singular form of a table name, without any schema prefix.
///
/// Only the last word is singularized: `blog_posts` becomes `blog_post`.
pub fn singular(table: &str) -> String {
    let name = table.rsplit('.').next().unwrap_or(table);
    match name.rsplit_once('_') {
        Some((head, last)) if !last.is_empty() => {
            format!("{head}_{}", pluralizer::pluralize(last, 1, false))
        }
        _ => pluralizer::pluralize(name, 1, false),
    }
}

/// Foreign-key column pointing at `table`: `users` gives `user_id`
/// (`userId` in camel case).
pub fn foreign_key(table: &str, style: KeyStyle) -> String {
    style.apply(&format!("{}_id", singular(table)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularizes_the_last_word() {
        assert_eq!(singular("users"), "user");
        assert_eq!(singular("categories"), "category");
        assert_eq!(singular("people"), "person");
        assert_eq!(singular("blog_posts"), "blog_post");
        assert_eq!(singular("public.users"), "user");
    }

    #[test]
    fn styles() {
        assert_eq!(foreign_key("users", KeyStyle::SnakeCase), "user_id");
        assert_eq!(foreign_key("users", KeyStyle::CamelCase), "userId");
        assert_eq!(foreign_key("blog_posts", KeyStyle::CamelCase), "blogPostId");
        assert_eq!(foreign_key("app.post_tags", KeyStyle::SnakeCase), "post_tag_id");
    }
}
