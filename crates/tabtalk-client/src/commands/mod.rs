//! Commands a presentation layer invokes on a [`ChatInstance`].
//!
//! Each sub-module groups related commands by domain. Commands are free
//! async functions taking the instance; every command that changes what the
//! user sees finishes by refreshing the instance's view.
//!
//! [`ChatInstance`]: crate::instance::ChatInstance

pub mod conversations;
pub mod identity;
pub mod messaging;

/// Placeholder avatar generated from a display name.
pub(crate) fn avatar_url(name: &str, background: &str) -> String {
    let encoded: String = name
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("+");
    format!("https://ui-avatars.com/api/?name={encoded}&background={background}&color=fff")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_url_keeps_url_safe_name() {
        assert_eq!(
            avatar_url("Tech  Team!", "random"),
            "https://ui-avatars.com/api/?name=Tech+Team&background=random&color=fff"
        );
    }
}
