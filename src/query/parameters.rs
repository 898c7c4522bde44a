use crate::types::UserIdentifier;

/// Renders the parameter that identifies a user in a query string.
pub trait UserQueryParameterGenerator: Send + Sync {
    /// `id_param=<id>` when an id is present, otherwise
    /// `name_param=<screen name>`. Callers validate first; an unidentifiable
    /// user renders as an empty string.
    fn generate_id_or_screen_name_parameter(
        &self,
        user: &UserIdentifier,
        id_param: &str,
        name_param: &str,
    ) -> String;

    /// Comma separated ids under `id_param` and names under `name_param`,
    /// ids first.
    fn generate_list_of_user_identifiers_parameter(
        &self,
        users: &[UserIdentifier],
        id_param: &str,
        name_param: &str,
    ) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUserQueryParameterGenerator;

impl UserQueryParameterGenerator for DefaultUserQueryParameterGenerator {
    fn generate_id_or_screen_name_parameter(
        &self,
        user: &UserIdentifier,
        id_param: &str,
        name_param: &str,
    ) -> String {
        if let Some(id) = user.id {
            return format!("{id_param}={id}");
        }
        match user.screen_name.as_deref() {
            Some(name) if !name.trim().is_empty() => {
                format!("{name_param}={}", urlencoding::encode(name.trim()))
            }
            _ => String::new(),
        }
    }

    fn generate_list_of_user_identifiers_parameter(
        &self,
        users: &[UserIdentifier],
        id_param: &str,
        name_param: &str,
    ) -> String {
        let mut ids = Vec::new();
        let mut names = Vec::new();
        for user in users {
            if let Some(id) = user.id {
                ids.push(id.to_string());
            } else if let Some(name) = user.screen_name.as_deref() {
                names.push(urlencoding::encode(name.trim()).into_owned());
            }
        }
        let mut parts = Vec::new();
        if !ids.is_empty() {
            parts.push(format!("{id_param}={}", ids.join("%2C")));
        }
        if !names.is_empty() {
            parts.push(format!("{name_param}={}", names.join("%2C")));
        }
        parts.join("&")
    }
}
