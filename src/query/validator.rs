use crate::error::{Error, Result};
use crate::types::UserIdentifier;

/// Checks that user references can be resolved before a query is built.
pub trait UserQueryValidator: Send + Sync {
    fn can_user_be_identified(&self, user: &UserIdentifier) -> bool;

    /// Fails with [`Error::InvalidIdentifier`]. `label` names the user in
    /// operations targeting more than one (e.g. `"source"`, `"target"`).
    fn throw_if_user_cannot_be_identified(
        &self,
        user: &UserIdentifier,
        label: Option<&str>,
    ) -> Result<()> {
        if self.can_user_be_identified(user) {
            Ok(())
        } else {
            Err(Error::invalid_identifier(label))
        }
    }

    fn throw_if_users_cannot_be_identified(&self, users: &[UserIdentifier]) -> Result<()> {
        if users.is_empty() {
            return Err(Error::invalid_identifier(Some("users")));
        }
        for (i, user) in users.iter().enumerate() {
            if !self.can_user_be_identified(user) {
                return Err(Error::invalid_identifier(Some(&format!("users[{i}]"))));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUserQueryValidator;

impl UserQueryValidator for DefaultUserQueryValidator {
    fn can_user_be_identified(&self, user: &UserIdentifier) -> bool {
        user.id.is_some()
            || user
                .screen_name
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identified_by_id_or_name() {
        let v = DefaultUserQueryValidator;
        assert!(v.can_user_be_identified(&UserIdentifier::from_id(1)));
        assert!(v.can_user_be_identified(&UserIdentifier::from_screen_name("jack")));
        assert!(!v.can_user_be_identified(&UserIdentifier::default()));
        assert!(!v.can_user_be_identified(&UserIdentifier::from_screen_name("  ")));
    }

    #[test]
    fn throw_carries_label() {
        let v = DefaultUserQueryValidator;
        let err = v
            .throw_if_user_cannot_be_identified(&UserIdentifier::default(), Some("target"))
            .unwrap_err();
        assert_eq!(err, Error::InvalidIdentifier { label: Some("target".into()) });
        assert!(v
            .throw_if_user_cannot_be_identified(&UserIdentifier::from_id(3), None)
            .is_ok());
    }

    #[test]
    fn user_lists_are_checked_entry_by_entry() {
        let v = DefaultUserQueryValidator;
        assert!(v.throw_if_users_cannot_be_identified(&[]).is_err());
        let err = v
            .throw_if_users_cannot_be_identified(&[
                UserIdentifier::from_id(1),
                UserIdentifier::default(),
            ])
            .unwrap_err();
        assert_eq!(err, Error::InvalidIdentifier { label: Some("users[1]".into()) });
    }
}
