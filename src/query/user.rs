use std::sync::Arc;

use super::{
    ApiEndpoint, DefaultUserQueryParameterGenerator, DefaultUserQueryValidator, QueryString,
    UserQueryParameterGenerator, UserQueryValidator,
};
use crate::error::Result;
use crate::parameters::{
    BlockUserParameters, FollowUserParameters, GetRelationshipParameters, GetUserParameters,
    GetUsersParameters, ReportUserForSpamParameters, UnblockUserParameters, UserActionParameters,
};
use crate::types::UserIdentifier;

const USER_ID: &str = "user_id";
const SCREEN_NAME: &str = "screen_name";

/// Builds URLs for user endpoints.
///
/// The validator always runs before the parameter generator; an
/// unidentifiable user fails with `InvalidIdentifier` and nothing is built.
#[derive(Clone)]
pub struct UserQueryGenerator {
    validator: Arc<dyn UserQueryValidator>,
    parameter_generator: Arc<dyn UserQueryParameterGenerator>,
    endpoint: ApiEndpoint,
}

impl UserQueryGenerator {
    pub fn new(
        validator: Arc<dyn UserQueryValidator>,
        parameter_generator: Arc<dyn UserQueryParameterGenerator>,
        endpoint: ApiEndpoint,
    ) -> Self {
        Self {
            validator,
            parameter_generator,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &ApiEndpoint {
        &self.endpoint
    }

    fn identify(&self, user: &UserIdentifier, label: Option<&str>) -> Result<QueryString> {
        self.validator.throw_if_user_cannot_be_identified(user, label)?;
        let mut query = QueryString::default();
        query.push_raw(self.parameter_generator.generate_id_or_screen_name_parameter(
            user,
            USER_ID,
            SCREEN_NAME,
        ));
        Ok(query)
    }

    pub fn get_block_user_query(&self, parameters: &BlockUserParameters) -> Result<String> {
        self.block_like("blocks/create", parameters)
    }

    pub fn get_unblock_user_query(&self, parameters: &UnblockUserParameters) -> Result<String> {
        self.block_like("blocks/destroy", parameters)
    }

    fn block_like(&self, resource: &str, parameters: &BlockUserParameters) -> Result<String> {
        let mut query = self.identify(&parameters.user, None)?;
        query.push_bool("include_entities", parameters.include_entities);
        query.push_bool("skip_status", parameters.skip_status);
        query.push_custom(&parameters.custom_query_parameters);
        Ok(query.into_url(self.endpoint.resource_url(resource)))
    }

    pub fn get_report_user_for_spam_query(
        &self,
        parameters: &ReportUserForSpamParameters,
    ) -> Result<String> {
        let mut query = self.identify(&parameters.user, None)?;
        query.push_bool("perform_block", parameters.perform_block);
        query.push_custom(&parameters.custom_query_parameters);
        Ok(query.into_url(self.endpoint.resource_url("users/report_spam")))
    }

    pub fn get_user_query(&self, parameters: &GetUserParameters) -> Result<String> {
        let mut query = self.identify(&parameters.user, None)?;
        query.push_bool("include_entities", parameters.include_entities);
        query.push_custom(&parameters.custom_query_parameters);
        Ok(query.into_url(self.endpoint.resource_url("users/show")))
    }

    pub fn get_users_query(&self, parameters: &GetUsersParameters) -> Result<String> {
        self.validator
            .throw_if_users_cannot_be_identified(&parameters.users)?;
        let mut query = QueryString::default();
        query.push_raw(
            self.parameter_generator
                .generate_list_of_user_identifiers_parameter(
                    &parameters.users,
                    USER_ID,
                    SCREEN_NAME,
                ),
        );
        query.push_bool("include_entities", parameters.include_entities);
        query.push_custom(&parameters.custom_query_parameters);
        Ok(query.into_url(self.endpoint.resource_url("users/lookup")))
    }

    pub fn get_follow_user_query(&self, parameters: &FollowUserParameters) -> Result<String> {
        let mut query = self.identify(&parameters.user, None)?;
        query.push_bool("follow", parameters.enable_notifications);
        query.push_custom(&parameters.custom_query_parameters);
        Ok(query.into_url(self.endpoint.resource_url("friendships/create")))
    }

    pub fn get_unfollow_user_query(&self, parameters: &UserActionParameters) -> Result<String> {
        self.plain_action("friendships/destroy", parameters)
    }

    pub fn get_mute_user_query(&self, parameters: &UserActionParameters) -> Result<String> {
        self.plain_action("mutes/users/create", parameters)
    }

    pub fn get_unmute_user_query(&self, parameters: &UserActionParameters) -> Result<String> {
        self.plain_action("mutes/users/destroy", parameters)
    }

    fn plain_action(&self, resource: &str, parameters: &UserActionParameters) -> Result<String> {
        let mut query = self.identify(&parameters.user, None)?;
        query.push_custom(&parameters.custom_query_parameters);
        Ok(query.into_url(self.endpoint.resource_url(resource)))
    }

    pub fn get_relationship_query(&self, parameters: &GetRelationshipParameters) -> Result<String> {
        // Both users are validated before either parameter is rendered.
        self.validator
            .throw_if_user_cannot_be_identified(&parameters.source, Some("source"))?;
        self.validator
            .throw_if_user_cannot_be_identified(&parameters.target, Some("target"))?;
        let mut query = QueryString::default();
        query.push_raw(self.parameter_generator.generate_id_or_screen_name_parameter(
            &parameters.source,
            "source_id",
            "source_screen_name",
        ));
        query.push_raw(self.parameter_generator.generate_id_or_screen_name_parameter(
            &parameters.target,
            "target_id",
            "target_screen_name",
        ));
        query.push_custom(&parameters.custom_query_parameters);
        Ok(query.into_url(self.endpoint.resource_url("friendships/show")))
    }
}

impl Default for UserQueryGenerator {
    fn default() -> Self {
        Self::new(
            Arc::new(DefaultUserQueryValidator),
            Arc::new(DefaultUserQueryParameterGenerator),
            ApiEndpoint::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Parameter generator double that records how often it was asked.
    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    impl UserQueryParameterGenerator for CountingGenerator {
        fn generate_id_or_screen_name_parameter(
            &self,
            user: &UserIdentifier,
            id_param: &str,
            name_param: &str,
        ) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DefaultUserQueryParameterGenerator.generate_id_or_screen_name_parameter(
                user, id_param, name_param,
            )
        }

        fn generate_list_of_user_identifiers_parameter(
            &self,
            users: &[UserIdentifier],
            id_param: &str,
            name_param: &str,
        ) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            DefaultUserQueryParameterGenerator
                .generate_list_of_user_identifiers_parameter(users, id_param, name_param)
        }
    }

    /// Validator double that records every user it was asked about.
    #[derive(Default)]
    struct RecordingValidator {
        seen: std::sync::Mutex<Vec<(UserIdentifier, Option<String>)>>,
    }

    impl UserQueryValidator for RecordingValidator {
        fn can_user_be_identified(&self, user: &UserIdentifier) -> bool {
            DefaultUserQueryValidator.can_user_be_identified(user)
        }

        fn throw_if_user_cannot_be_identified(
            &self,
            user: &UserIdentifier,
            label: Option<&str>,
        ) -> Result<()> {
            self.seen
                .lock()
                .unwrap()
                .push((user.clone(), label.map(str::to_string)));
            DefaultUserQueryValidator.throw_if_user_cannot_be_identified(user, label)
        }
    }

    fn generator_with(
        validator: Arc<RecordingValidator>,
        params: Arc<CountingGenerator>,
    ) -> UserQueryGenerator {
        UserQueryGenerator::new(validator, params, ApiEndpoint::default())
    }

    #[test]
    fn block_query_with_id_and_flags() {
        let validator = Arc::new(RecordingValidator::default());
        let params = Arc::new(CountingGenerator::default());
        let g = generator_with(validator.clone(), params.clone());
        let mut p = BlockUserParameters::new(42u64);
        p.skip_status = Some(true);
        p.include_entities = Some(true);

        let url = g.get_block_user_query(&p).unwrap();

        assert_eq!(
            url,
            "https://api.twitter.com/1.1/blocks/create.json?user_id=42&include_entities=true&skip_status=true"
        );
        let seen = validator.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(UserIdentifier::from_id(42), None)]);
        assert_eq!(params.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn block_query_fails_before_parameter_generation() {
        let validator = Arc::new(RecordingValidator::default());
        let params = Arc::new(CountingGenerator::default());
        let g = generator_with(validator, params.clone());
        let mut p = BlockUserParameters::new(UserIdentifier::default());
        p.include_entities = Some(true);

        let err = g.get_block_user_query(&p).unwrap_err();

        assert_eq!(err, Error::InvalidIdentifier { label: None });
        assert_eq!(params.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unset_flags_are_not_emitted() {
        let g = UserQueryGenerator::default();
        let url = g
            .get_unblock_user_query(&BlockUserParameters::new("jack"))
            .unwrap();
        assert_eq!(url, "https://api.twitter.com/1.1/blocks/destroy.json?screen_name=jack");
    }

    #[test]
    fn false_flags_are_lowercase() {
        let g = UserQueryGenerator::default();
        let mut p = BlockUserParameters::new(7u64);
        p.include_entities = Some(false);
        assert_eq!(
            g.get_block_user_query(&p).unwrap(),
            "https://api.twitter.com/1.1/blocks/create.json?user_id=7&include_entities=false"
        );
    }

    #[test]
    fn custom_parameters_come_last() {
        let g = UserQueryGenerator::default();
        let mut p = ReportUserForSpamParameters::new(9u64);
        p.perform_block = Some(true);
        p.custom_query_parameters = vec![("reason".into(), "spam bot".into())];
        assert_eq!(
            g.get_report_user_for_spam_query(&p).unwrap(),
            "https://api.twitter.com/1.1/users/report_spam.json?user_id=9&perform_block=true&reason=spam%20bot"
        );
    }

    #[test]
    fn lookup_and_show() {
        let g = UserQueryGenerator::default();
        let mut lookup = GetUsersParameters::new([1u64, 2u64]);
        lookup.include_entities = Some(true);
        assert_eq!(
            g.get_users_query(&lookup).unwrap(),
            "https://api.twitter.com/1.1/users/lookup.json?user_id=1%2C2&include_entities=true"
        );
        assert_eq!(
            g.get_user_query(&GetUserParameters::new("jack")).unwrap(),
            "https://api.twitter.com/1.1/users/show.json?screen_name=jack"
        );
        assert!(g.get_users_query(&GetUsersParameters::new(Vec::<u64>::new())).is_err());
    }

    #[test]
    fn follow_mute_and_unfollow() {
        let g = UserQueryGenerator::default();
        let mut follow = FollowUserParameters::new(5u64);
        follow.enable_notifications = Some(true);
        assert_eq!(
            g.get_follow_user_query(&follow).unwrap(),
            "https://api.twitter.com/1.1/friendships/create.json?user_id=5&follow=true"
        );
        assert_eq!(
            g.get_unfollow_user_query(&UserActionParameters::new(5u64)).unwrap(),
            "https://api.twitter.com/1.1/friendships/destroy.json?user_id=5"
        );
        assert_eq!(
            g.get_mute_user_query(&UserActionParameters::new("jack")).unwrap(),
            "https://api.twitter.com/1.1/mutes/users/create.json?screen_name=jack"
        );
        assert_eq!(
            g.get_unmute_user_query(&UserActionParameters::new("jack")).unwrap(),
            "https://api.twitter.com/1.1/mutes/users/destroy.json?screen_name=jack"
        );
    }

    #[test]
    fn relationship_labels_the_failing_side() {
        let validator = Arc::new(RecordingValidator::default());
        let params = Arc::new(CountingGenerator::default());
        let g = generator_with(validator, params.clone());

        let ok = g
            .get_relationship_query(&GetRelationshipParameters::new(1u64, "jack"))
            .unwrap();
        assert_eq!(
            ok,
            "https://api.twitter.com/1.1/friendships/show.json?source_id=1&target_screen_name=jack"
        );

        let calls_before = params.calls.load(Ordering::SeqCst);
        let err = g
            .get_relationship_query(&GetRelationshipParameters::new(
                1u64,
                UserIdentifier::default(),
            ))
            .unwrap_err();
        assert_eq!(err, Error::InvalidIdentifier { label: Some("target".into()) });
        assert_eq!(params.calls.load(Ordering::SeqCst), calls_before);
    }

    #[test]
    fn custom_endpoint_base() {
        let g = UserQueryGenerator::new(
            Arc::new(DefaultUserQueryValidator),
            Arc::new(DefaultUserQueryParameterGenerator),
            ApiEndpoint::new("http://localhost:8080/", "2"),
        );
        assert_eq!(
            g.get_mute_user_query(&UserActionParameters::new(3u64)).unwrap(),
            "http://localhost:8080/2/mutes/users/create.json?user_id=3"
        );
    }
}
