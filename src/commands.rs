use std::sync::Arc;

use anyhow::Context;
use clap::ArgMatches;
use log::debug;
use tweetkit::parameters::{
    BlockUserParameters, FollowUserParameters, GetRelationshipParameters, GetUserParameters,
    GetUsersParameters, ReportUserForSpamParameters, UserActionParameters,
};
use tweetkit::query::{DefaultUserQueryParameterGenerator, DefaultUserQueryValidator};
use tweetkit::{
    Config, HttpRequester, RateLimitCache, RateLimitCacheManager, RateLimitsClient,
    RateLimitsSource, UserIdentifier, UserQueryGenerator,
};

/// Run the selected subcommand and return what should be printed.
pub async fn dispatch(matches: &ArgMatches) -> anyhow::Result<String> {
    match matches.subcommand() {
        Some(("query", sub)) => Ok(run_query(sub)?),
        Some(("rate-limits", sub)) => run_rate_limits(sub).await,
        Some((other, _)) => anyhow::bail!("unknown command: {}", other),
        None => anyhow::bail!("no command given, see --help"),
    }
}

fn user_from(sub: &ArgMatches, id_arg: &str, name_arg: &str) -> UserIdentifier {
    UserIdentifier {
        id: sub.get_one::<u64>(id_arg).copied(),
        screen_name: sub.get_one::<String>(name_arg).cloned(),
    }
}

fn users_from(sub: &ArgMatches) -> Vec<UserIdentifier> {
    let ids = sub
        .get_many::<u64>("user-id")
        .into_iter()
        .flatten()
        .map(|id| UserIdentifier::from_id(*id));
    let names = sub
        .get_many::<String>("screen-name")
        .into_iter()
        .flatten()
        .map(|n| UserIdentifier::from_screen_name(n.as_str()));
    ids.chain(names).collect()
}

fn run_query(sub: &ArgMatches) -> tweetkit::Result<String> {
    let cfg = Config::from_env()?;
    let generator = UserQueryGenerator::new(
        Arc::new(DefaultUserQueryValidator),
        Arc::new(DefaultUserQueryParameterGenerator),
        cfg.endpoint(),
    );
    let flag = |name: &str| sub.get_one::<bool>(name).copied();
    let user = user_from(sub, "user-id", "screen-name");
    let operation = sub
        .get_one::<String>("operation")
        .map(String::as_str)
        .unwrap_or_default();
    debug!("building {} query", operation);

    match operation {
        "block" | "unblock" => {
            let mut p = BlockUserParameters::new(user);
            p.include_entities = flag("include-entities");
            p.skip_status = flag("skip-status");
            if operation == "block" {
                generator.get_block_user_query(&p)
            } else {
                generator.get_unblock_user_query(&p)
            }
        }
        "report-spam" => {
            let mut p = ReportUserForSpamParameters::new(user);
            p.perform_block = flag("perform-block");
            generator.get_report_user_for_spam_query(&p)
        }
        "show" => {
            let mut p = GetUserParameters::new(user);
            p.include_entities = flag("include-entities");
            generator.get_user_query(&p)
        }
        "lookup" => {
            let mut p = GetUsersParameters::new(users_from(sub));
            p.include_entities = flag("include-entities");
            generator.get_users_query(&p)
        }
        "follow" => {
            let mut p = FollowUserParameters::new(user);
            p.enable_notifications = flag("follow");
            generator.get_follow_user_query(&p)
        }
        "unfollow" => generator.get_unfollow_user_query(&UserActionParameters::new(user)),
        "mute" => generator.get_mute_user_query(&UserActionParameters::new(user)),
        "unmute" => generator.get_unmute_user_query(&UserActionParameters::new(user)),
        _ => generator.get_relationship_query(&GetRelationshipParameters::new(
            user_from(sub, "source-id", "source-screen-name"),
            user_from(sub, "target-id", "target-screen-name"),
        )),
    }
}

async fn run_rate_limits(sub: &ArgMatches) -> anyhow::Result<String> {
    let cfg = Config::from_env()?;
    let source = match sub.get_one::<String>("source") {
        Some(s) => s.parse::<RateLimitsSource>()?,
        None => cfg.rate_limits_source,
    };
    let credentials = cfg.credentials()?;
    let requester = HttpRequester::new(cfg)?;
    let manager = Arc::new(RateLimitCacheManager::new(
        Arc::new(RateLimitCache::new()),
        Arc::new(requester),
    ));
    let client = RateLimitsClient::new(credentials, manager).with_default_source(source);

    let value = match sub.get_one::<String>("endpoint") {
        Some(url) => serde_json::to_value(client.get_endpoint_rate_limit(url, None).await?)?,
        None => serde_json::to_value(client.get_rate_limits(None).await?.as_deref())?,
    };
    serde_json::to_string_pretty(&value).context("serializing rate limits")
}
