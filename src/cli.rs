use clap::{value_parser, Arg, ArgAction, Command};

pub const QUERY_OPERATIONS: &[&str] = &[
    "block",
    "unblock",
    "report-spam",
    "show",
    "lookup",
    "follow",
    "unfollow",
    "mute",
    "unmute",
    "relationship",
];

fn bool_flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .num_args(1)
        .value_name("BOOL")
        .value_parser(value_parser!(bool))
        .help(help)
}

pub fn build_cli() -> Command {
    Command::new("tweetkit")
        .about("Twitter REST client: build user queries and inspect rate limits")
        .disable_version_flag(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("query")
                .about("Print the URL of a user endpoint query (no network)")
                .arg(
                    Arg::new("operation")
                        .required(true)
                        .value_parser(QUERY_OPERATIONS.to_vec()),
                )
                .arg(
                    Arg::new("user-id")
                        .long("user-id")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("screen-name")
                        .long("screen-name")
                        .action(ArgAction::Append),
                )
                .arg(Arg::new("source-id").long("source-id").value_parser(value_parser!(u64)))
                .arg(Arg::new("source-screen-name").long("source-screen-name"))
                .arg(Arg::new("target-id").long("target-id").value_parser(value_parser!(u64)))
                .arg(Arg::new("target-screen-name").long("target-screen-name"))
                .arg(bool_flag("include-entities", "Set include_entities"))
                .arg(bool_flag("skip-status", "Set skip_status"))
                .arg(bool_flag("perform-block", "Also block when reporting spam"))
                .arg(bool_flag("follow", "Enable notifications when following")),
        )
        .subcommand(
            Command::new("rate-limits")
                .about("Show rate limits of the configured credentials")
                .arg(
                    Arg::new("source")
                        .long("source")
                        .num_args(1)
                        .help("cache-only | twitter-api-only | cache-or-twitter-api"),
                )
                .arg(
                    Arg::new("endpoint")
                        .long("endpoint")
                        .num_args(1)
                        .help("Only show the limit of this endpoint URL"),
                ),
        )
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    if let Some(lvl) = level {
        std::env::set_var("RUST_LOG", lvl);
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    #[test]
    fn query_collects_repeated_ids() {
        let m = build_cli()
            .try_get_matches_from(["tweetkit", "query", "lookup", "--user-id", "1", "--user-id", "2"])
            .unwrap();
        let (_, sub) = m.subcommand().unwrap();
        let ids: Vec<u64> = sub.get_many::<u64>("user-id").unwrap().copied().collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
