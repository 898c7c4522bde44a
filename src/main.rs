mod cli;
mod commands;

#[tokio::main(flavor = "current_thread")] // one command per process
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("tweetkit {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let output = commands::dispatch(&matches).await?;
    println!("{}", output);
    Ok(())
}
