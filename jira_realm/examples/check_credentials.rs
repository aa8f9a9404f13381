use std::time::Duration;

use clap::Parser;
use jira_realm::{
    JiraAuthenticationService, Password, ServiceConfig, TrustPolicy, Username,
};

#[derive(Debug, Parser)]
struct Opts {
    /// The base URL of the Jira instance
    #[clap(short = 'u', long, env = "JIRA_URL")]
    jira_url: String,

    /// The technical account used to look up group memberships
    #[clap(short, long, env = "JIRA_TECHNICAL_USER")]
    technical_user: Username,

    /// The technical account's password
    #[clap(short = 'p', long, env = "JIRA_TECHNICAL_PASSWORD", hide_env_values = true)]
    technical_password: Password,

    /// Timeout for each call to Jira, in milliseconds
    #[clap(long, env = "JIRA_TIMEOUT_MS", default_value_t = jira_realm::config::DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Accept any TLS certificate presented by Jira
    #[clap(long, env = "JIRA_INSECURE_TLS")]
    insecure_tls: bool,

    /// The user to authenticate
    #[clap(long, env = "JIRA_CHECK_USER")]
    user: String,

    /// The password of the user to authenticate
    #[clap(long, env = "JIRA_CHECK_PASSWORD", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();

    let config = ServiceConfig::new(
        &opts.jira_url,
        opts.technical_user,
        opts.technical_password,
        Duration::from_millis(opts.timeout_ms),
        TrustPolicy::from_insecure_flag(opts.insecure_tls),
    )?;

    let service = JiraAuthenticationService::new(config)?;

    if let Err(error) = service.authenticate(&opts.user, &opts.password).await {
        tracing::error!(
            kind = ?error.kind(),
            error = (&error as &dyn std::error::Error),
            "authentication failed"
        );
        println!("{}", error.user_message());
        return Ok(());
    }

    match service.load_groups_for_user(&opts.user).await {
        Ok(user) => {
            tracing::info!(
                user = %user.username(),
                display_name = user.display_name().unwrap_or_default(),
                groups = ?user.groups(),
                "authenticated"
            );
            println!("{} is a member of:", user.username());
            for group in user.groups() {
                println!("  {}", group);
            }
        }
        Err(error) => {
            tracing::error!(
                kind = ?error.kind(),
                error = (&error as &dyn std::error::Error),
                "unable to load group memberships"
            );
            println!("{}", error.user_message());
        }
    }

    Ok(())
}
