use std::time::Duration;

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, ARG_SWEEP_INTERVAL};
use anyhow::Result;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let sweep_interval = matches
        .get_one::<u64>(ARG_SWEEP_INTERVAL)
        .copied()
        .unwrap_or(60);

    Ok(Action::Server(Args {
        port,
        sweep_interval: Duration::from_secs(sweep_interval),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn builds_server_action() {
        temp_env::with_vars(
            [
                ("FRONTDOOR_PORT", None::<&str>),
                ("FRONTDOOR_SWEEP_INTERVAL", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec![
                    "auth-frontdoor",
                    "--port",
                    "9000",
                    "--sweep-interval",
                    "30",
                ]);
                let Action::Server(args) = handler(&matches).unwrap();
                assert_eq!(args.port, 9000);
                assert_eq!(args.sweep_interval, Duration::from_secs(30));
            },
        );
    }
}
