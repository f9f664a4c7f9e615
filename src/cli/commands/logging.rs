use clap::{Arg, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

/// `FRONTDOOR_LOG_LEVEL` names and the `-v` count each one stands for.
const LEVELS: &[(&str, u8)] = &[
    ("error", 0),
    ("warn", 1),
    ("info", 2),
    ("debug", 3),
    ("trace", 4),
];

/// Parse a level name from the environment into a `-v` count.
#[must_use]
pub fn level_name() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        let wanted = level.trim().to_ascii_lowercase();
        LEVELS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, count)| *count)
            .ok_or_else(|| format!("unknown log level {level:?}, expected error|warn|info|debug|trace"))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity, repeat for more (-v warn .. -vvvv trace); default: error")
            .env("FRONTDOOR_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(level_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(level: &str) -> Result<u8, clap::Error> {
        Command::new("t")
            .arg(Arg::new("level").value_parser(level_name()))
            .try_get_matches_from(["t", level])
            .map(|m| m.get_one::<u8>("level").copied().unwrap_or_default())
    }

    #[test]
    fn level_names_map_to_counts() {
        assert_eq!(parse("error").unwrap(), 0);
        assert_eq!(parse("INFO").unwrap(), 2);
        assert_eq!(parse("debug").unwrap(), 3);
        assert_eq!(parse("trace").unwrap(), 4);
    }

    #[test]
    fn numbers_and_unknown_names_are_rejected() {
        assert!(parse("5").is_err());
        assert!(parse("2").is_err());
        assert!(parse("loud").is_err());
    }
}
