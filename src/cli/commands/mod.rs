pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const ARG_PORT: &str = "port";
pub const ARG_SWEEP_INTERVAL: &str = "sweep-interval";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("auth-frontdoor")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .after_help(
            "Identity provider settings are read from AUTH0_DOMAIN, AUTH0_CLIENT_ID, \
             AUTH0_CLIENT_SECRET, AUTH0_SECRET and APP_BASE_URL.",
        )
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("FRONTDOOR_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SWEEP_INTERVAL)
                .long("sweep-interval")
                .help("Seconds between purges of expired sessions and login attempts")
                .default_value("60")
                .env("FRONTDOOR_SWEEP_INTERVAL")
                .value_parser(clap::value_parser!(u64).range(1..)),
        );

    logging::with_args(command)
}
