use std::env;
use std::path::PathBuf;

use structopt::StructOpt;

pub const DEFAULT_PORT: u16 = 8901;

#[derive(StructOpt, Debug)]
#[structopt(about)]
pub struct Options {
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        global = true,
        help = "Logging verbosity (-v info, -vv debug, -vvv trace)"
    )]
    pub verbose: u8,

    #[structopt(
        short = "p",
        long = "port",
        help = "Port to listen on (--help for more)",
        long_help = r"Port to listen on:
    - overrides the PORT environment variable
    - defaults to 8901 when neither the flag nor PORT is set"
    )]
    pub port: Option<u16>,

    #[structopt(
        short = "r",
        long = "rules",
        default_value = "./rules",
        parse(from_os_str),
        help = "Path to the rules file (--help for more)",
        long_help = r#"Path to the rules file:
    - one rule per line, "<path>" => "<target>"
    - an example file is written there if none exists
Example:
    "/ping" => "https://github.com/goldlink/goldlink""#
    )]
    pub rules: PathBuf,
}

impl Options {
    /// Flag beats the PORT environment variable beats the built-in default.
    /// An unparsable or zero PORT value is ignored rather than fatal.
    pub fn resolve_port(&self) -> u16 {
        self.port.or_else(port_from_env).unwrap_or(DEFAULT_PORT)
    }
}

fn port_from_env() -> Option<u16> {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .filter(|&port| port != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(args: &[&str]) -> Options {
        Options::from_iter(std::iter::once("goldlink").chain(args.iter().copied()))
    }

    #[test]
    fn rules_path_defaults_to_dot_slash_rules() {
        assert_eq!(options(&[]).rules, PathBuf::from("./rules"));
        assert_eq!(options(&["-r", "/etc/rules"]).rules, PathBuf::from("/etc/rules"));
    }

    // All PORT cases live in one test: the environment is process-global and
    // tests run in parallel.
    #[test]
    fn port_precedence_is_flag_env_default() {
        env::remove_var("PORT");
        assert_eq!(options(&[]).resolve_port(), DEFAULT_PORT);
        assert_eq!(options(&["--port", "3000"]).resolve_port(), 3000);

        env::set_var("PORT", "4000");
        assert_eq!(options(&[]).resolve_port(), 4000);
        assert_eq!(options(&["--port", "3000"]).resolve_port(), 3000);

        env::set_var("PORT", "not a number");
        assert_eq!(options(&[]).resolve_port(), DEFAULT_PORT);

        env::set_var("PORT", "0");
        assert_eq!(options(&[]).resolve_port(), DEFAULT_PORT);

        env::remove_var("PORT");
    }
}
