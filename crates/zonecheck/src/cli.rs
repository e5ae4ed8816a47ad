// # Command-Line Interface
//
// The three binaries share one flag set. Each binary names itself through
// `Program`, which also selects its credentials and sequence variant.

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use zonecheck_core::{Credentials, SequenceConfig};

use crate::ExitStatus;

const AFTER_HELP: &str = "ENVIRONMENT:
    CLOUDFLARE_API_TOKEN    API token (zone-info, dns-verify)
    CLOUDFLARE_API_KEY      Global API key (dns-verify-legacy)
    CLOUDFLARE_API_EMAIL    Account email paired with the API key (dns-verify-legacy)
    ZONECHECK_LOG_LEVEL     trace, debug, info, warn or error (default: info);
                            --trace output is shown at any level
    ZONECHECK_API_BASE      Override the API base URL

Single-dash spellings (-zone NAME, -zone=NAME, -trace) are accepted.";

/// Long flags that may also be spelled with a single dash
const SINGLE_DASH_FLAGS: &[&str] = &["zone", "trace", "help", "version"];

/// Flags shared by every program
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(version, long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Args {
    /// Zone to inspect (e.g. example.com)
    #[arg(long, value_name = "NAME")]
    pub zone: Option<String>,

    /// Log name resolution, connections, request headers and response status
    #[arg(long)]
    pub trace: bool,
}

/// The three programs built from this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// Print user and zone metadata
    ZoneInfo,
    /// Run the verification sequence with the duplicate-create probe
    Verify,
    /// Run the verification sequence with key/email credentials and extra records
    VerifyLegacy,
}

impl Program {
    /// Binary name
    pub fn name(self) -> &'static str {
        match self {
            Program::ZoneInfo => "zone-info",
            Program::Verify => "dns-verify",
            Program::VerifyLegacy => "dns-verify-legacy",
        }
    }

    /// One-line description for `--help`
    pub fn about(self) -> &'static str {
        match self {
            Program::ZoneInfo => "Print Cloudflare user and zone metadata as JSON",
            Program::Verify => {
                "Create, rename and delete a test record in a Cloudflare zone and print the results as JSON"
            }
            Program::VerifyLegacy => {
                "Like dns-verify, authenticating with a global API key, and also exercising extra A records"
            }
        }
    }

    /// Whether `--zone` must be given
    pub fn requires_zone(self) -> bool {
        !matches!(self, Program::ZoneInfo)
    }

    /// Whether this program runs the verification sequence
    pub fn verifies(self) -> bool {
        self.requires_zone()
    }

    /// Load this program's credentials
    pub fn credentials<F>(self, lookup: F) -> zonecheck_core::Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        match self {
            Program::ZoneInfo | Program::Verify => Credentials::api_token_from(lookup),
            Program::VerifyLegacy => Credentials::api_key_from(lookup),
        }
    }

    /// Sequence settings for the verification programs
    pub fn sequence_config(self) -> SequenceConfig {
        match self {
            Program::ZoneInfo | Program::Verify => {
                SequenceConfig::new().with_duplicate_probe(true)
            }
            Program::VerifyLegacy => SequenceConfig::new().with_extra_records(true),
        }
    }

    /// clap command carrying this program's name and description
    pub fn command(self) -> clap::Command {
        Args::command().name(self.name()).about(self.about())
    }

    /// Usage line, for reporting a missing `--zone`
    pub fn usage(self) -> String {
        let mut command = self.command();
        command.render_usage().to_string()
    }
}

/// Parse the command line
///
/// # Returns
///
/// - `Ok(Args)`: the parsed flags
/// - `Err(ExitStatus)`: help or version was printed (`Success`), or the
///   arguments were invalid and the error was printed (`ConfigError`)
pub fn parse<I, T>(program: Program, argv: I) -> Result<Args, ExitStatus>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let parsed = program
        .command()
        .try_get_matches_from(normalize_flags(argv))
        .and_then(|matches| Args::from_arg_matches(&matches));

    match parsed {
        Ok(args) => Ok(args),
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Err(ExitStatus::Success),
                _ => Err(ExitStatus::ConfigError),
            }
        }
    }
}

/// Rewrite `-zone`, `-zone=NAME` and `-trace` to their double-dash forms
///
/// Arguments after a bare `--` and values following `-zone` are left alone.
fn normalize_flags<I, T>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;
    let mut expects_value = false;

    for arg in argv.into_iter().map(Into::into) {
        if passthrough || expects_value {
            expects_value = false;
            normalized.push(arg);
            continue;
        }

        let rewritten = match arg.to_str() {
            Some("--") => {
                passthrough = true;
                None
            }
            Some(text) => single_dash_flag(text),
            None => None,
        };

        match rewritten {
            Some(flag) => {
                expects_value = flag == "--zone";
                normalized.push(OsString::from(flag));
            }
            None => {
                expects_value = arg.to_str() == Some("--zone");
                normalized.push(arg);
            }
        }
    }

    normalized
}

fn single_dash_flag(arg: &str) -> Option<String> {
    let body = arg.strip_prefix('-')?;
    if body.starts_with('-') {
        return None;
    }
    let name = body.split('=').next().unwrap_or(body);
    SINGLE_DASH_FLAGS
        .contains(&name)
        .then(|| format!("-{}", arg))
}
