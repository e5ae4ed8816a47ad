// # dns-verify-legacy - verification with API key credentials and extra A records

use std::process::ExitCode;

fn main() -> ExitCode {
    zonecheck::launch(zonecheck::Program::VerifyLegacy)
}
