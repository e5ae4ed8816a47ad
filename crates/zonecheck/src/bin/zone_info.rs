// # zone-info - print Cloudflare user and zone metadata

use std::process::ExitCode;

fn main() -> ExitCode {
    zonecheck::launch(zonecheck::Program::ZoneInfo)
}
