// # dns-verify - create/rename/delete verification with a duplicate-create probe

use std::process::ExitCode;

fn main() -> ExitCode {
    zonecheck::launch(zonecheck::Program::Verify)
}
