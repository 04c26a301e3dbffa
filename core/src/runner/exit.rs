use std::process::ExitStatus;

use crate::error::ScriptError;

/// Code reported for a finished script. A script killed by a signal
/// reports `128 + signal`, the value bash itself would put in `$?`.
pub fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status
            .code()
            .or_else(|| status.signal().map(|sig| 128 + sig))
            .unwrap_or(1)
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}

/// Only a zero exit code counts as a deployment success.
pub fn check_exit(status: ExitStatus) -> Result<(), ScriptError> {
    match exit_code(status) {
        0 => Ok(()),
        code => Err(ScriptError::ExecutionFailed { code }),
    }
}
