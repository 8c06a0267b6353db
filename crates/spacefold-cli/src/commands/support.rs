use std::io::{self, Write};

use anyhow::Result;
use spacefold_core::{ErrorPayload, SpaceError};

pub(super) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

/// Structured form of the first index error behind `err`, if there is one.
pub(crate) fn error_payload(operation: &str, err: &anyhow::Error) -> Option<ErrorPayload> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SpaceError>())
        .map(|space_err| space_err.to_payload(operation, None))
}
