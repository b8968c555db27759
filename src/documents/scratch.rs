use super::{ExtractionError, ExtractionResult};
use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

const SCRATCH_PREFIX: &str = "codemate-upload-";

/// Writes `bytes` to a temporary file, runs `parse` against its path, and
/// removes the file before returning. The file is removed on every path out of
/// this function, including write and parse failures.
///
/// Third-party parsers panic on some malformed inputs; a panic inside `parse`
/// is turned into an error through `on_panic`.
pub(super) fn with_scratch_copy<T>(
    bytes: &[u8],
    suffix: &str,
    parse: impl FnOnce(&Path) -> ExtractionResult<T>,
    on_panic: fn(String) -> ExtractionError,
) -> ExtractionResult<T> {
    let mut file = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .suffix(suffix)
        .tempfile()
        .map_err(|err| ExtractionError::Io(err.to_string()))?;

    // On an early return the NamedTempFile drop guard deletes the file.
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|err| ExtractionError::Io(err.to_string()))?;

    let path = file.path();
    let parsed = panic::catch_unwind(AssertUnwindSafe(|| parse(path)))
        .unwrap_or_else(|payload| Err(on_panic(panic_message(payload.as_ref()))));
    let released = file.close();

    let value = parsed?;
    released.map_err(|err| ExtractionError::Io(err.to_string()))?;
    Ok(value)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("parser panicked: {detail}")
}
