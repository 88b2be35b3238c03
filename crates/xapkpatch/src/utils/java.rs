use crate::error::{PipelineError, Result};
use std::path::PathBuf;
use tracing::debug;

#[cfg(windows)]
const JAVA_BINARY: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_BINARY: &str = "java";

/// Finds a Java runtime, preferring `JAVA_HOME` (via `java-locator`) and
/// falling back to `PATH`.
pub fn locate_java() -> Result<PathBuf> {
    match java_locator::locate_java_home() {
        Ok(java_home) => {
            let java = PathBuf::from(java_home).join("bin").join(JAVA_BINARY);
            if java.is_file() {
                return Ok(java);
            }
            debug!("Java home has no {} binary, trying PATH", JAVA_BINARY);
        }
        Err(err) => debug!("Java home not found: {}", err),
    }

    which::which(JAVA_BINARY)
        .map_err(|_| PipelineError::prerequisite("java", "Java not found on JAVA_HOME or PATH"))
}
