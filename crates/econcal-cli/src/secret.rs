//! Secret reference resolver.
//!
//! Credential values (the FMP API key, the service account key) can
//! reference secrets stored outside the config file:
//!
//! - `pass::path/in/store` - runs `pass show path/in/store`, returns first line
//! - `env::VAR_NAME` - reads `$VAR_NAME` from the environment
//! - `file::/path/to/key.json` - reads the whole file
//! - anything else - returned as-is (plain text)

use std::path::Path;

/// Resolves a value that may contain a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        resolve_env(var)
    } else if let Some(path) = value.strip_prefix("file::") {
        resolve_file(Path::new(path))
    } else {
        Ok(value.to_string())
    }
}

/// Returns true if `value` is a reference rather than a literal secret.
pub fn is_reference(value: &str) -> bool {
    ["pass::", "env::", "file::"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
}

/// Runs `pass show <path>` and returns the first line of stdout.
fn resolve_pass(path: &str) -> Result<String, String> {
    let output = std::process::Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed (exit {}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(|s| s.to_string())
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

/// Reads an environment variable.
fn resolve_env(var: &str) -> Result<String, String> {
    std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
}

/// Reads a whole file.
fn resolve_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plain_text_passthrough() {
        assert_eq!(resolve("hello").unwrap(), "hello");
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(resolve(r#"{"type":"service_account"}"#).unwrap(), r#"{"type":"service_account"}"#);
    }

    #[test]
    fn env_prefix_resolves() {
        unsafe {
            std::env::set_var("_ECONCAL_TEST_SECRET", "my-secret-value");
        }
        assert_eq!(resolve("env::_ECONCAL_TEST_SECRET").unwrap(), "my-secret-value");
        unsafe {
            std::env::remove_var("_ECONCAL_TEST_SECRET");
        }
    }

    #[test]
    fn env_prefix_missing_var_errors() {
        let result = resolve("env::_ECONCAL_NONEXISTENT_VAR_12345");
        assert!(result.unwrap_err().contains("not set"));
    }

    #[test]
    fn file_prefix_reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\n  \"client_email\": \"a@b\"\n}}\n").unwrap();

        let value = resolve(&format!("file::{}", file.path().display())).unwrap();
        assert!(value.contains("\"client_email\": \"a@b\""));
        assert_eq!(value.lines().count(), 3);
    }

    #[test]
    fn file_prefix_missing_file_errors() {
        let result = resolve("file::/nonexistent/econcal/key.json");
        assert!(result.unwrap_err().contains("failed to read"));
    }

    #[test]
    fn pass_prefix_missing_entry_errors() {
        let result = resolve("pass::nonexistent/entry/that/should/not/exist/12345");
        assert!(result.is_err());
    }

    #[test]
    fn reference_detection() {
        assert!(is_reference("env::FMP_API_KEY"));
        assert!(is_reference("file::/etc/key.json"));
        assert!(is_reference("pass::econcal/fmp"));
        assert!(!is_reference("abc123"));
    }
}
