use anyhow::{Result, anyhow};
use std::path::Path;

/// Longest title accepted for a record
pub const MAX_TITLE_LEN: usize = 200;

/// Longest filename kept in an object key, in bytes
const MAX_FILENAME_LEN: usize = 255;

/// Reduces a client-supplied filename to a single safe key component.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Browsers on Windows may send the full client path
    let unified = filename.replace('\\', "/");
    let name = Path::new(&unified)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if unified.contains("..") {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_control() => '_',
            ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';' => '_',
            c => c,
        })
        .collect();

    let sanitized = if sanitized.len() > MAX_FILENAME_LEN {
        let mut end = MAX_FILENAME_LEN;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return Err(anyhow!("Filename cannot be empty"));
    }
    Ok(sanitized)
}

/// Trims a title and checks it is usable as a unique record name.
pub fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(anyhow!("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(anyhow!("Title must be at most {} characters", MAX_TITLE_LEN));
    }
    if title.chars().any(|c| c.is_control()) {
        return Err(anyhow!("Title contains invalid characters"));
    }
    Ok(title.to_string())
}

/// Codes are compared verbatim, so only blank codes are rejected.
pub fn validate_secret_code(code: &str) -> Result<String> {
    if code.trim().is_empty() {
        return Err(anyhow!("Secret code is required"));
    }
    Ok(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test.pdf").unwrap(), "test.pdf");
        assert_eq!(sanitize_filename("my file.doc").unwrap(), "my file.doc");
        assert_eq!(
            sanitize_filename("test<script>.pdf").unwrap(),
            "test_script_.pdf"
        );
        assert_eq!(sanitize_filename("测试.txt").unwrap(), "测试.txt");
        assert_eq!(sanitize_filename(".env").unwrap(), ".env");

        // Path traversal
        assert_eq!(sanitize_filename("../../../etc/passwd").unwrap(), "passwd");
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\report.xlsx").unwrap(),
            "report.xlsx"
        );

        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("../").is_err());
    }

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Holiday  ").unwrap(), "Holiday");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
        assert!(validate_title("bad\ntitle").is_err());
    }

    #[test]
    fn test_validate_secret_code() {
        assert_eq!(validate_secret_code("1234").unwrap(), "1234");
        assert!(validate_secret_code("   ").is_err());
        assert!(validate_secret_code("").is_err());
    }
}
