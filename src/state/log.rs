/// Append-only log shown in the UI
///
/// Lines are cleared at the start of every run and only ever appended
/// while it is in progress.

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(target: "dng2jpg::pane", "{}", line);
        self.lines.push(line);
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            self.push(line);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Error lines are highlighted in the pane
pub fn is_error_line(line: &str) -> bool {
    line.trim_start().starts_with("ERROR")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_extend_clear() {
        let mut log = LogBuffer::new();
        assert!(log.lines().is_empty());

        log.push("Selected folder: /photos");
        log.extend(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(log.lines(), ["Selected folder: /photos", "a", "b"]);

        log.clear();
        assert!(log.lines().is_empty());
    }

    #[test]
    fn test_error_lines() {
        assert!(is_error_line("  ERROR converting a.dng: failed to decode RAW: x"));
        assert!(!is_error_line("Errors: 0"));
        assert!(!is_error_line("[1/2] Converting: a.dng"));
    }
}
