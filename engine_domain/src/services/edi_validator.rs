/// Structural validator for fixed-width EDI `A`/`B`/`C` records (§4.4).
///
/// Reusable across files: internal state (the fatal-error log, the
/// minor-error flag) is reset at the start of every [`EdiValidator::validate`]
/// / [`EdiValidator::validate_with_warnings`] call, and can also be reset
/// explicitly via [`EdiValidator::clear`].
#[derive(Debug, Default)]
pub struct EdiValidator {
    error_log: Vec<String>,
    has_errors: bool,
    has_minor_errors: bool,
}

impl EdiValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.error_log.clear();
        self.has_errors = false;
        self.has_minor_errors = false;
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn has_minor_errors(&self) -> bool {
        self.has_minor_errors
    }

    /// The accumulated fatal-error log from the most recent call, newline-joined.
    pub fn get_error_log(&self) -> String {
        self.error_log.join("\n")
    }

    /// Validates `contents` (the file's full text), returning `(is_valid, errors)`.
    pub fn validate(&mut self, contents: &str) -> (bool, Vec<String>) {
        let (is_valid, errors, _warnings) = self.validate_with_warnings(contents);
        (is_valid, errors)
    }

    /// Validates `contents`, returning `(is_valid, errors, warnings)`. Fatal
    /// conditions make `is_valid` false; warnings never do.
    pub fn validate_with_warnings(&mut self, contents: &str) -> (bool, Vec<String>, Vec<String>) {
        self.clear();

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut saw_any_line = false;
        for (idx, line) in contents.lines().enumerate() {
            saw_any_line = true;
            let line_no = idx + 1;
            let first = line.chars().next();

            if line_no == 1 {
                if first != Some('A') {
                    errors.push("Line 1 must start with A".to_string());
                }
                continue;
            }

            match first {
                None => continue,
                Some('A') => errors.push(format!("Invalid record type on line {line_no}")),
                Some('B') => self.validate_b_record(line, line_no, &mut errors, &mut warnings),
                Some('C') => {
                    // Structural checks only - no further rules to apply.
                }
                Some(_) => errors.push(format!("Invalid record type on line {line_no}")),
            }
        }

        if !saw_any_line {
            errors.push("File is empty".to_string());
        }

        self.has_errors = !errors.is_empty();
        self.has_minor_errors = !warnings.is_empty();
        self.error_log = errors.clone();

        (!self.has_errors, errors, warnings)
    }

    fn validate_b_record(&self, line: &str, line_no: usize, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
        let len = line.chars().count();

        if len == 71 {
            warnings.push("Missing pricing".to_string());
            return;
        }

        if len != 77 {
            errors.push(format!("Invalid B record length on line {line_no}: expected 77, got {len}"));
            return;
        }

        let chars: Vec<char> = line.chars().collect();
        let upc: String = chars[1..12].iter().collect();
        let upc_trimmed = upc.trim();

        if upc_trimmed.is_empty() {
            warnings.push("Blank UPC".to_string());
        } else if upc_trimmed.len() == 8 {
            warnings.push("Suppressed UPC".to_string());
        } else if upc.len() != 11 || !upc.chars().all(|c| c.is_ascii_digit()) {
            errors.push(format!("Invalid UPC on line {line_no}: {upc:?} is not an 11-digit number"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_minimal_file_passes() {
        let mut v = EdiValidator::new();
        let contents = "AHEADER\n";
        let (ok, errors) = v.validate(contents);
        assert!(ok, "{errors:?}");
        assert!(errors.is_empty());
    }

    #[test]
    fn line_one_must_start_with_a() {
        let mut v = EdiValidator::new();
        let (ok, errors) = v.validate("XHEADER\n");
        assert!(!ok);
        assert!(!errors.is_empty());
    }

    #[test]
    fn invalid_record_type_is_fatal() {
        let mut v = EdiValidator::new();
        let (ok, errors) = v.validate("AHEADER\nZJUNK\n");
        assert!(!ok);
        assert!(errors.iter().any(|e| e.contains("Invalid record type on line 2")));
    }

    #[test]
    fn b_record_wrong_length_is_fatal() {
        let mut v = EdiValidator::new();
        let short_b = format!("B{}", "1".repeat(20));
        let (ok, errors) = v.validate(&format!("AHEADER\n{short_b}\n"));
        assert!(!ok);
        assert!(errors.iter().any(|e| e.contains("Invalid B record length")));
    }

    #[test]
    fn b_record_missing_pricing_is_warning_not_error() {
        let mut v = EdiValidator::new();
        let b = format!("B{}", " ".repeat(70));
        assert_eq!(b.chars().count(), 71);
        let (ok, errors, warnings) = v.validate_with_warnings(&format!("AHEADER\n{b}\n"));
        assert!(ok);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w == "Missing pricing"));
    }

    #[test]
    fn blank_upc_is_warning() {
        let mut v = EdiValidator::new();
        // 'B' + 11 spaces (UPC field) + 65 spaces = 77 chars total.
        let line = format!("B{}{}", " ".repeat(11), " ".repeat(65));
        assert_eq!(line.chars().count(), 77);
        let (ok, errors, warnings) = v.validate_with_warnings(&format!("AHEADER\n{line}\n"));
        assert!(ok);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w == "Blank UPC"));
        assert!(v.has_minor_errors());
        assert!(!v.has_errors());
    }

    #[test]
    fn suppressed_upc_is_warning() {
        let mut v = EdiValidator::new();
        let upc = "12345678"; // 8 chars
        let padded_upc = format!("{upc:11}"); // left-justified to 11 wide field
        let line = format!("B{}{}", padded_upc, " ".repeat(65));
        assert_eq!(line.chars().count(), 77);
        let (ok, _errors, warnings) = v.validate_with_warnings(&format!("AHEADER\n{line}\n"));
        assert!(ok);
        assert!(warnings.iter().any(|w| w == "Suppressed UPC"));
    }

    #[test]
    fn valid_upc_has_no_warning() {
        let mut v = EdiValidator::new();
        let line = format!("B{}{}", "12345678901", " ".repeat(65));
        assert_eq!(line.chars().count(), 77);
        let (ok, errors, warnings) = v.validate_with_warnings(&format!("AHEADER\n{line}\n"));
        assert!(ok, "{errors:?}");
        assert!(warnings.is_empty());
    }

    #[test]
    fn state_resets_between_calls() {
        let mut v = EdiValidator::new();
        let _ = v.validate("ZBAD\n");
        assert!(v.has_errors());
        let (ok, errors) = v.validate("AHEADER\n");
        assert!(ok);
        assert!(errors.is_empty());
        assert!(!v.has_errors());
    }
}
