use crate::error::AcquireError;

/// Transforme une ligne CSV en vecteur d'échantillons de longueur fixe.
///
/// Aucun effet de bord : en cas d'échec la boucle d'acquisition ne doit
/// toucher ni les filtres ni le store.
///
/// # Example
/// ```
/// use pt_acquire::parser::CurveParser;
/// let parser = CurveParser::new(3);
/// assert_eq!(parser.parse("1.0,2.5,3").unwrap(), vec![1.0, 2.5, 3.0]);
/// assert!(parser.parse("1.0,oops,3").is_err());
/// ```
pub struct CurveParser {
    expected_len: usize,
}

impl CurveParser {
    /// Create a parser expecting `expected_len` samples per line.
    #[must_use]
    pub fn new(expected_len: usize) -> Self {
        Self { expected_len }
    }

    /// Parse one newline-stripped line of comma-separated floats.
    ///
    /// Empty and whitespace-only tokens are skipped, matching the
    /// firmware's trailing-comma habit.
    ///
    /// # Errors
    /// `Parse` on a malformed numeric token, `LengthMismatch` when the
    /// token count differs from the configured curve length.
    pub fn parse(&self, line: &str) -> Result<Vec<f64>, AcquireError> {
        let mut values = Vec::with_capacity(self.expected_len);
        for token in line.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let value: f64 = token.parse().map_err(|_| AcquireError::Parse {
                token: token.to_string(),
            })?;
            values.push(value);
        }

        if values.len() != self.expected_len {
            return Err(AcquireError::LengthMismatch {
                expected: self.expected_len,
                got: values.len(),
            });
        }
        Ok(values)
    }

    /// Configured curve length N.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.expected_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_count_of_floats() {
        let parser = CurveParser::new(5);
        let values = parser.parse("1,2.5,-3,4e1,0.0").unwrap();
        assert_eq!(values, vec![1.0, 2.5, -3.0, 40.0, 0.0]);
    }

    #[test]
    fn skips_empty_tokens_and_trailing_comma() {
        let parser = CurveParser::new(3);
        let values = parser.parse("1, 2 ,3,").unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_malformed_token() {
        let parser = CurveParser::new(3);
        let err = parser.parse("1,deux,3").unwrap_err();
        assert!(matches!(err, AcquireError::Parse { token } if token == "deux"));
    }

    #[test]
    fn rejects_wrong_count() {
        let parser = CurveParser::new(25);
        let err = parser.parse("1,2,3").unwrap_err();
        assert!(matches!(
            err,
            AcquireError::LengthMismatch {
                expected: 25,
                got: 3
            }
        ));
    }

    #[test]
    fn empty_line_is_a_length_mismatch() {
        let parser = CurveParser::new(2);
        assert!(matches!(
            parser.parse("").unwrap_err(),
            AcquireError::LengthMismatch { got: 0, .. }
        ));
    }
}
