//! # Line Prompts
//!
//! Reads one trimmed line per question from any [`BufRead`], writing the
//! question to any [`Write`]. The binaries use locked stdin/stdout; tests
//! use a byte slice and a `Vec<u8>`.
//!
//! Parsing never touches the store: a value that is not a number becomes
//! a [`ValidationError`] before any request is built.

use std::io::{BufRead, Write};

use tracing::debug;

use shelf_core::{Money, ValidationError};

use crate::error::{CliError, CliResult};

/// Question/answer session over a reader and a writer.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Creates a new Prompt.
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }

    /// Output side, for rendering results.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consumes the prompt, returning the writer.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Writes one line.
    pub fn say(&mut self, text: &str) -> CliResult<()> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Asks a question and returns the trimmed answer (possibly empty).
    ///
    /// ## Errors
    /// * `EndOfInput` - The reader is exhausted
    /// * `Input` - The line is not valid UTF-8; the line is consumed
    /// * `Io` - Reading or writing failed
    pub fn ask(&mut self, question: &str) -> CliResult<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut bytes = Vec::new();
        if self.input.read_until(b'\n', &mut bytes)? == 0 {
            return Err(CliError::EndOfInput);
        }
        let line = String::from_utf8(bytes).map_err(|_| ValidationError::InvalidFormat {
            field: "input".to_string(),
            reason: "not valid UTF-8".to_string(),
        })?;
        Ok(line.trim().to_string())
    }

    /// Asks a "leave blank to skip" question; blank means `None`.
    pub fn ask_optional(&mut self, question: &str) -> CliResult<Option<String>> {
        Ok(non_blank(self.ask(question)?))
    }

    /// Asks for a whole number.
    pub fn ask_i64(&mut self, question: &str, field: &str) -> CliResult<i64> {
        let answer = self.ask(question)?;
        Ok(parse_i64(field, &answer)?)
    }

    /// Asks for an optional whole number; blank means `None`.
    pub fn ask_optional_i64(&mut self, question: &str, field: &str) -> CliResult<Option<i64>> {
        match self.ask_optional(question)? {
            Some(answer) => Ok(Some(parse_i64(field, &answer)?)),
            None => Ok(None),
        }
    }

    /// Asks for a price.
    pub fn ask_money(&mut self, question: &str) -> CliResult<Money> {
        Ok(self.ask(question)?.parse::<Money>()?)
    }

    /// Asks for an optional price; blank means `None`.
    pub fn ask_optional_money(&mut self, question: &str) -> CliResult<Option<Money>> {
        match self.ask_optional(question)? {
            Some(answer) => Ok(Some(answer.parse::<Money>()?)),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Menu Loop Support
// =============================================================================

/// What the menu loop does after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Settles the outcome of one menu action.
///
/// Domain, store and input errors are printed as `Error: <message>` and the
/// loop continues. End of input exits; terminal I/O failures propagate.
pub fn settle<R: BufRead, W: Write>(prompt: &mut Prompt<R, W>, outcome: CliResult<Flow>) -> CliResult<Flow> {
    match outcome {
        Ok(flow) => Ok(flow),
        Err(CliError::EndOfInput) => Ok(Flow::Exit),
        Err(err @ CliError::Io(_)) => Err(err),
        Err(err) => {
            debug!(kind = ?err.kind(), "Menu action failed");
            prompt.say(&format!("Error: {}", err))?;
            Ok(Flow::Continue)
        }
    }
}

/// `None` for blank text.
pub fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parses a whole number typed at a prompt.
pub fn parse_i64(field: &str, input: &str) -> Result<i64, ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::required(field));
    }
    input
        .parse::<i64>()
        .map_err(|_| ValidationError::invalid_number(field, input))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(input: &str) -> Prompt<&[u8], Vec<u8>> {
        Prompt::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn test_ask_trims_and_echoes_question() {
        let mut p = prompt("  Ada  \n");
        assert_eq!(p.ask("Name: ").unwrap(), "Ada");
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "Name: ");
    }

    #[test]
    fn test_end_of_input() {
        let mut p = prompt("");
        assert!(matches!(p.ask("Name: "), Err(CliError::EndOfInput)));
    }

    #[test]
    fn test_optional_blank_is_none() {
        let mut p = prompt("\n   \nSciFi\n");
        assert_eq!(p.ask_optional("a: ").unwrap(), None);
        assert_eq!(p.ask_optional("b: ").unwrap(), None);
        assert_eq!(p.ask_optional("c: ").unwrap().as_deref(), Some("SciFi"));
    }

    #[test]
    fn test_numbers() {
        let mut p = prompt("42\nabc\n\n0\n");
        assert_eq!(p.ask_i64("id: ", "book id").unwrap(), 42);
        let err = p.ask_i64("id: ", "book id").unwrap_err();
        assert_eq!(err.to_string(), "book id: 'abc' is not a valid number");
        assert_eq!(p.ask_optional_i64("stock: ", "stock").unwrap(), None);
        assert_eq!(p.ask_optional_i64("stock: ", "stock").unwrap(), Some(0));
    }

    #[test]
    fn test_money() {
        let mut p = prompt("4.5\nfree\n\n");
        assert_eq!(p.ask_money("price: ").unwrap(), Money::from_cents(450));
        assert!(matches!(p.ask_money("price: "), Err(CliError::Input(_))));
        assert_eq!(p.ask_optional_money("price: ").unwrap(), None);
    }

    #[test]
    fn test_settle() {
        let mut p = prompt("");
        assert_eq!(settle(&mut p, Ok(Flow::Continue)).unwrap(), Flow::Continue);
        assert_eq!(settle(&mut p, Err(CliError::EndOfInput)).unwrap(), Flow::Exit);

        let err = CliError::from(ValidationError::required("name"));
        assert_eq!(settle(&mut p, Err(err)).unwrap(), Flow::Continue);
        assert_eq!(String::from_utf8(p.into_output()).unwrap(), "Error: name is required\n");
    }

    #[test]
    fn test_invalid_utf8_line_is_input_error() {
        let mut p = Prompt::new(&b"\xff\xfe\n13\n"[..], Vec::new());

        let err = p.ask("Choose: ").unwrap_err();
        assert!(matches!(err, CliError::Input(ValidationError::InvalidFormat { .. })));
        assert!(!err.ends_session());
        assert_eq!(settle(&mut p, Err(err)).unwrap(), Flow::Continue);

        assert_eq!(p.ask("Choose: ").unwrap(), "13");
        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("Error: input has invalid format: not valid UTF-8\n"));
    }

    #[test]
    fn test_parse_i64_requires_value() {
        assert_eq!(parse_i64("member id", " "), Err(ValidationError::required("member id")));
        assert_eq!(parse_i64("member id", "-3"), Ok(-3));
    }
}
