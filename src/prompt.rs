use std::io::{BufRead, Write};

use artisan_api::error::{ArtisanError, ExecutionError, ReportError};

/// Asks the operator a yes/no question. Only an explicit `y` or `yes` counts as consent, anything
/// else, including end of input, is a no.
pub fn ask_confirmation<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool, ArtisanError> {
    write!(output, "{question} [y/N]: ").structured(ExecutionError::ReadConfirmation)?;
    output.flush().structured(ExecutionError::ReadConfirmation)?;

    let mut response = String::new();
    input
        .read_line(&mut response)
        .structured(ExecutionError::ReadConfirmation)?;

    Ok(matches!(
        response.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Asks every question in turn. Stops at the first declined one.
pub fn confirm_all<R: BufRead, W: Write>(
    questions: &[String],
    input: &mut R,
    output: &mut W,
) -> Result<bool, ArtisanError> {
    for question in questions {
        if !ask_confirmation(question, input, output)? {
            return Ok(false);
        }
    }
    Ok(true)
}
