use crate::ScraperError;
use std::io::{self, BufRead, Write};

/// Asks the user for missing secrets
pub trait Prompter: Send + Sync {
    /// Shows an informational line
    fn notice(&self, message: &str) -> Result<(), ScraperError>;

    /// Asks a question and returns the trimmed answer
    fn ask(&self, question: &str) -> Result<String, ScraperError>;
}

/// Prompts on the terminal
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn notice(&self, message: &str) -> Result<(), ScraperError> {
        eprintln!("{}", message);
        Ok(())
    }

    fn ask(&self, question: &str) -> Result<String, ScraperError> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", question)?;
        stderr.flush()?;

        let mut answer = String::new();
        let read = io::stdin().lock().read_line(&mut answer)?;
        if read == 0 {
            return Err(ScraperError::Credentials(
                "input closed before the keys were entered".to_string(),
            ));
        }
        Ok(answer.trim().to_string())
    }
}
