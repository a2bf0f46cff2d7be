//! Interactive input and output for the session loop.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// What the learner did when asked a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A line of input, without the trailing newline. May be empty.
    Answer(String),
    /// Input stream closed (Ctrl+D or end of a piped file).
    EndOfInput,
    /// The read was interrupted by the user.
    Interrupted,
}

/// Question/answer channel used by the session loop.
pub trait Prompter {
    /// Show `prompt` and wait for one reply.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the terminal fails.
    fn ask(&mut self, prompt: &str) -> io::Result<Reply>;

    /// Print one block of feedback.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the terminal fails.
    fn say(&mut self, text: &str) -> io::Result<()>;
}

/// Prompter over any buffered reader and writer; stdin/stdout in the binaries.
pub struct StdioPrompter<In, Out> {
    input: In,
    output: Out,
}

impl StdioPrompter<io::StdinLock<'static>, io::Stdout> {
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<In: BufRead, Out: Write> StdioPrompter<In, Out> {
    pub fn new(input: In, output: Out) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> Out {
        self.output
    }
}

impl<In: BufRead, Out: Write> Prompter for StdioPrompter<In, Out> {
    fn ask(&mut self, prompt: &str) -> io::Result<Reply> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                // Keep the shell prompt off the question line.
                writeln!(self.output)?;
                Ok(Reply::EndOfInput)
            }
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']);
                Ok(Reply::Answer(trimmed.to_owned()))
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Reply::Interrupted),
            Err(e) => Err(e),
        }
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()
    }
}

/// Replays canned replies; reports end of input once they run out.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    replies: VecDeque<Reply>,
    transcript: Vec<String>,
}

impl ScriptedPrompter {
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            transcript: Vec::new(),
        }
    }

    /// Convenience for plain text answers.
    #[must_use]
    pub fn answers<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self::new(answers.into_iter().map(|a| Reply::Answer(a.into())))
    }

    /// Everything shown to the learner, prompts and feedback, in order.
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    #[must_use]
    pub fn prompts(&self) -> usize {
        self.transcript.iter().filter(|t| t.ends_with("? ")).count()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, prompt: &str) -> io::Result<Reply> {
        self.transcript.push(prompt.to_owned());
        Ok(self.replies.pop_front().unwrap_or(Reply::EndOfInput))
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        self.transcript.push(text.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdio_prompter_strips_newlines_and_detects_eof() {
        let input = io::Cursor::new("Germany\r\n\nFrance");
        let mut prompter = StdioPrompter::new(input, Vec::new());

        assert_eq!(prompter.ask("Q1? ").unwrap(), Reply::Answer("Germany".into()));
        assert_eq!(prompter.ask("Q2? ").unwrap(), Reply::Answer(String::new()));
        assert_eq!(prompter.ask("Q3? ").unwrap(), Reply::Answer("France".into()));
        assert_eq!(prompter.ask("Q4? ").unwrap(), Reply::EndOfInput);

        let output = String::from_utf8(prompter.into_output()).unwrap();
        assert_eq!(output, "Q1? Q2? Q3? Q4? \n");
    }

    #[test]
    fn scripted_prompter_runs_dry_into_end_of_input() {
        let mut prompter = ScriptedPrompter::answers(["a"]);
        assert_eq!(prompter.ask("x? ").unwrap(), Reply::Answer("a".into()));
        assert_eq!(prompter.ask("y? ").unwrap(), Reply::EndOfInput);
        prompter.say("done").unwrap();
        assert_eq!(prompter.transcript(), ["x? ", "y? ", "done"]);
        assert_eq!(prompter.prompts(), 2);
    }
}
