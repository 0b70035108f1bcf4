use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use super::{Recognizer, SpeechUpdate, TranscriptSink};
use crate::error::SpeechError;

/// Dictation through an external program.
///
/// The program is expected to capture audio itself and print one recognized
/// phrase per line on stdout until it is killed. If it exits first, the
/// session is reported as ended.
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            child: None,
            reader: None,
        }
    }

    /// Build from `[program, args...]`; `None` when the list is empty
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Recognizer for CommandRecognizer {
    fn is_supported(&self) -> bool {
        which::which(&self.program).is_ok()
    }

    fn start(&mut self, sink: TranscriptSink) -> Result<(), SpeechError> {
        self.stop();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SpeechError::Spawn(std::io::Error::new(
                std::io::ErrorKind::Other,
                "dictation program has no stdout",
            ))
        })?;

        let session = sink.session();
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let phrase = line.trim();
                        if phrase.is_empty() {
                            continue;
                        }
                        if !sink.send(SpeechUpdate::Final(phrase.to_string())) {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!(session, "Dictation program closed its output");
                        sink.send(SpeechUpdate::Ended);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(session, error = %e, "Failed to read dictation output");
                        sink.send(SpeechUpdate::Ended);
                        break;
                    }
                }
            }
        });

        tracing::debug!(program = %self.program, session, "Dictation program spawned");
        self.child = Some(child);
        self.reader = Some(reader);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "Dictation program already exited");
            }
        }
    }
}

impl Drop for CommandRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}
