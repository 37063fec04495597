use crate::session::{Session, SessionError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted instrument session for unit tests.
///
/// Responses are served in order, one per `read_response` call. Every
/// command (plus `<clear>` and `<close>` markers) is appended to a shared
/// log so tests can assert on the exact wire traffic even after the
/// session has been moved into the code under test.
pub struct FakeSession {
    responses: VecDeque<Result<String, SessionError>>,
    commands: Arc<Mutex<Vec<String>>>,
    fail_write_at: Option<usize>,
    writes: usize,
}

impl FakeSession {
    /// A session that answers every read with the next scripted response.
    pub fn new<I>(responses: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Self::with_results(
            responses
                .into_iter()
                .map(|r| Ok(r.as_ref().to_string()))
                .collect(),
        )
    }

    /// A session with explicit per-read results, for injecting failures.
    pub fn with_results(responses: Vec<Result<String, SessionError>>) -> Self {
        FakeSession {
            responses: responses.into(),
            commands: Arc::new(Mutex::new(Vec::new())),
            fail_write_at: None,
            writes: 0,
        }
    }

    /// Fail the n-th write call (1-based).
    pub fn fail_write_at(mut self, n: usize) -> Self {
        self.fail_write_at = Some(n);
        self
    }

    /// Shared handle to the command log.
    pub fn commands(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.commands)
    }

    fn log(&self, entry: &str) {
        self.commands.lock().unwrap().push(entry.to_string());
    }
}

impl Session for FakeSession {
    fn clear(&mut self) -> Result<(), SessionError> {
        self.log("<clear>");
        Ok(())
    }

    fn write_command(&mut self, command: &str) -> Result<(), SessionError> {
        self.writes += 1;
        if self.fail_write_at == Some(self.writes) {
            return Err(SessionError::Write("injected write failure".into()));
        }
        self.log(command);
        Ok(())
    }

    fn read_response(&mut self) -> Result<String, SessionError> {
        match self.responses.pop_front() {
            Some(result) => result,
            None => Err(SessionError::Read("response script exhausted".into())),
        }
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.log("<close>");
        Ok(())
    }
}
