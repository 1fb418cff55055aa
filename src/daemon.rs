//! The long-running daemon: the night-cycle controller and its timer loop.
//!
//! One fire at a time: the loop sleeps until the next scheduled wakeup,
//! runs the matching handler to completion, then recomputes the next fire
//! from the clock. Fires missed while a handler ran long collapse into the
//! single next fire. Shutdown arrives on a watch channel and is observed
//! between fires, never by aborting an in-flight invocation.

mod timer;

use chrono::Local;
use nocturne_agent::ClaudeCli;
use nocturne_core::config::Config;
use nocturne_core::night::{NightCycle, WakeupKind};
use nocturne_core::prompt;
use nocturne_core::schedule::{cron_field, last_wakeup_label, minute_pattern, ordinary_hours};
use nocturne_core::traits::{Agent, SessionMode};
use nocturne_journal::Journal;
use std::sync::Arc;
use timer::{FireKind, NightTimer};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// The night-cycle controller: owns the session state and drives the agent
/// through first, middle, and closing wakeups.
pub struct Daemon {
    config: Config,
    cycle: NightCycle,
    agent: Arc<dyn Agent>,
    journal: Journal,
}

impl Daemon {
    /// Wire the daemon from a loaded config.
    pub fn new(config: Config) -> Self {
        let agent = Arc::new(ClaudeCli::new(
            config.paths.claude_path.clone(),
            config.paths.working_dir.clone(),
        ));
        let journal = Journal::new(config.paths.journal_dir.clone());
        Self {
            config,
            cycle: NightCycle::new(),
            agent,
            journal,
        }
    }

    #[cfg(test)]
    fn with_agent(config: Config, agent: Arc<dyn Agent>) -> Self {
        let journal = Journal::new(config.paths.journal_dir.clone());
        Self {
            config,
            cycle: NightCycle::new(),
            agent,
            journal,
        }
    }

    /// Run until a shutdown signal arrives.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let schedule = &self.config.schedule;
        let hours = ordinary_hours(schedule.night_start, schedule.night_end);
        let minutes = minute_pattern(schedule.interval_minutes);
        info!(
            "Nocturne running | hours: {} | minutes: {} | closing: {}",
            cron_field(&hours),
            cron_field(&minutes),
            last_wakeup_label(schedule.night_end)
        );

        let night_timer = NightTimer::from_config(schedule)?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            wait_for_signal().await;
            let _ = shutdown_tx.send(true);
        });

        loop {
            let now = Local::now();
            let (kind, when) = night_timer.next_fire(now)?;
            let wait = (when - now).to_std().unwrap_or_default();
            debug!("next fire {kind:?} at {when}");

            tokio::select! {
                _ = tokio::time::sleep(wait) => match kind {
                    FireKind::Ordinary => self.ordinary_wakeup().await,
                    FireKind::Closing => self.last_wakeup().await,
                },
                _ = shutdown_rx.changed() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        info!("Shutdown complete.");
        Ok(())
    }

    /// One ordinary wakeup: classify, mint a session when a new night
    /// begins, build the prompt, invoke the agent, journal any output.
    ///
    /// Invocation failures are logged and swallowed. The session minted at
    /// a first wakeup is never rolled back, so a failed first wakeup still
    /// claims the night and the next fire continues it as a middle wakeup.
    async fn ordinary_wakeup(&mut self) {
        let now = Local::now();
        let night_end = self.config.schedule.night_end;

        let kind = self.cycle.classify(now, night_end);
        let session = match kind {
            WakeupKind::First => {
                let session = self.cycle.begin_night(now, night_end).clone();
                info!("First wakeup of the night, session {}", session.id);
                session
            }
            WakeupKind::Middle => match self.cycle.session() {
                Some(session) => {
                    info!("Continuing session {}", session.id);
                    session.clone()
                }
                None => {
                    warn!("middle wakeup with no session, skipping");
                    return;
                }
            },
        };

        let prompt_text = match kind {
            WakeupKind::First => {
                let template = prompt::load_template(
                    &self.config.paths.opening_prompt_file,
                    prompt::OPENING_FALLBACK,
                );
                prompt::opening_prompt(now, &template, &last_wakeup_label(night_end))
            }
            WakeupKind::Middle => prompt::middle_prompt(now),
        };

        let mode = match kind {
            WakeupKind::First => SessionMode::Start(&session.id),
            WakeupKind::Middle => SessionMode::Resume(&session.id),
        };

        match self.agent.invoke(mode, &prompt_text).await {
            Ok(output) => {
                if !output.is_empty() {
                    let opening =
                        matches!(kind, WakeupKind::First).then_some(session.id.as_str());
                    let stamp = prompt::time_label(Local::now());
                    if let Err(e) = self
                        .journal
                        .append(session.night_date, &stamp, &output, opening)
                        .await
                    {
                        error!("failed to journal wakeup output: {e}");
                    }
                }
                info!("Wakeup complete");
            }
            Err(e) => error!("agent invocation failed: {e}"),
        }
    }

    /// The closing wakeup at `night_end:00`. Always resumes, never starts;
    /// when no session exists one is minted first. No state transition
    /// afterwards: the next ordinary wakeup detects the date rollover and
    /// opens the next night on its own.
    async fn last_wakeup(&mut self) {
        let now = Local::now();
        let night_end = self.config.schedule.night_end;

        let session = match self.cycle.session() {
            Some(session) => session.clone(),
            None => {
                let session = self.cycle.begin_night(now, night_end).clone();
                warn!(
                    "No existing session at the closing wakeup, minted {}",
                    session.id
                );
                session
            }
        };
        info!("Closing wakeup, session {}", session.id);

        let template = prompt::load_template(
            &self.config.paths.closing_prompt_file,
            prompt::CLOSING_FALLBACK,
        );
        let prompt_text = prompt::closing_prompt(now, &template);

        match self
            .agent
            .invoke(SessionMode::Resume(&session.id), &prompt_text)
            .await
        {
            Ok(output) => {
                if !output.is_empty() {
                    let stamp = prompt::time_label(Local::now());
                    if let Err(e) = self
                        .journal
                        .append(session.night_date, &stamp, &output, None)
                        .await
                    {
                        error!("failed to journal closing output: {e}");
                    }
                }
                info!("Closing wakeup complete. Goodnight.");
            }
            Err(e) => error!("agent invocation failed: {e}"),
        }
    }
}

/// Resolve when the process is asked to stop (SIGINT or SIGTERM).
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nocturne_core::error::NocturneError;
    use nocturne_core::night::night_date_for;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Start,
        Resume,
    }

    /// Records every invocation; replies with a canned output, or an error
    /// on every call or on one chosen call.
    struct FakeAgent {
        calls: Mutex<Vec<(Mode, String, String)>>,
        fail_with: Option<String>,
        fail_call: Option<usize>,
        output: String,
    }

    impl FakeAgent {
        fn replying(output: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: None,
                fail_call: None,
                output: output.to_string(),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
                fail_call: None,
                output: String::new(),
            }
        }

        /// Fail only the given call (1-based); the others succeed.
        fn failing_call(call: usize, message: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(message.to_string()),
                fail_call: Some(call),
                output: "Back again.".to_string(),
            }
        }

        fn calls(&self) -> Vec<(Mode, String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Agent for FakeAgent {
        async fn invoke(
            &self,
            mode: SessionMode<'_>,
            prompt: &str,
        ) -> nocturne_core::Result<String> {
            let recorded = match mode {
                SessionMode::Start(_) => Mode::Start,
                SessionMode::Resume(_) => Mode::Resume,
            };
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((recorded, mode.id().to_string(), prompt.to_string()));
                calls.len()
            };
            match &self.fail_with {
                Some(message) if self.fail_call.map_or(true, |c| c == call) => {
                    Err(NocturneError::Agent(message.clone()))
                }
                _ => Ok(self.output.clone()),
            }
        }
    }

    fn test_config(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.journal_dir = tmp.path().join("nights");
        config.paths.opening_prompt_file = tmp.path().join("night_begins.md");
        config.paths.closing_prompt_file = tmp.path().join("night_ends.md");
        config.paths.working_dir = tmp.path().to_path_buf();
        config
    }

    fn journal_contents(daemon: &Daemon, tmp: &TempDir) -> String {
        let night = night_date_for(Local::now(), daemon.config.schedule.night_end);
        std::fs::read_to_string(tmp.path().join("nights").join(format!("{night}.log")))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_first_wakeup_starts_session_and_journals() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::replying("The house is quiet tonight."));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.ordinary_wakeup().await;

        let calls = agent.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Mode::Start);
        assert!(!calls[0].1.is_empty());
        // No template file on disk: the fallback opening line is used.
        assert!(calls[0].2.contains("The night begins."));

        let content = journal_contents(&daemon, &tmp);
        assert!(content.contains("=== Night of"));
        assert!(content.contains(&format!("Session: {}", calls[0].1)));
        assert!(content.contains("The house is quiet tonight."));
    }

    #[tokio::test]
    async fn test_middle_wakeup_resumes_same_session() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::replying("Still here."));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.ordinary_wakeup().await;
        daemon.ordinary_wakeup().await;

        let calls = agent.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].0, Mode::Resume);
        assert_eq!(calls[0].1, calls[1].1);
        assert!(calls[1].2.contains("You have time alone."));
        assert!(!calls[1].2.contains("The night begins."));

        // One header, two blocks.
        let content = journal_contents(&daemon, &tmp);
        assert_eq!(content.matches("=== Night of").count(), 1);
        assert_eq!(content.matches("Still here.").count(), 2);
    }

    #[tokio::test]
    async fn test_opening_template_read_from_disk() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        std::fs::write(&config.paths.opening_prompt_file, "Wander well.").unwrap();
        let agent = Arc::new(FakeAgent::replying("ok"));
        let mut daemon = Daemon::with_agent(config, agent.clone());

        daemon.ordinary_wakeup().await;

        let prompt = agent.calls()[0].2.clone();
        assert!(prompt.contains("Your last wakeup tonight will be at 5:00 AM."));
        assert!(prompt.contains("Wander well."));
    }

    #[tokio::test]
    async fn test_failed_first_wakeup_still_claims_the_night() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::failing("claude CLI timed out after 900s"));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.ordinary_wakeup().await;
        let first_session = daemon.cycle.session().unwrap().id.clone();
        daemon.ordinary_wakeup().await;

        let calls = agent.calls();
        // The night is claimed: the second fire resumes, it does not start over.
        assert_eq!(calls[0].0, Mode::Start);
        assert_eq!(calls[1].0, Mode::Resume);
        assert_eq!(calls[1].1, first_session);
        assert_eq!(daemon.cycle.session().unwrap().id, first_session);

        // Nothing was journaled.
        assert!(!tmp.path().join("nights").exists());
    }

    #[tokio::test]
    async fn test_night_survives_a_failed_middle_wakeup() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::failing_call(2, "claude CLI timed out after 900s"));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.ordinary_wakeup().await;
        let session = daemon.cycle.session().unwrap().id.clone();
        daemon.ordinary_wakeup().await;
        daemon.ordinary_wakeup().await;

        let calls = agent.calls();
        assert_eq!(calls.len(), 3);
        // The failed middle fire changes nothing: the next wakeup still
        // resumes the same session.
        assert_eq!(calls[1].0, Mode::Resume);
        assert_eq!(calls[2].0, Mode::Resume);
        assert_eq!(calls[2].1, session);
        assert_eq!(daemon.cycle.session().unwrap().id, session);

        // Only the two successful fires reached the journal.
        let content = journal_contents(&daemon, &tmp);
        assert_eq!(content.matches("=== Night of").count(), 1);
        assert_eq!(content.matches("Back again.").count(), 2);
    }

    #[tokio::test]
    async fn test_empty_output_is_not_journaled() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::replying(""));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.ordinary_wakeup().await;

        assert!(daemon.cycle.session().is_some());
        assert!(!tmp.path().join("nights").exists());
    }

    #[tokio::test]
    async fn test_last_wakeup_without_session_mints_one() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::replying("Goodnight."));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.last_wakeup().await;

        let calls = agent.calls();
        assert_eq!(calls.len(), 1);
        // Even a freshly minted session is resumed, never started.
        assert_eq!(calls[0].0, Mode::Resume);
        assert!(!calls[0].1.is_empty());
        assert!(calls[0].2.contains("The night ends. Rest well."));

        // The closing block never carries the night header.
        let content = journal_contents(&daemon, &tmp);
        assert!(content.starts_with("--- "));
        assert!(!content.contains("=== Night of"));
    }

    #[tokio::test]
    async fn test_last_wakeup_resumes_existing_session() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::replying("output"));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.ordinary_wakeup().await;
        daemon.last_wakeup().await;

        let calls = agent.calls();
        assert_eq!(calls[0].1, calls[1].1);
        assert_eq!(calls[1].0, Mode::Resume);

        // The session survives the closing wakeup untouched.
        assert_eq!(daemon.cycle.session().unwrap().id, calls[0].1);
    }

    #[tokio::test]
    async fn test_closing_template_read_fresh_each_fire() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(&tmp);
        let closing_path = config.paths.closing_prompt_file.clone();
        let agent = Arc::new(FakeAgent::replying("out"));
        let mut daemon = Daemon::with_agent(config, agent.clone());

        daemon.last_wakeup().await;
        std::fs::write(&closing_path, "Fold the night away.").unwrap();
        daemon.last_wakeup().await;

        let calls = agent.calls();
        assert!(calls[0].2.contains("The night ends. Rest well."));
        assert!(calls[1].2.contains("Fold the night away."));
    }

    #[tokio::test]
    async fn test_failed_closing_wakeup_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        let agent = Arc::new(FakeAgent::failing("claude CLI exited with 1: boom"));
        let mut daemon = Daemon::with_agent(test_config(&tmp), agent.clone());

        daemon.ordinary_wakeup().await;
        daemon.last_wakeup().await;

        assert!(daemon.cycle.session().is_some());
        assert!(!tmp.path().join("nights").exists());
    }
}
