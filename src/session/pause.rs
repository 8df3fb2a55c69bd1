//! Per-session run/pause state machine.
//!
//! ```text
//! Running --approval request--> Paused(tool-approval)
//! Running --user interrupt----> Paused(interrupted)
//! Running --input request-----> Paused(waiting-input)
//! Running | Paused --failure--> Paused(error) | Terminated (fatal)
//! Paused --resume-------------> Running
//! Paused(tool-approval) --approve | deny--> Running
//! Terminated is absorbing.
//! ```

use std::fmt;

use thiserror::Error;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseKind {
    None,
    Interrupted,
    WaitingInput,
    ToolApproval,
    Error,
}

impl PauseKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Interrupted => "interrupted",
            Self::WaitingInput => "waiting-input",
            Self::ToolApproval => "tool-approval",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused(PauseKind),
    Terminated,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("running"),
            Self::Paused(kind) => write!(f, "paused ({})", kind.label()),
            Self::Terminated => f.write_str("terminated"),
        }
    }
}

/// What asked for a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseTrigger {
    ToolApproval,
    UserInterrupt,
    InputRequested,
    Failure { fatal: bool },
    Resume,
    /// Answer to a tool-approval pause.
    Confirm { approved: bool },
}

impl fmt::Display for PauseTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ToolApproval => "request tool approval",
            Self::UserInterrupt => "interrupt",
            Self::InputRequested => "wait for input",
            Self::Failure { fatal: false } => "record a failure",
            Self::Failure { fatal: true } => "terminate",
            Self::Resume => "resume",
            Self::Confirm { approved: true } => "approve a tool call",
            Self::Confirm { approved: false } => "deny a tool call",
        })
    }
}

/// Why a session is not running. Replaced wholesale on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseInfo {
    pub kind: PauseKind,
    pub reason: Option<String>,
    /// Extra context for the user, e.g. the command a tool wants to run.
    pub details: Option<String>,
    pub since: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {attempted} while {from}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub attempted: PauseTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RunState,
    pub to: RunState,
}

/// Label shown in pane headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Interrupted,
    Paused,
    Error,
    Terminated,
}

impl SessionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Interrupted => "interrupted",
            Self::Paused => "paused",
            Self::Error => "error",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PauseController {
    state: RunState,
    info: PauseInfo,
}

impl Default for PauseController {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseController {
    pub fn new() -> Self {
        Self {
            state: RunState::Running,
            info: PauseInfo {
                kind: PauseKind::None,
                reason: None,
                details: None,
                since: OffsetDateTime::now_utc(),
            },
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn info(&self) -> &PauseInfo {
        &self.info
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, RunState::Paused(_))
    }

    pub fn is_terminated(&self) -> bool {
        self.state == RunState::Terminated
    }

    pub fn status(&self, streaming: bool) -> SessionStatus {
        match self.state {
            RunState::Running if streaming => SessionStatus::Running,
            RunState::Running => SessionStatus::Idle,
            RunState::Paused(PauseKind::Interrupted) => SessionStatus::Interrupted,
            RunState::Paused(PauseKind::Error) => SessionStatus::Error,
            RunState::Paused(_) => SessionStatus::Paused,
            RunState::Terminated => SessionStatus::Terminated,
        }
    }

    pub fn interrupt(&mut self, reason: Option<String>) -> Result<Transition, InvalidTransition> {
        self.apply(PauseTrigger::UserInterrupt, reason, OffsetDateTime::now_utc())
    }

    pub fn resume(&mut self) -> Result<Transition, InvalidTransition> {
        self.apply(PauseTrigger::Resume, None, OffsetDateTime::now_utc())
    }

    /// Answers a tool-approval pause. Either answer lets the session run again.
    pub fn confirm(&mut self, approved: bool) -> Result<Transition, InvalidTransition> {
        self.apply(
            PauseTrigger::Confirm { approved },
            None,
            OffsetDateTime::now_utc(),
        )
    }

    /// Applies `trigger` at time `at`, or leaves everything unchanged when the
    /// current state does not allow it.
    pub fn apply(
        &mut self,
        trigger: PauseTrigger,
        reason: Option<String>,
        at: OffsetDateTime,
    ) -> Result<Transition, InvalidTransition> {
        self.apply_with_details(trigger, reason, None, at)
    }

    pub fn apply_with_details(
        &mut self,
        trigger: PauseTrigger,
        reason: Option<String>,
        details: Option<String>,
        at: OffsetDateTime,
    ) -> Result<Transition, InvalidTransition> {
        let from = self.state;
        let invalid = InvalidTransition {
            from,
            attempted: trigger,
        };

        let to = match (from, trigger) {
            (RunState::Terminated, _) => return Err(invalid),
            (RunState::Running, PauseTrigger::ToolApproval) => {
                RunState::Paused(PauseKind::ToolApproval)
            }
            (RunState::Running, PauseTrigger::UserInterrupt) => {
                RunState::Paused(PauseKind::Interrupted)
            }
            (RunState::Running, PauseTrigger::InputRequested) => {
                RunState::Paused(PauseKind::WaitingInput)
            }
            (_, PauseTrigger::Failure { fatal: true }) => RunState::Terminated,
            (_, PauseTrigger::Failure { fatal: false }) => RunState::Paused(PauseKind::Error),
            (RunState::Paused(_), PauseTrigger::Resume) => RunState::Running,
            (RunState::Paused(PauseKind::ToolApproval), PauseTrigger::Confirm { .. }) => {
                RunState::Running
            }
            _ => return Err(invalid),
        };

        let kind = match to {
            RunState::Running => PauseKind::None,
            RunState::Paused(kind) => kind,
            RunState::Terminated => PauseKind::Error,
        };
        self.state = to;
        self.info = PauseInfo {
            kind,
            reason,
            details,
            since: at,
        };
        Ok(Transition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const T0: OffsetDateTime = datetime!(2026-05-01 12:00:00 UTC);

    fn apply(controller: &mut PauseController, trigger: PauseTrigger) -> Result<Transition, InvalidTransition> {
        controller.apply(trigger, Some("why".to_string()), T0)
    }

    #[test]
    fn running_pauses_for_each_request_kind() {
        for (trigger, kind) in [
            (PauseTrigger::ToolApproval, PauseKind::ToolApproval),
            (PauseTrigger::UserInterrupt, PauseKind::Interrupted),
            (PauseTrigger::InputRequested, PauseKind::WaitingInput),
            (PauseTrigger::Failure { fatal: false }, PauseKind::Error),
        ] {
            let mut controller = PauseController::new();
            let transition = apply(&mut controller, trigger).expect("transition from running");
            assert_eq!(transition.from, RunState::Running);
            assert_eq!(transition.to, RunState::Paused(kind));
            assert_eq!(controller.info().kind, kind);
            assert_eq!(controller.info().reason.as_deref(), Some("why"));
            assert_eq!(controller.info().since, T0);
        }
    }

    #[test]
    fn resume_returns_to_running_and_clears_info() {
        let mut controller = PauseController::new();
        apply(&mut controller, PauseTrigger::ToolApproval).expect("pause");
        let transition = controller.resume().expect("resume");
        assert_eq!(transition.to, RunState::Running);
        assert_eq!(controller.info().kind, PauseKind::None);
        assert_eq!(controller.info().reason, None);
    }

    #[test]
    fn invalid_transitions_leave_state_unchanged() {
        let mut controller = PauseController::new();
        assert_eq!(
            controller.resume(),
            Err(InvalidTransition {
                from: RunState::Running,
                attempted: PauseTrigger::Resume
            })
        );

        apply(&mut controller, PauseTrigger::UserInterrupt).expect("interrupt");
        let before = controller.clone();
        assert!(apply(&mut controller, PauseTrigger::UserInterrupt).is_err());
        assert!(apply(&mut controller, PauseTrigger::ToolApproval).is_err());
        assert_eq!(controller, before);
    }

    #[test]
    fn recoverable_failure_applies_while_paused() {
        let mut controller = PauseController::new();
        apply(&mut controller, PauseTrigger::InputRequested).expect("wait");
        let transition =
            apply(&mut controller, PauseTrigger::Failure { fatal: false }).expect("fail");
        assert_eq!(transition.to, RunState::Paused(PauseKind::Error));
    }

    #[test]
    fn terminated_is_absorbing() {
        let mut controller = PauseController::new();
        apply(&mut controller, PauseTrigger::Failure { fatal: true }).expect("terminate");
        assert!(controller.is_terminated());

        for trigger in [
            PauseTrigger::Resume,
            PauseTrigger::UserInterrupt,
            PauseTrigger::ToolApproval,
            PauseTrigger::InputRequested,
            PauseTrigger::Failure { fatal: false },
            PauseTrigger::Failure { fatal: true },
        ] {
            let err = apply(&mut controller, trigger).expect_err("terminated rejects everything");
            assert_eq!(err.from, RunState::Terminated);
        }
        assert_eq!(controller.state(), RunState::Terminated);
    }

    #[test]
    fn status_labels_follow_state_and_streaming() {
        let mut controller = PauseController::new();
        assert_eq!(controller.status(false), SessionStatus::Idle);
        assert_eq!(controller.status(true), SessionStatus::Running);
        apply(&mut controller, PauseTrigger::UserInterrupt).expect("interrupt");
        assert_eq!(controller.status(true).label(), "interrupted");
        controller.resume().expect("resume");
        apply(&mut controller, PauseTrigger::ToolApproval).expect("approval");
        assert_eq!(controller.status(false).label(), "paused");
    }

    #[test]
    fn approval_pause_keeps_details_and_accepts_either_answer() {
        for approved in [true, false] {
            let mut controller = PauseController::new();
            controller
                .apply_with_details(
                    PauseTrigger::ToolApproval,
                    Some("bash: run tests".to_string()),
                    Some("cargo test --all".to_string()),
                    T0,
                )
                .expect("approval request");
            assert_eq!(controller.info().details.as_deref(), Some("cargo test --all"));

            let transition = controller.confirm(approved).expect("answer");
            assert_eq!(transition.from, RunState::Paused(PauseKind::ToolApproval));
            assert_eq!(transition.to, RunState::Running);
            assert_eq!(controller.info().details, None);
        }
    }

    #[test]
    fn confirm_outside_an_approval_pause_is_rejected() {
        let mut controller = PauseController::new();
        assert_eq!(
            controller.confirm(true),
            Err(InvalidTransition {
                from: RunState::Running,
                attempted: PauseTrigger::Confirm { approved: true }
            })
        );

        apply(&mut controller, PauseTrigger::InputRequested).expect("wait");
        let before = controller.clone();
        let err = controller.confirm(false).expect_err("not an approval pause");
        assert_eq!(err.to_string(), "cannot deny a tool call while paused (waiting-input)");
        assert_eq!(controller, before);
    }

    #[test]
    fn invalid_transition_message_names_both_sides() {
        let err = InvalidTransition {
            from: RunState::Paused(PauseKind::Interrupted),
            attempted: PauseTrigger::UserInterrupt,
        };
        assert_eq!(err.to_string(), "cannot interrupt while paused (interrupted)");
    }
}
