//! Voting panel state and runtime.
//!
//! The panel owns the candidate snapshot and one request state per mutating
//! action. Every lifecycle is the same: mark the action in flight, run the
//! contract call on its own task, and on settlement re-enable the control
//! and re-query the candidate list, whether the call succeeded or not.
//!
//! # Request states
//!
//! ```text
//! Idle -- begin_*() --> InFlight -- settle_*(Ok) --> Idle
//!                       InFlight -- settle_*(Err) --> Failed
//! ```
//!
//! A `begin_*` while the same action is already `InFlight` is dropped, not
//! queued. The snapshot is only ever replaced wholesale with a query result.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use log::{debug, error};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use sc_voting::{Candidate, VotingError, VotingService};

use crate::AppError;

/// Lifecycle of one user-triggered contract call.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestState {
    /// No call outstanding, the control is enabled
    #[default]
    Idle,
    /// A call is outstanding, the control is disabled
    InFlight,
    /// The last call failed, the control is enabled again
    Failed(String),
}

impl RequestState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, RequestState::InFlight)
    }
}

impl Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestState::Idle => write!(f, "Idle"),
            RequestState::InFlight => write!(f, "InFlight"),
            RequestState::Failed(reason) => write!(f, "Failed: {reason}"),
        }
    }
}

/// Commands the UI sends to the panel runtime.
#[derive(Debug, Clone)]
pub enum PanelCmd {
    /// First render after sign-in; loads the candidate list once.
    Activate,
    Nominate {
        candidate_id: String,
        metadata: Option<HashMap<String, String>>,
    },
    Vote {
        candidate_id: String,
    },
    /// Re-query the candidate list on demand.
    Refresh,
}

/// What the panel reports back to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// Fresh snapshot of the candidate list, to be rendered verbatim
    Candidates(Vec<Candidate>),
    /// Nominate control state changed
    Nominate(RequestState),
    /// Vote control state changed
    Vote(RequestState),
    /// A failure the user has to acknowledge
    Alert(String),
}

/// Panel state proper. All transitions live here so they can be tested
/// without a runtime.
#[derive(Debug, Default)]
pub struct VotingPanel {
    candidates: Vec<Candidate>,
    activated: bool,
    loaded: bool,
    nominate: RequestState,
    vote: RequestState,
}

impl VotingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn nominate_state(&self) -> &RequestState {
        &self.nominate
    }

    pub fn vote_state(&self) -> &RequestState {
        &self.vote
    }

    /// First activation wins; later calls are no-ops so the initial load
    /// runs exactly once per sign-in session.
    pub fn activate(&mut self) -> bool {
        if self.activated {
            return false;
        }
        self.activated = true;
        true
    }

    /// Claim the nominate control. Returns false while a nomination is
    /// already outstanding.
    pub fn begin_nominate(&mut self) -> bool {
        if self.nominate.is_in_flight() {
            return false;
        }
        self.nominate = RequestState::InFlight;
        true
    }

    /// Claim the vote control. Returns false while a vote is already
    /// outstanding.
    pub fn begin_vote(&mut self) -> bool {
        if self.vote.is_in_flight() {
            return false;
        }
        self.vote = RequestState::InFlight;
        true
    }

    /// Settle the nomination; the control is enabled again either way.
    /// Returns the message to surface when the call failed.
    pub fn settle_nominate(&mut self, result: &Result<(), VotingError>) -> Option<String> {
        self.nominate = Self::settled_state(result);
        Self::failure_message(result)
    }

    /// Settle the vote; same contract as [`VotingPanel::settle_nominate`].
    pub fn settle_vote(&mut self, result: &Result<(), VotingError>) -> Option<String> {
        self.vote = Self::settled_state(result);
        Self::failure_message(result)
    }

    /// Replace the snapshot with the latest query result.
    pub fn apply_snapshot(&mut self, candidates: Vec<Candidate>) {
        self.candidates = candidates;
        self.loaded = true;
    }

    /// A failed initial load is surfaced to the user; a failed refresh after
    /// a mutation is not, the stale snapshot simply stays up.
    pub fn record_query_failure(&mut self, err: &VotingError) -> Option<String> {
        if self.loaded {
            None
        } else {
            Some(err.to_string())
        }
    }

    fn settled_state(result: &Result<(), VotingError>) -> RequestState {
        match result {
            Ok(()) => RequestState::Idle,
            Err(err) => RequestState::Failed(err.to_string()),
        }
    }

    fn failure_message(result: &Result<(), VotingError>) -> Option<String> {
        result.as_ref().err().map(|err| err.to_string())
    }
}

enum Settled {
    Query(Result<Vec<Candidate>, VotingError>),
    Nominate(Result<(), VotingError>),
    Vote(Result<(), VotingError>),
}

/// Handle to a running panel. Dropping it stops the runtime; calls already
/// issued still run to completion, their settlements are discarded.
#[derive(Debug)]
pub struct PanelHandle {
    cmd_tx: UnboundedSender<PanelCmd>,
}

impl PanelHandle {
    pub fn send(&self, cmd: PanelCmd) -> Result<(), AppError> {
        self.cmd_tx.send(cmd).map_err(|_| AppError::PanelClosed)
    }
}

/// Spawn the panel runtime for one sign-in session.
///
/// `events` carries [`PanelEvent`]s back to whoever renders the panel.
pub fn spawn_panel<S>(
    service: S,
    account_id: String,
    events: UnboundedSender<PanelEvent>,
) -> PanelHandle
where
    S: VotingService + Send + Sync + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_panel(service, account_id, cmd_rx, events));
    PanelHandle { cmd_tx }
}

async fn run_panel<S>(
    service: S,
    account_id: String,
    mut commands: UnboundedReceiver<PanelCmd>,
    events: UnboundedSender<PanelEvent>,
) where
    S: VotingService + Send + Sync + 'static,
{
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();
    let mut runtime = PanelRuntime {
        service: Arc::new(service),
        account_id,
        panel: VotingPanel::new(),
        settled_tx,
        events,
    };

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                let Some(cmd) = cmd else { break };
                runtime.handle_command(cmd);
            }
            settled = settled_rx.recv() => {
                let Some(settled) = settled else { break };
                runtime.handle_settled(settled);
            }
        }
    }
    debug!("Voting panel for {} stopped", runtime.account_id);
}

struct PanelRuntime<S> {
    service: Arc<S>,
    account_id: String,
    panel: VotingPanel,
    settled_tx: UnboundedSender<Settled>,
    events: UnboundedSender<PanelEvent>,
}

impl<S> PanelRuntime<S>
where
    S: VotingService + Send + Sync + 'static,
{
    fn handle_command(&mut self, cmd: PanelCmd) {
        match cmd {
            PanelCmd::Activate => {
                if self.panel.activate() {
                    self.issue_query();
                } else {
                    debug!("Panel already activated, skipping reload");
                }
            }
            PanelCmd::Nominate {
                candidate_id,
                metadata,
            } => {
                if !self.panel.begin_nominate() {
                    debug!("Nomination of {candidate_id} dropped, another one is in flight");
                    return;
                }
                self.emit(PanelEvent::Nominate(RequestState::InFlight));
                let service = Arc::clone(&self.service);
                let settled_tx = self.settled_tx.clone();
                tokio::spawn(async move {
                    let res = service.add_candidate(&candidate_id, metadata).await;
                    let _ = settled_tx.send(Settled::Nominate(res));
                });
            }
            PanelCmd::Vote { candidate_id } => {
                if !self.panel.begin_vote() {
                    debug!("Vote for {candidate_id} dropped, another one is in flight");
                    return;
                }
                self.emit(PanelEvent::Vote(RequestState::InFlight));
                let service = Arc::clone(&self.service);
                let settled_tx = self.settled_tx.clone();
                tokio::spawn(async move {
                    let res = service.vote(&candidate_id).await;
                    let _ = settled_tx.send(Settled::Vote(res));
                });
            }
            PanelCmd::Refresh => self.issue_query(),
        }
    }

    fn handle_settled(&mut self, settled: Settled) {
        match settled {
            Settled::Query(Ok(candidates)) => {
                self.panel.apply_snapshot(candidates.clone());
                self.emit(PanelEvent::Candidates(candidates));
            }
            Settled::Query(Err(err)) => match self.panel.record_query_failure(&err) {
                Some(message) => self.emit(PanelEvent::Alert(message)),
                None => error!("Candidate refresh failed: {err}"),
            },
            Settled::Nominate(result) => {
                let alert = self.panel.settle_nominate(&result);
                self.emit(PanelEvent::Nominate(self.panel.nominate_state().clone()));
                if let Some(message) = alert {
                    self.emit(PanelEvent::Alert(message));
                }
                self.issue_query();
            }
            Settled::Vote(result) => {
                let alert = self.panel.settle_vote(&result);
                self.emit(PanelEvent::Vote(self.panel.vote_state().clone()));
                if let Some(message) = alert {
                    self.emit(PanelEvent::Alert(message));
                }
                self.issue_query();
            }
        }
    }

    fn issue_query(&self) {
        let service = Arc::clone(&self.service);
        let account_id = self.account_id.clone();
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let res = service.view_candidates(&account_id).await;
            let _ = settled_tx.send(Settled::Query(res));
        });
    }

    fn emit(&self, event: PanelEvent) {
        let _ = self.events.send(event);
    }
}
