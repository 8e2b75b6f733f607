use alloy::network::EthereumWallet;
use alloy::providers::ProviderBuilder;
use log::{error, info};
use tokio::sync::mpsc::{self, Sender, UnboundedReceiver, UnboundedSender};

use sc_voting::local_voting::LocalVotingService;
use sc_voting::sc_voting::ScVotingService;

use crate::cli::{Commands, Message, Msg};
use crate::config::{Network, NetworkConfig};
use crate::panel::{spawn_panel, PanelCmd, PanelEvent, PanelHandle};
use crate::session::WalletSession;
use crate::AppError;

/// Dispatches parsed commands to the wallet session and the voting panel.
///
/// The panel only exists while a session is active; signing out drops it,
/// and the next sign-in starts a fresh one with a fresh initial load.
pub struct App {
    config: NetworkConfig,
    session: WalletSession,
    panel: Option<PanelHandle>,
    messages_tx: Sender<Msg>,
}

impl App {
    pub fn new(config: NetworkConfig, messages_tx: Sender<Msg>) -> Self {
        Self {
            config,
            session: WalletSession::new(),
            panel: None,
            messages_tx,
        }
    }

    pub async fn handle_command(&mut self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Login { private_key } => self.login(private_key).await,
            Commands::Logout => self.logout().await,
            Commands::Nominate {
                candidate_id,
                metadata,
            } => self.nominate(candidate_id, metadata).await,
            Commands::Vote { candidate_id } => self.vote(candidate_id).await,
            Commands::Refresh => self.refresh().await,
            // handled by the caller, nothing to do here
            Commands::Exit => Ok(()),
        }
    }

    async fn login(&mut self, private_key: String) -> Result<(), AppError> {
        if self.session.is_signed_in() {
            self.system("A wallet session is already active, sign out first")
                .await;
            return Ok(());
        }
        let account_id = match self.session.login(&private_key) {
            Ok(account_id) => account_id,
            Err(err) => {
                self.report_error(format!("Sign-in failed: {err}")).await;
                return Ok(());
            }
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let panel = self.spawn_panel_for(&account_id, events_tx)?;
        tokio::spawn(forward_panel_events(events_rx, self.messages_tx.clone()));

        // initial load, once per sign-in session
        panel.send(PanelCmd::Activate)?;
        self.panel = Some(panel);

        self.send(Msg::Session(Some(account_id.clone()))).await;
        self.system(format!("Signed in as {account_id}")).await;
        Ok(())
    }

    async fn logout(&mut self) -> Result<(), AppError> {
        if !self.session.is_signed_in() {
            self.system("No wallet session is active").await;
            return Ok(());
        }
        // dropping the handle stops the panel runtime
        self.panel = None;
        self.session.logout();
        self.send(Msg::Session(None)).await;
        self.system("Signed out").await;
        Ok(())
    }

    async fn nominate(
        &mut self,
        candidate_id: String,
        metadata: Option<String>,
    ) -> Result<(), AppError> {
        let metadata = metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        match &self.panel {
            Some(panel) => panel.send(PanelCmd::Nominate {
                candidate_id,
                metadata,
            })?,
            None => self.system("Sign in before nominating").await,
        }
        Ok(())
    }

    async fn vote(&mut self, candidate_id: String) -> Result<(), AppError> {
        match &self.panel {
            Some(panel) => panel.send(PanelCmd::Vote { candidate_id })?,
            None => self.system("Sign in before voting").await,
        }
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), AppError> {
        match &self.panel {
            Some(panel) => panel.send(PanelCmd::Refresh)?,
            None => self.system("Sign in to see the candidates").await,
        }
        Ok(())
    }

    fn spawn_panel_for(
        &self,
        account_id: &str,
        events: UnboundedSender<PanelEvent>,
    ) -> Result<PanelHandle, AppError> {
        match self.config.network {
            Network::Development => {
                info!("Using the in-process voting book on {}", self.config.network);
                Ok(spawn_panel(
                    LocalVotingService::new(account_id),
                    account_id.to_string(),
                    events,
                ))
            }
            _ => {
                let signer = self.session.signer()?;
                let address = self
                    .config
                    .contract_address
                    .ok_or(AppError::MissingContractAddress)?;
                info!(
                    "Using the voting contract at {address} on {}",
                    self.config.network
                );
                let wallet = EthereumWallet::from(signer);
                let provider = ProviderBuilder::new()
                    .with_recommended_fillers()
                    .wallet(wallet)
                    .on_http(self.config.rpc_url.clone());
                Ok(spawn_panel(
                    ScVotingService::new(provider, address),
                    account_id.to_string(),
                    events,
                ))
            }
        }
    }

    async fn send(&self, msg: Msg) {
        if self.messages_tx.send(msg).await.is_err() {
            error!("Terminal channel closed, dropping message");
        }
    }

    async fn system(&self, text: impl Into<String>) {
        self.send(Msg::Input(Message::System(text.into()))).await;
    }

    async fn report_error(&self, text: impl Into<String>) {
        self.send(Msg::Input(Message::Error(text.into()))).await;
    }
}

/// Translate panel events into terminal messages. Failures show up twice on
/// purpose: as a popup to acknowledge and as a red line in the history.
async fn forward_panel_events(mut events: UnboundedReceiver<PanelEvent>, messages_tx: Sender<Msg>) {
    while let Some(event) = events.recv().await {
        let msgs = match event {
            PanelEvent::Candidates(candidates) => vec![Msg::Candidates(candidates)],
            PanelEvent::Nominate(state) => vec![Msg::NominatePending(state.is_in_flight())],
            PanelEvent::Vote(state) => vec![Msg::VotePending(state.is_in_flight())],
            PanelEvent::Alert(text) => vec![
                Msg::Input(Message::Error(text.clone())),
                Msg::Alert(text),
            ],
        };
        for msg in msgs {
            if messages_tx.send(msg).await.is_err() {
                return;
            }
        }
    }
}
