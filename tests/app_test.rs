use std::time::Duration;

use tokio::sync::mpsc::{self, Receiver};
use tokio::time::timeout;

use de_vote::app::App;
use de_vote::cli::{Commands, Message, Msg};
use de_vote::config::{Network, NetworkConfig};
use sc_voting::Candidate;

// anvil default key 0
const ALICE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ALICE_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

fn dev_config() -> NetworkConfig {
    NetworkConfig {
        network: Network::Development,
        rpc_url: "http://localhost:8545".parse().unwrap(),
        contract_address: None,
    }
}

fn dev_app() -> (App, Receiver<Msg>) {
    let (messages_tx, messages_rx) = mpsc::channel(100);
    (App::new(dev_config(), messages_tx), messages_rx)
}

async fn next_msg(messages: &mut Receiver<Msg>) -> Msg {
    timeout(Duration::from_secs(5), messages.recv())
        .await
        .expect("timed out waiting for a terminal message")
        .expect("terminal channel closed")
}

async fn wait_for_candidates(messages: &mut Receiver<Msg>) -> Vec<Candidate> {
    loop {
        if let Msg::Candidates(candidates) = next_msg(messages).await {
            return candidates;
        }
    }
}

#[tokio::test]
async fn commands_require_a_session() {
    let (mut app, mut messages) = dev_app();

    app.handle_command(Commands::Vote {
        candidate_id: "bob".to_string(),
    })
    .await
    .unwrap();

    match next_msg(&mut messages).await {
        Msg::Input(Message::System(text)) => assert!(text.contains("Sign in")),
        _ => panic!("expected a system message"),
    }
    // nothing else happens while signed out
    assert!(
        timeout(Duration::from_millis(200), messages.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn login_opens_the_session_and_loads_candidates() {
    let (mut app, mut messages) = dev_app();

    app.handle_command(Commands::Login {
        private_key: ALICE_KEY.to_string(),
    })
    .await
    .unwrap();

    // the panel loads concurrently, the session and snapshot messages can
    // arrive in either order
    let mut session = None;
    let mut candidates = None;
    while session.is_none() || candidates.is_none() {
        match next_msg(&mut messages).await {
            Msg::Session(s) => session = Some(s),
            Msg::Candidates(c) => candidates = Some(c),
            _ => {}
        }
    }
    assert_eq!(session.unwrap().as_deref(), Some(ALICE_ADDRESS));
    assert_eq!(candidates.unwrap(), vec![]);
}

#[tokio::test]
async fn bad_key_is_reported_and_keeps_the_gate_closed() {
    let (mut app, mut messages) = dev_app();

    app.handle_command(Commands::Login {
        private_key: "not-a-key".to_string(),
    })
    .await
    .unwrap();

    match next_msg(&mut messages).await {
        Msg::Input(Message::Error(text)) => assert!(text.contains("Sign-in failed")),
        _ => panic!("expected a sign-in error"),
    }
    assert!(
        timeout(Duration::from_millis(200), messages.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn nominate_and_vote_flow() {
    let (mut app, mut messages) = dev_app();

    app.handle_command(Commands::Login {
        private_key: ALICE_KEY.to_string(),
    })
    .await
    .unwrap();
    wait_for_candidates(&mut messages).await;

    app.handle_command(Commands::Nominate {
        candidate_id: "carol".to_string(),
        metadata: None,
    })
    .await
    .unwrap();

    let candidates = wait_for_candidates(&mut messages).await;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].candidate_id, "carol");
    assert_eq!(candidates[0].votes, 0);

    app.handle_command(Commands::Vote {
        candidate_id: "carol".to_string(),
    })
    .await
    .unwrap();

    let candidates = wait_for_candidates(&mut messages).await;
    assert_eq!(candidates[0].votes, 1);
}

#[tokio::test]
async fn invalid_metadata_is_rejected_before_the_contract_call() {
    let (mut app, mut messages) = dev_app();

    app.handle_command(Commands::Login {
        private_key: ALICE_KEY.to_string(),
    })
    .await
    .unwrap();
    wait_for_candidates(&mut messages).await;

    let res = app
        .handle_command(Commands::Nominate {
            candidate_id: "carol".to_string(),
            metadata: Some("{not json".to_string()),
        })
        .await;
    assert!(res.is_err());
}

#[tokio::test]
async fn logout_closes_the_session() {
    let (mut app, mut messages) = dev_app();

    app.handle_command(Commands::Login {
        private_key: ALICE_KEY.to_string(),
    })
    .await
    .unwrap();
    wait_for_candidates(&mut messages).await;

    app.handle_command(Commands::Logout).await.unwrap();
    loop {
        if let Msg::Session(None) = next_msg(&mut messages).await {
            break;
        }
    }

    // signing in again starts a fresh panel with a fresh initial load
    app.handle_command(Commands::Login {
        private_key: ALICE_KEY.to_string(),
    })
    .await
    .unwrap();
    assert_eq!(wait_for_candidates(&mut messages).await, vec![]);
}
