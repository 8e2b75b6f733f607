use clap::Parser;
use log::error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use de_vote::app::App;
use de_vote::cli::{event_handler, terminal_handler, Args, Commands, Message, Msg};
use de_vote::config::NetworkConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = NetworkConfig::from_env()?;

    let (messages_tx, messages_rx) = mpsc::channel::<Msg>(100);
    let (cli_tx, mut cli_rx) = mpsc::channel::<Commands>(100);
    let token = CancellationToken::new();

    let mut app = App::new(config, messages_tx.clone());
    if let Some(private_key) = args.private_key {
        if let Err(err) = app.handle_command(Commands::Login { private_key }).await {
            error!("Startup sign-in failed: {err}");
        }
    }

    let mut terminal_task = tokio::spawn(terminal_handler(messages_rx, token.clone()));
    let mut event_task = tokio::spawn(event_handler(messages_tx.clone(), cli_tx, token.clone()));

    let dispatch_token = token.clone();
    let dispatch_tx = messages_tx.clone();
    let mut dispatch_task = tokio::spawn(async move {
        while let Some(command) = cli_rx.recv().await {
            if let Commands::Exit = command {
                dispatch_token.cancel();
                let _ = dispatch_tx.send(Msg::Exit).await;
                break;
            }
            if let Err(err) = app.handle_command(command).await {
                error!("Command failed: {err}");
                let _ = dispatch_tx
                    .send(Msg::Input(Message::Error(err.to_string())))
                    .await;
            }
        }
    });

    tokio::select! {
        res = (&mut terminal_task) => {
            event_task.abort();
            dispatch_task.abort();
            res??;
        }
        res = (&mut event_task) => {
            dispatch_task.abort();
            // let the terminal drain the exit message and restore the screen
            let _ = terminal_task.await;
            res??;
        }
    }

    Ok(())
}
