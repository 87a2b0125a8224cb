use std::{fs::read_to_string, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    task::JoinSet,
};

use crate::{
    core::{
        gallery::GalleryStore,
        roster::RosterStore,
        round::{run_round_actor, RoundActor, RoundController},
        settings::Settings,
    },
    error::Error,
    integrations::telegram::{TelegramClient, TelegramSink},
};

mod cmd;
mod core;
mod error;
mod integrations;
mod web;

#[derive(Parser, Debug)]
#[command(name = "AutoRaffle")]
#[command(version = "0.1")]
#[command(about = "A Telegram group raffle bot: fill a list of names, then draw a winner.", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: RunType,
}

#[derive(Subcommand, Debug)]
enum RunType {
    /// Run the bot from a settings file.
    Run {
        /// Location of the Json settings file.
        /// DO NOT SHARE THIS FILE, it contains the private token for your bot.
        settings_file: PathBuf,
    },

    /// Validate a settings file and its bot token without starting the bot.
    Check { settings_file: PathBuf },
}

/// A return channel for actor requests.
pub struct Rto<T> {
    tx: oneshot::Sender<anyhow::Result<T>>,
}

impl<T> Rto<T> {
    pub fn new() -> (Rto<T>, oneshot::Receiver<anyhow::Result<T>>) {
        let (tx, rx) = oneshot::channel();
        (Rto { tx }, rx)
    }

    /// Reply to the requester. A dropped requester is logged, not fatal.
    pub fn reply(self, message: anyhow::Result<T>) {
        if self.tx.send(message).is_err() {
            log::warn!("Failed to reply to a request, the requester is gone");
        }
    }
}

/// A handle for sending requests to an actor's channel.
pub struct ActorRef<T> {
    tx: UnboundedSender<T>,
}

impl<T> ActorRef<T> {
    pub fn new() -> (ActorRef<T>, UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ActorRef { tx }, rx)
    }

    pub fn send(&self, message: T) {
        if self.tx.send(message).is_err() {
            log::warn!("Failed to send a request, the actor is gone");
        }
    }
}

impl<T> Clone for ActorRef<T> {
    fn clone(&self) -> Self {
        ActorRef {
            tx: self.tx.clone(),
        }
    }
}

/// Send a request to an actor and await its reply.
#[macro_export]
macro_rules! send_message {
    ($actor:expr, $type:ident, $message:ident) => {{
        let (rto, rx) = $crate::Rto::new();
        $actor.send($type::$message(rto));
        match rx.await {
            Ok(resp) => resp,
            Err(_) => Err(anyhow::anyhow!("Actor did not respond")),
        }
    }};
    ($actor:expr, $type:ident, $message:ident, $($params:expr),*) => {{
        let (rto, rx) = $crate::Rto::new();
        $actor.send($type::$message($($params),*, rto));
        match rx.await {
            Ok(resp) => resp,
            Err(_) => Err(anyhow::anyhow!("Actor did not respond")),
        }
    }};
}

/// Cross-component handles for the service's actors.
#[derive(Clone)]
pub struct Directory {
    pub round_actor: RoundActor,
}

fn load_settings(path: &PathBuf) -> Result<Settings, Error> {
    let settings = serde_json::from_str::<Settings>(&read_to_string(path)?)?;
    settings.validate()?;
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        RunType::Check { settings_file } => {
            let settings = load_settings(&settings_file)?;
            let client = TelegramClient::new(&settings.telegram_token)?;

            let me = client.get_me().await?;
            println!("Settings are valid, token belongs to bot '{}'.", me);

            Ok(())
        }
        RunType::Run { settings_file } => {
            let settings = Arc::new(load_settings(&settings_file)?);

            let client = Arc::new(TelegramClient::new(&settings.telegram_token)?);
            let sink = Arc::new(TelegramSink::new(
                client.clone(),
                settings.group_chat_id.clone(),
            ));

            let roster = Arc::new(RosterStore::new(settings.capacity));
            let gallery = Arc::new(GalleryStore::new());
            let controller = Arc::new(RoundController::new(roster, gallery, sink, &settings));

            let (round_actor, round_rx) = ActorRef::new();
            let directory = Directory { round_actor };

            log::info!(
                "AutoRaffle initialized, running a {}-name raffle",
                settings.capacity
            );

            let mut tasks: JoinSet<Result<(), anyhow::Error>> = JoinSet::new();
            tasks.spawn(run_round_actor(controller, round_rx));
            integrations::init_integrations(
                &mut tasks,
                settings.clone(),
                client,
                directory.clone(),
            );

            while let Some(result) = tasks.join_next().await {
                result??;
            }

            Ok(())
        }
    }
}
