use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    cmd::Intent,
    core::{
        draw::{self, DrawResult},
        gallery::{self, GalleryItem, GalleryStore},
        roster::{Phase, RosterEntry, RosterStore},
        settings::Settings,
    },
    error::Error,
    ActorRef, Rto,
};

/// The fixed rules/help response for unrecognized messages.
pub const RULES: &str = "Please check the group description or the pinned message for the rules.\n\
If you need further assistance, please DM the admin.";

/// Reply to the Telegram /start command.
pub const GREETING: &str = "Hello! I'm your bot. Type .add <name> to participate.";

/// Delivery contract for group announcements.
///
/// The controller treats a failed delivery as non-fatal to its own state
/// and never retries; retry policy, if any, belongs to the sink.
pub trait NotificationSink: Send + Sync {
    /// Deliver a text message, plus any attached media references, to the
    /// group destination.
    fn deliver(&self, text: String, media: Vec<String>) -> BoxFuture<'_, Result<(), Error>>;
}

/// The externally observable result of one handled intent.
#[derive(Debug)]
pub enum Outcome {
    Added { name: String, position: usize },
    Removed { name: String },
    Listed { count: usize },
    Drawn { winner: String, delivered: bool },
    WasReset,
    PrizeAdded { index: usize },
    PrizeRemoved { index: usize },
    PrizesListed { count: usize },
    Greeted,
    Help,
    /// Post-win muting swallowed the message, nothing ran.
    Suppressed,
    Rejected(Error),
}

/// Sequences the roster, gallery, and draw engine into the operations the
/// transports expose, and carries the draw -> announce -> reset cycle.
///
/// Store mutation is serialized by the store locks; the sink is only ever
/// called outside them, on snapshots captured beforehand.
pub struct RoundController {
    roster: Arc<RosterStore>,
    gallery: Arc<GalleryStore>,
    sink: Arc<dyn NotificationSink>,
    auto_clear_gallery: bool,
    suppress_winner: bool,
    /// Identity whose next message is swallowed. Kept here rather than in
    /// the roster because the post-draw reset wipes the roster's winner
    /// record before the winner's reply can arrive.
    muted: Mutex<Option<String>>,
}

impl RoundController {
    pub fn new(
        roster: Arc<RosterStore>,
        gallery: Arc<GalleryStore>,
        sink: Arc<dyn NotificationSink>,
        settings: &Settings,
    ) -> RoundController {
        RoundController {
            roster,
            gallery,
            sink,
            auto_clear_gallery: settings.auto_clear_gallery_on_draw,
            suppress_winner: settings.suppress_winner_next_message,
            muted: Mutex::new(None),
        }
    }

    /// Handle one classified intent from a sender.
    pub async fn handle(&self, intent: Intent, identity: &str) -> Outcome {
        if self.suppress_winner && self.take_muted(identity) {
            log::debug!("Swallowed post-win message from {}", identity);
            return Outcome::Suppressed;
        }

        match intent {
            // The confirmations below render from the snapshot the store
            // took inside its own critical section, never from a re-read
            // that a concurrent mutation could have altered in between.
            Intent::Add(raw) => match self.roster.add(&raw, identity) {
                Ok(added) => {
                    let mut text = format!(
                        "{} has been added to the list ({}/{}).\n\nCurrent Participant List:\n{}",
                        added.name,
                        added.position,
                        self.roster.capacity(),
                        render_list(&added.entries),
                    );
                    if added.phase == Phase::Full {
                        text.push_str("\n\nThe list is complete! Send .winner to draw the winner.");
                    }
                    self.try_deliver(text, vec![]).await;
                    Outcome::Added {
                        name: added.name,
                        position: added.position,
                    }
                }
                Err(err) => self.reject(err).await,
            },
            Intent::Remove(raw) => match self.roster.remove(&raw) {
                Ok(removed) => {
                    let text = if removed.entries.is_empty() {
                        format!(
                            "{} has been removed from the list. The list is now empty.",
                            removed.name
                        )
                    } else {
                        format!(
                            "{} has been removed from the list.\n\nCurrent Participant List:\n{}",
                            removed.name,
                            render_list(&removed.entries),
                        )
                    };
                    self.try_deliver(text, vec![]).await;
                    Outcome::Removed { name: removed.name }
                }
                Err(err) => self.reject(err).await,
            },
            Intent::List => match self.roster.list() {
                Some(entries) => {
                    let count = entries.len();
                    self.try_deliver(
                        format!("Current Participant List:\n{}", render_list(&entries)),
                        vec![],
                    )
                    .await;
                    Outcome::Listed { count }
                }
                None => {
                    self.try_deliver("The participant list is empty.".to_owned(), vec![])
                        .await;
                    Outcome::Listed { count: 0 }
                }
            },
            Intent::Draw => self.run_draw().await,
            Intent::Reset => {
                self.roster.clear();
                *self.muted.lock().expect("mute lock poisoned") = None;
                self.try_deliver(
                    "The participant list has been cleared for a new game. Send .add <name> to join."
                        .to_owned(),
                    vec![],
                )
                .await;
                Outcome::WasReset
            }
            Intent::GalleryAdd(image_ref) => {
                let index = self.gallery.append(&image_ref);
                self.try_deliver(
                    format!("Prize image added to the gallery at position {}.", index),
                    vec![],
                )
                .await;
                Outcome::PrizeAdded { index }
            }
            Intent::GalleryRemove(index) => match self.gallery.remove_at(index) {
                Ok(_) => {
                    self.try_deliver(
                        format!("Prize image {} removed from the gallery.", index),
                        vec![],
                    )
                    .await;
                    Outcome::PrizeRemoved { index }
                }
                Err(err) => self.reject(err).await,
            },
            Intent::GalleryList => {
                let items = self.gallery.list();
                if items.is_empty() {
                    self.try_deliver("The prize gallery is empty.".to_owned(), vec![])
                        .await;
                } else {
                    let media = items.iter().map(|i| i.image_ref.clone()).collect();
                    self.try_deliver(render_prizes(&items), media).await;
                }
                Outcome::PrizesListed { count: items.len() }
            }
            Intent::Start => {
                self.try_deliver(GREETING.to_owned(), vec![]).await;
                Outcome::Greeted
            }
            Intent::Unrecognized => {
                self.try_deliver(RULES.to_owned(), vec![]).await;
                Outcome::Help
            }
        }
    }

    /// Draw, announce, and reset as one cycle.
    ///
    /// The winner is selected and the round marked DRAWN in the draw
    /// engine's critical section; delivery then runs on that snapshot
    /// with no lock held. The roster is only cleared once the sink
    /// acknowledged the announcement, so a delivery failure leaves the
    /// round standing for an explicit .newgame follow-up.
    async fn run_draw(&self) -> Outcome {
        let result = match draw::draw(&self.roster) {
            Ok(result) => result,
            Err(err) => return self.reject(err).await,
        };

        log::info!("Drew winner {}", result.winner.name);

        match self.sink.deliver(announcement(&result), vec![]).await {
            Ok(()) => {
                self.roster.clear();
                if self.auto_clear_gallery {
                    self.gallery.clear();
                }
                if self.suppress_winner {
                    *self.muted.lock().expect("mute lock poisoned") =
                        Some(result.winner.identity.clone());
                }
                Outcome::Drawn {
                    winner: result.winner.name,
                    delivered: true,
                }
            }
            Err(err) => {
                log::error!("Failed to deliver winner announcement: {}", err);
                Outcome::Drawn {
                    winner: result.winner.name,
                    delivered: false,
                }
            }
        }
    }

    /// Clears the mute if `identity` is the muted winner, returning
    /// whether the message should be swallowed.
    fn take_muted(&self, identity: &str) -> bool {
        let mut muted = self.muted.lock().expect("mute lock poisoned");
        if muted.as_deref() == Some(identity) && !identity.is_empty() {
            *muted = None;
            true
        } else {
            false
        }
    }

    async fn reject(&self, err: Error) -> Outcome {
        let text = match &err {
            Error::EmptyName | Error::InvalidName(_) => format!("{}\n\n{}", err, RULES),
            _ => err.to_string(),
        };
        self.try_deliver(text, vec![]).await;
        Outcome::Rejected(err)
    }

    async fn try_deliver(&self, text: String, media: Vec<String>) {
        if let Err(err) = self.sink.deliver(text, media).await {
            log::warn!("Failed to deliver message: {}", err);
        }
    }

    pub fn roster_snapshot(&self) -> Vec<RosterEntry> {
        self.roster.list().unwrap_or_default()
    }

    pub fn gallery_snapshot(&self) -> Vec<GalleryItem> {
        self.gallery.list()
    }
}

fn render_list(entries: &[RosterEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}. {}", e.rank, e.name))
        .collect::<Vec<String>>()
        .join("\n")
}

fn announcement(result: &DrawResult) -> String {
    let list = result
        .standings
        .iter()
        .map(|s| {
            if s.is_winner {
                format!("*{}*", s.name)
            } else {
                s.name.clone()
            }
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!(
        "\u{1F389}\u{1F38A} *Congratulations!* \u{1F38A}\u{1F389}\n\n\
         \u{2728} The winner is: *{}* \u{2728}\n\n\
         Please provide your Name, Address, and Phone Number for the prize delivery! \u{1F3C6}\u{1F381}\n\n\
         Here is the list of all participants:\n\n{}",
        result.winner.name, list
    )
}

/// Renders the gallery index listing in its two balanced display rows.
fn render_prizes(items: &[GalleryItem]) -> String {
    let (first, second) = gallery::display_rows(items);
    let row = |row: &[GalleryItem]| {
        row.iter()
            .map(|i| format!("[{}]", i.index))
            .collect::<Vec<String>>()
            .join(" ")
    };

    if second.is_empty() {
        format!("Prize gallery ({} images):\n{}", items.len(), row(first))
    } else {
        format!(
            "Prize gallery ({} images):\n{}\n{}",
            items.len(),
            row(first),
            row(second)
        )
    }
}

/// Requests that can be sent to the round actor.
pub enum RoundRequest {
    Handle(Intent, String, Rto<Outcome>),
    RosterSnapshot(Rto<Vec<RosterEntry>>),
    GallerySnapshot(Rto<Vec<GalleryItem>>),
}

pub type RoundActor = ActorRef<RoundRequest>;

/// Funnel for every transport's classified intents.
///
/// Each Handle request runs on its own task: store access is already
/// serialized by the store locks, and a slow announcement delivery must
/// never stall other participants' requests.
pub async fn run_round_actor(
    controller: Arc<RoundController>,
    mut rx: UnboundedReceiver<RoundRequest>,
) -> Result<(), anyhow::Error> {
    log::debug!("Started round actor");

    while let Some(msg) = rx.recv().await {
        match msg {
            RoundRequest::Handle(intent, identity, rto) => {
                let controller = controller.clone();
                tokio::spawn(async move {
                    rto.reply(Ok(controller.handle(intent, &identity).await));
                });
            }
            RoundRequest::RosterSnapshot(rto) => rto.reply(Ok(controller.roster_snapshot())),
            RoundRequest::GallerySnapshot(rto) => rto.reply(Ok(controller.gallery_snapshot())),
        }
    }

    Ok(())
}
