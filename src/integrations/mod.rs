use std::sync::Arc;

use tokio::task::JoinSet;

use crate::{core::settings::Settings, web, Directory};

use self::telegram::TelegramClient;

pub mod telegram;

pub fn init_integrations(
    tasks: &mut JoinSet<Result<(), anyhow::Error>>,
    settings: Arc<Settings>,
    client: Arc<TelegramClient>,
    directory: Directory,
) {
    // Long-poll loop for group messages
    tasks.spawn(telegram::run_poller(
        client,
        settings.clone(),
        directory.clone(),
    ));

    // Health endpoint, webhook, and snapshot API
    tasks.spawn(web::run_http_server(settings, directory));
}
