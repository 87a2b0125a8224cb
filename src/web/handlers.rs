use std::convert::Infallible;

use serde::Serialize;

use crate::{
    core::round::RoundRequest,
    integrations::telegram::{self, Update},
    send_message, Directory,
};

pub fn to_http_output<T: Serialize>(
    result: anyhow::Result<T>,
) -> Result<impl warp::Reply, Infallible> {
    match result {
        Ok(data) => Ok(warp::reply::with_status(
            serde_json::to_string::<T>(&data).unwrap_or_default(),
            warp::http::StatusCode::OK,
        )),
        Err(e) => {
            log::warn!("{}", e);
            Ok(warp::reply::with_status(
                e.to_string(),
                warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

/// Webhook entry point. Telegram expects a 200 for every update it
/// posts, so handling failures are logged rather than surfaced.
pub async fn receive_update(
    update: Update,
    directory: Directory,
) -> Result<impl warp::Reply, Infallible> {
    if let Some(message) = update.message {
        telegram::process_message(message, &directory).await;
    }

    Ok(warp::reply::with_status(
        "OK".to_string(),
        warp::http::StatusCode::OK,
    ))
}

pub async fn get_roster(directory: Directory) -> Result<impl warp::Reply, Infallible> {
    to_http_output(send_message!(
        directory.round_actor,
        RoundRequest,
        RosterSnapshot
    ))
}

pub async fn get_gallery(directory: Directory) -> Result<impl warp::Reply, Infallible> {
    to_http_output(send_message!(
        directory.round_actor,
        RoundRequest,
        GallerySnapshot
    ))
}
