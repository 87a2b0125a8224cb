use std::convert::Infallible;

use warp::{reject::Rejection, Filter};

use crate::Directory;

use super::handlers::{get_gallery, get_roster, receive_update};

pub fn with_directory(
    directory: Directory,
) -> impl Filter<Extract = (Directory,), Error = Infallible> + Clone {
    warp::any().map(move || directory.clone())
}

pub fn api_filters(
    directory: Directory,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let health = warp::path::end()
        .and(warp::get())
        .map(|| "Raffle bot is running!");

    let webhook = warp::path!("telegram")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_directory(directory.clone()))
        .and_then(receive_update);

    let roster = warp::path!("roster")
        .and(warp::get())
        .and(with_directory(directory.clone()))
        .and_then(get_roster);

    let gallery = warp::path!("gallery")
        .and(warp::get())
        .and(with_directory(directory))
        .and_then(get_gallery);

    health.or(webhook).or(roster).or(gallery)
}
