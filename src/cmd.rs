/// A classified inbound intent, ready for the round controller.
///
/// Numeric arguments are validated here: a malformed prize index never
/// reaches the gallery store.
#[derive(PartialEq, Debug, Clone)]
pub enum Intent {
    Add(String),
    Remove(String),
    List,
    Draw,
    /// Explicit reset, the follow-up path when a draw's announcement
    /// failed to deliver and the round was left standing.
    Reset,
    GalleryAdd(String),
    GalleryRemove(usize),
    GalleryList,
    /// The Telegram /start command, answered with a greeting.
    Start,
    Unrecognized,
}

/// Classify a raw inbound message.
///
/// `photo` is the transport's opaque reference to an attached image, if
/// any. Commands are matched case-insensitively on their prefix; name
/// arguments keep the sender's original casing for the normalizer.
pub fn classify(text: &str, photo: Option<&str>) -> Intent {
    let text = text.trim();

    if let Some(image_ref) = photo {
        return if text.eq_ignore_ascii_case(".addprize") {
            Intent::GalleryAdd(image_ref.to_owned())
        } else {
            Intent::Unrecognized
        };
    }

    let lower = text.to_lowercase();

    if let Some(rest) = arg_of(text, &lower, ".add ") {
        return Intent::Add(rest);
    }
    if let Some(rest) = arg_of(text, &lower, ".remove ") {
        return Intent::Remove(rest);
    }
    if let Some(rest) = arg_of(text, &lower, ".delprize ") {
        return match rest.parse::<usize>() {
            Ok(index) => Intent::GalleryRemove(index),
            Err(_) => Intent::Unrecognized,
        };
    }

    // Telegram appends the bot's username in group chats: "/start@SomeBot".
    if lower == "/start" || lower.starts_with("/start@") {
        return Intent::Start;
    }

    match lower.as_str() {
        ".list" => Intent::List,
        ".winner" => Intent::Draw,
        ".newgame" => Intent::Reset,
        ".prizes" => Intent::GalleryList,
        _ => Intent::Unrecognized,
    }
}

/// Returns the trimmed argument of `prefix`, preserving original casing.
/// Prefixes are plain ascii, so byte offsets line up between `text` and
/// its lowercased form.
fn arg_of(text: &str, lower: &str, prefix: &str) -> Option<String> {
    if lower.starts_with(prefix) {
        Some(text[prefix.len()..].trim().to_owned())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, Intent};

    #[test]
    fn test_classify_roster_commands() {
        assert_eq!(classify(".add John Doe", None), Intent::Add("John Doe".to_owned()));
        assert_eq!(classify(".ADD maria", None), Intent::Add("maria".to_owned()));
        assert_eq!(classify("  .remove  John ", None), Intent::Remove("John".to_owned()));
        assert_eq!(classify(".list", None), Intent::List);
        assert_eq!(classify(".winner", None), Intent::Draw);
        assert_eq!(classify(".newgame", None), Intent::Reset);
    }

    #[test]
    fn test_classify_gallery_commands() {
        assert_eq!(classify(".prizes", None), Intent::GalleryList);
        assert_eq!(classify(".delprize 3", None), Intent::GalleryRemove(3));
        assert_eq!(
            classify(".addprize", Some("file_abc")),
            Intent::GalleryAdd("file_abc".to_owned())
        );
        // A photo without the caption is not a prize submission.
        assert_eq!(classify("look at this", Some("file_abc")), Intent::Unrecognized);
    }

    #[test]
    fn test_malformed_indices_never_reach_the_store() {
        assert_eq!(classify(".delprize three", None), Intent::Unrecognized);
        assert_eq!(classify(".delprize -1", None), Intent::Unrecognized);
        assert_eq!(classify(".delprize 1.5", None), Intent::Unrecognized);
        assert_eq!(classify(".delprize", None), Intent::Unrecognized);
    }

    #[test]
    fn test_classify_start() {
        assert_eq!(classify("/start", None), Intent::Start);
        assert_eq!(classify("/start@RaffleBot", None), Intent::Start);
        assert_eq!(classify("/started", None), Intent::Unrecognized);
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(classify("hello everyone", None), Intent::Unrecognized);
        assert_eq!(classify(".addJohn", None), Intent::Unrecognized);
        assert_eq!(classify("", None), Intent::Unrecognized);
    }
}
