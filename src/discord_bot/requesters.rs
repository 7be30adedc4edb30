use lazy_static::lazy_static;
use regex::Regex;
use serenity::all::{Http, Mention, MessageId, ReactionType, UserId};

use crate::config::Config;
use crate::discord_bot::errors::{UploadError, UploadResult};

/// Reacting to a request with this custom emoji means "ping me when someone
/// fulfills it".
pub const MARKER_EMOJI: &str = "pingme";

lazy_static! {
    static ref REQUEST_LINK_REGEX: Regex = Regex::new(r"/(\d+)/?\s*$").unwrap();
}

/// Extracts the message id from the trailing path segment of a message link.
pub fn parse_request_message_id(link: &str) -> Option<MessageId> {
    let captures = REQUEST_LINK_REGEX.captures(link.trim())?;
    let id = captures.get(1)?.as_str().parse::<u64>().ok()?;
    Some(MessageId::new(id))
}

const REACTION_PAGE_SIZE: u8 = 100;

/// Concatenated with no separator, in the order the platform returned them.
pub fn join_mentions(user_ids: &[UserId]) -> String {
    user_ids.iter().map(|id| Mention::User(*id).to_string()).collect()
}

/// Picks the marker reaction out of a message's reaction set. Zero qualifying
/// reactions is a resolution failure.
fn find_marker_reaction<'a>(reaction_types: impl IntoIterator<Item = &'a ReactionType>) -> UploadResult<&'a ReactionType> {
    reaction_types
        .into_iter()
        .find(|reaction_type| matches!(reaction_type, ReactionType::Custom { name: Some(name), .. } if name.as_str() == MARKER_EMOJI))
        .ok_or_else(|| UploadError::RequesterResolution(format!("No one reacted to the request with :{MARKER_EMOJI}:")))
}

/// Cursor for the page after this one, or `None` once a short page signals
/// the reactor list is exhausted.
fn next_reaction_page(page: &[UserId]) -> Option<UserId> {
    if page.len() < REACTION_PAGE_SIZE as usize {
        None
    } else {
        page.last().copied()
    }
}

/// Resolves the mentions of everyone who reacted to the linked request message
/// with the marker emoji. The message is always looked up in the configured
/// request channel, wherever the link claims to point.
pub async fn fetch_requested_users(http: &Http, config: &Config, fulfilled_request_link: &str) -> UploadResult<String> {
    let message_id = parse_request_message_id(fulfilled_request_link).ok_or_else(|| UploadError::RequesterResolution(format!("Not a message link: {fulfilled_request_link}")))?;

    let request_message = http
        .get_message(config.request_channel_id(), message_id)
        .await
        .map_err(|e| UploadError::RequesterResolution(format!("Cannot find message {message_id}: {e}")))?;

    let marker_reaction = find_marker_reaction(request_message.reactions.iter().map(|reaction| &reaction.reaction_type))?;

    let mut user_ids: Vec<UserId> = Vec::new();
    let mut after: Option<UserId> = None;
    loop {
        let page = request_message.reaction_users(http, marker_reaction.clone(), Some(REACTION_PAGE_SIZE), after).await?;
        let page_ids = page.iter().map(|user| user.id).collect::<Vec<UserId>>();
        let cursor = next_reaction_page(&page_ids);
        user_ids.extend(page_ids);
        match cursor {
            Some(last_seen) => after = Some(last_seen),
            None => break,
        }
    }

    Ok(join_mentions(&user_ids))
}
