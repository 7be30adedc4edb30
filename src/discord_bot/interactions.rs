use serenity::all::{
    ButtonStyle, ChannelId, ComponentInteraction, Context, CreateActionRow, CreateButton, CreateInteractionResponse, CreateInteractionResponseFollowup, CreateInteractionResponseMessage, EditMessage,
    Message, MessageId,
};

use crate::discord_bot::commands::DescriptionModal;
use crate::discord_bot::errors::{is_not_found, UploadError, UploadResult};

const EDIT_ACTION: &str = "btn:edit_description";
const DELETE_ACTION: &str = "btn:delete_post";

/// Structured reference to a published post, carried in the confirmation
/// buttons' custom ids so the moderation handlers never have to re-derive it
/// from rendered message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostRef {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    EditDescription(PostRef),
    DeletePost(PostRef),
}

impl PostAction {
    pub fn custom_id(&self) -> String {
        match self {
            PostAction::EditDescription(post) => format!("{EDIT_ACTION}:{}:{}", post.channel_id, post.message_id),
            PostAction::DeletePost(post) => format!("{DELETE_ACTION}:{}:{}", post.channel_id, post.message_id),
        }
    }

    /// Returns `None` for custom ids this bot does not own.
    pub fn parse(custom_id: &str) -> Option<Self> {
        if let Some(payload) = custom_id.strip_prefix(EDIT_ACTION).and_then(|rest| rest.strip_prefix(':')) {
            Some(PostAction::EditDescription(parse_post_ref(payload)?))
        } else if let Some(payload) = custom_id.strip_prefix(DELETE_ACTION).and_then(|rest| rest.strip_prefix(':')) {
            Some(PostAction::DeletePost(parse_post_ref(payload)?))
        } else {
            None
        }
    }
}

fn parse_post_ref(payload: &str) -> Option<PostRef> {
    let (channel_id, message_id) = payload.split_once(':')?;
    // Discord ids are never zero and the id newtypes panic on it.
    let channel_id = channel_id.parse::<u64>().ok().filter(|id| *id != 0)?;
    let message_id = message_id.parse::<u64>().ok().filter(|id| *id != 0)?;
    Some(PostRef {
        channel_id: ChannelId::new(channel_id),
        message_id: MessageId::new(message_id),
    })
}

pub fn confirmation_buttons(post: PostRef) -> Vec<CreateActionRow> {
    vec![CreateActionRow::Buttons(vec![
        CreateButton::new(PostAction::EditDescription(post).custom_id()).label("Edit Description").style(ButtonStyle::Primary),
        CreateButton::new(PostAction::DeletePost(post).custom_id()).label("Delete Post").style(ButtonStyle::Danger),
    ])]
}

/// Re-fetches the live post. A 404 means it was already removed, which the
/// caller reports as such rather than as a generic failure.
async fn fetch_post(ctx: &Context, post: PostRef) -> UploadResult<Message> {
    ctx.http.get_message(post.channel_id, post.message_id).await.map_err(|e| if is_not_found(&e) { UploadError::AlreadyDeleted } else { e.into() })
}

pub async fn delete_post(ctx: &Context, interaction: &ComponentInteraction, post: PostRef) -> UploadResult<()> {
    fetch_post(ctx, post).await?;
    ctx.http.delete_message(post.channel_id, post.message_id, None).await?;

    // Ephemeral messages cannot be deleted by id over the REST API, so the
    // confirmation is collapsed in place instead.
    let collapsed = CreateInteractionResponseMessage::new().content("Post deleted.").components(vec![]);
    interaction.create_response(&ctx.http, CreateInteractionResponse::UpdateMessage(collapsed)).await?;
    Ok(())
}

/// serenity's `Context` implements `AsRef` for its parts but never for
/// itself, which `execute_modal_on_component_interaction` bounds on.
struct ContextRef<'a>(&'a Context);

impl AsRef<Context> for ContextRef<'_> {
    fn as_ref(&self) -> &Context {
        self.0
    }
}

pub async fn edit_description(ctx: &Context, interaction: &ComponentInteraction, post: PostRef) -> UploadResult<()> {
    let post_message = fetch_post(ctx, post).await?;

    let prefilled = DescriptionModal { description: post_message.content };
    let form = match poise::execute_modal_on_component_interaction(ContextRef(ctx), interaction.clone(), Some(prefilled), None).await? {
        Some(form) => form,
        // Abandoned modal, nothing to do.
        None => return Ok(()),
    };

    let edited = EditMessage::new().content(form.description);
    ctx.http.edit_message(post.channel_id, post.message_id, &edited, vec![]).await?;

    interaction.create_followup(&ctx.http, CreateInteractionResponseFollowup::new().content("Description updated.").ephemeral(true)).await?;
    Ok(())
}

/// Delivers an ephemeral notice whether or not the interaction has already
/// been responded to (the edit flow responds with a modal before it can fail).
pub async fn notify(ctx: &Context, interaction: &ComponentInteraction, notice: &str) {
    let response = CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().content(notice).ephemeral(true));
    if interaction.create_response(&ctx.http, response).await.is_err() {
        let followup = CreateInteractionResponseFollowup::new().content(notice).ephemeral(true);
        if let Err(e) = interaction.create_followup(&ctx.http, followup).await {
            tracing::warn!("Failed to deliver notice to user: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> PostRef {
        PostRef {
            channel_id: ChannelId::new(1228041627898216469),
            message_id: MessageId::new(1234567890123456789),
        }
    }

    #[test]
    fn custom_ids_round_trip() {
        let edit = PostAction::EditDescription(post());
        let delete = PostAction::DeletePost(post());
        assert_eq!(PostAction::parse(&edit.custom_id()), Some(edit));
        assert_eq!(PostAction::parse(&delete.custom_id()), Some(delete));
    }

    #[test]
    fn custom_ids_fit_discord_limit() {
        // Discord caps custom ids at 100 characters.
        let action = PostAction::EditDescription(PostRef {
            channel_id: ChannelId::new(u64::MAX),
            message_id: MessageId::new(u64::MAX),
        });
        assert!(action.custom_id().len() <= 100);
    }

    #[test]
    fn foreign_custom_ids_are_ignored() {
        assert_eq!(PostAction::parse("accept"), None);
        assert_eq!(PostAction::parse("btn:edit_caption:1:2"), None);
        assert_eq!(PostAction::parse(""), None);
    }

    #[test]
    fn malformed_payloads_are_ignored() {
        assert_eq!(PostAction::parse("btn:delete_post:123"), None);
        assert_eq!(PostAction::parse("btn:delete_post:123:abc"), None);
        assert_eq!(PostAction::parse("btn:edit_description:1:2:3"), None);
    }

    #[test]
    fn zero_ids_are_malformed() {
        assert_eq!(PostAction::parse("btn:delete_post:0:0"), None);
        assert_eq!(PostAction::parse("btn:delete_post:0:123"), None);
        assert_eq!(PostAction::parse("btn:edit_description:123:0"), None);
    }

    #[test]
    fn context_adapter_satisfies_the_modal_helper_bound() {
        fn requires_as_ref<T: AsRef<Context>>() {}
        requires_as_ref::<ContextRef<'static>>();
    }
}
