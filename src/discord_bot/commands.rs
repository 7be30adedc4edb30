use poise::serenity_prelude as serenity;
use poise::Modal;
use serenity::{CreateAttachment, CreateMessage, MessageFlags};

use crate::config::{Config, UploadChannel};
use crate::discord_bot::errors::{is_not_found, UploadError};
use crate::discord_bot::interactions::{confirmation_buttons, PostRef};
use crate::discord_bot::requesters;
use crate::preview;

/// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub config: Config,
    pub http_client: reqwest::Client,
}

pub type Error = UploadError;
pub type Context<'a> = poise::ApplicationContext<'a, Data, Error>;

#[derive(Debug, poise::Modal)]
#[name = "Upload Anonymously"]
pub struct DescriptionModal {
    #[name = "Description"]
    #[placeholder = "Description of the upload"]
    #[paragraph]
    pub description: String,
}

fn post_content(description: &str, users_to_ping: &str) -> String {
    format!("{description}\n{users_to_ping}")
}

/// Upload Anonymously.
#[poise::command(slash_command, guild_only)]
pub async fn upload(
    ctx: Context<'_>,
    #[description = "Select a channel to upload to"] upload_channel: UploadChannel,
    #[description = "Paste your image here!"] image_attachment: serenity::Attachment,
    #[description = "Paste the link to the fulfilled request here"] fulfilled_request_link: Option<String>,
) -> Result<(), Error> {
    let reply_ctx = poise::Context::Application(ctx);
    let config = &ctx.data.config;

    // The modal is the initial response; an abandoned form never resolves and
    // the invocation simply ends here.
    let form = match DescriptionModal::execute(ctx).await? {
        Some(form) => form,
        None => return Ok(()),
    };

    let processing = reply_ctx.send(poise::CreateReply::default().content("Anonahira is processing your post...").ephemeral(true)).await?;

    let target_channel = config.upload_channel_id(upload_channel);

    let mut users_to_ping = String::new();
    if let Some(link) = &fulfilled_request_link {
        match requesters::fetch_requested_users(&ctx.serenity_context.http, config, link).await {
            Ok(mentions) => users_to_ping = mentions,
            Err(e) => {
                // Graceful skip: the post still goes out, just without pings.
                tracing::warn!("Skipping requester pings: {e}");
                reply_ctx.send(poise::CreateReply::default().content(e.user_notice(config.dev)).ephemeral(true)).await?;
            }
        }
    }

    let response = ctx.data.http_client.get(&image_attachment.url).send().await?;
    if !response.status().is_success() {
        return Err(UploadError::FetchFailure(format!("status {} for {}", response.status(), image_attachment.url)));
    }
    let original_image_raw = response.bytes().await?.to_vec();

    let planned_files = preview::plan_attachments(original_image_raw, &image_attachment.filename, image_attachment.content_type.as_deref())?;
    let attachments = planned_files.into_iter().map(|file| CreateAttachment::bytes(file.bytes, file.filename)).collect::<Vec<CreateAttachment>>();

    let message = CreateMessage::new().content(post_content(&form.description, &users_to_ping)).flags(MessageFlags::SUPPRESS_EMBEDS);
    let anonymous_post = ctx.serenity_context.http.send_message(target_channel, attachments, &message).await?;
    tracing::info!("Published anonymous post {} to channel {}", anonymous_post.id, target_channel);

    // The processing notice may already be gone; that counts as cleaned up.
    if let Err(e) = processing.delete(reply_ctx).await {
        if !is_not_found(&e) {
            return Err(e.into());
        }
    }

    let post_ref = PostRef {
        channel_id: target_channel,
        message_id: anonymous_post.id,
    };
    let link = anonymous_post.id.link(target_channel, Some(config.guild_id()));
    reply_ctx
        .send(
            poise::CreateReply::default()
                .content(format!("The post has been uploaded to the server.\nLink: {link}"))
                .ephemeral(true)
                .components(confirmation_buttons(post_ref)),
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_description_then_mentions() {
        assert_eq!(post_content("great soundtrack", "<@1><@2>"), "great soundtrack\n<@1><@2>");
    }

    #[test]
    fn content_without_pings_keeps_trailing_newline() {
        assert_eq!(post_content("hello world", ""), "hello world\n");
    }
}
