use serenity::all::{Http, Interaction, Ready};
use serenity::async_trait;
use serenity::prelude::*;

use crate::config::Config;
use crate::discord_bot::commands::{upload, Data, Error};
use crate::discord_bot::errors::UploadError;
use crate::discord_bot::interactions::{self, PostAction};
use crate::discord_bot::requesters::MARKER_EMOJI;

struct Handler {
    dev: bool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!("Bot: {}", ready.user.name);
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let component = match interaction {
            Interaction::Component(component) => component,
            _ => return,
        };

        // Confirmation buttons carry the post reference in their custom id.
        let action = match PostAction::parse(&component.data.custom_id) {
            Some(action) => action,
            None => return,
        };

        let result = match action {
            PostAction::DeletePost(post) => interactions::delete_post(&ctx, &component, post).await,
            PostAction::EditDescription(post) => interactions::edit_description(&ctx, &component, post).await,
        };

        if let Err(e) = result {
            tracing::error!("Interaction {} failed: {e}", component.data.custom_id);
            interactions::notify(&ctx, &component, &e.user_notice(self.dev)).await;
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Command /{} failed: {error}", ctx.command().name);
            let notice = error.user_notice(ctx.data().config.dev);
            if let Err(e) = ctx.send(poise::CreateReply::default().content(notice).ephemeral(true)).await {
                tracing::warn!("Failed to deliver error notice: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                tracing::error!("Error while handling error: {e}");
            }
        }
    }
}

/// Verifies the deployment before serving anything: the guild, every
/// configured channel and the marker emoji must exist. A failure here aborts
/// startup.
async fn startup_checks(http: &Http, config: &Config) -> Result<(), UploadError> {
    let guild = http.get_guild(config.guild_id()).await.map_err(|e| UploadError::Configuration(format!("Cannot fetch guild {}: {e}", config.guild_id)))?;
    tracing::info!("Server: {}", guild.name);

    let guild_channels = guild.channels(http).await.map_err(|e| UploadError::Configuration(format!("Cannot fetch channels of guild {}: {e}", guild.id)))?;
    for (alias, channel_id) in config.all_channels() {
        if !guild_channels.contains_key(&channel_id) {
            return Err(UploadError::Configuration(format!("Channel {alias} ({channel_id}) not found in guild")));
        }
        tracing::info!("Found {alias}");
    }

    let emojis = http.get_emojis(guild.id).await.map_err(|e| UploadError::Configuration(format!("Cannot fetch emojis of guild {}: {e}", guild.id)))?;
    if !emojis.iter().any(|emoji| emoji.name == MARKER_EMOJI) {
        return Err(UploadError::Configuration(format!("Custom emoji :{MARKER_EMOJI}: not found in guild")));
    }
    tracing::info!("Found :{MARKER_EMOJI}:");

    Ok(())
}

pub struct DiscordBot {
    client: Client,
}

impl DiscordBot {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES;
        let guild_id = config.guild_id();
        let dev = config.dev;
        let token = config.bot_token.clone();

        let framework = poise::Framework::builder()
            .options(poise::FrameworkOptions {
                commands: vec![upload()],
                on_error: |error| Box::pin(on_error(error)),
                ..Default::default()
            })
            .setup(move |ctx, _ready, framework| {
                Box::pin(async move {
                    poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id).await?;
                    startup_checks(&ctx.http, &config).await?;
                    Ok(Data {
                        config,
                        http_client: reqwest::Client::new(),
                    })
                })
            })
            .build();

        let client = Client::builder(&token, intents).event_handler(Handler { dev }).framework(framework).await?;

        Ok(DiscordBot { client })
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        self.client.start().await?;
        Ok(())
    }
}
