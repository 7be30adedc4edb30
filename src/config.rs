use std::fs::File;
use std::io::Read;

use serde::Deserialize;
use serenity::all::{ChannelId, GuildId};

use crate::discord_bot::errors::{UploadError, UploadResult};

/// The channels a post can be published to. The command surface only offers
/// these three, so alias resolution can never fail at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum UploadChannel {
    #[name = "#upload-sharing"]
    UploadSharing,
    #[name = "#ost-sharing"]
    OstSharing,
    #[name = "#misc-sharing"]
    MiscSharing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub upload_request: u64,
    pub upload_sharing: u64,
    pub ost_sharing: u64,
    pub misc_sharing: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bot_token: String,
    pub guild_id: u64,
    /// When true, error notices include the error detail.
    #[serde(default)]
    pub dev: bool,
    pub channels: ChannelConfig,
}

impl Config {
    pub fn load(path: &str) -> UploadResult<Self> {
        let mut file = File::open(path).map_err(|e| UploadError::Configuration(format!("Unable to open config file {path}: {e}")))?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).map_err(|e| UploadError::Configuration(format!("Unable to read config file {path}: {e}")))?;
        let config: Config = serde_yaml::from_str(&contents).map_err(|e| UploadError::Configuration(format!("Error parsing config file {path}: {e}")))?;
        Ok(config)
    }

    pub fn guild_id(&self) -> GuildId {
        GuildId::new(self.guild_id)
    }

    /// The channel posts are published to for a given alias.
    pub fn upload_channel_id(&self, channel: UploadChannel) -> ChannelId {
        let id = match channel {
            UploadChannel::UploadSharing => self.channels.upload_sharing,
            UploadChannel::OstSharing => self.channels.ost_sharing,
            UploadChannel::MiscSharing => self.channels.misc_sharing,
        };
        ChannelId::new(id)
    }

    /// The channel requests are read from by the requester resolver.
    pub fn request_channel_id(&self) -> ChannelId {
        ChannelId::new(self.channels.upload_request)
    }

    /// Every channel id the deployment references, paired with its alias for
    /// the startup check log.
    pub fn all_channels(&self) -> [(&'static str, ChannelId); 4] {
        [
            ("#upload-request", ChannelId::new(self.channels.upload_request)),
            ("#upload-sharing", ChannelId::new(self.channels.upload_sharing)),
            ("#ost-sharing", ChannelId::new(self.channels.ost_sharing)),
            ("#misc-sharing", ChannelId::new(self.channels.misc_sharing)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "
bot_token: \"token\"
guild_id: 1090413253592612917
dev: true
channels:
  upload_request: 1
  upload_sharing: 2
  ost_sharing: 3
  misc_sharing: 4
";

    #[test]
    fn parses_yaml_config() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.guild_id, 1090413253592612917);
        assert!(config.dev);
        assert_eq!(config.request_channel_id(), ChannelId::new(1));
    }

    #[test]
    fn dev_defaults_to_false() {
        let without_dev = SAMPLE.replace("dev: true\n", "");
        let config: Config = serde_yaml::from_str(&without_dev).unwrap();
        assert!(!config.dev);
    }

    #[test]
    fn aliases_map_to_configured_ids() {
        let config: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(config.upload_channel_id(UploadChannel::UploadSharing), ChannelId::new(2));
        assert_eq!(config.upload_channel_id(UploadChannel::OstSharing), ChannelId::new(3));
        assert_eq!(config.upload_channel_id(UploadChannel::MiscSharing), ChannelId::new(4));
    }
}
