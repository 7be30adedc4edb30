use thiserror::Error;

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Error, Debug)]
pub enum UploadError {
    /// Broken deployment: missing guild, channel or emoji. Fatal at startup,
    /// unreachable from the command surface afterwards.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to download image: {0}")]
    FetchFailure(String),

    #[error("Failed to resolve requesters: {0}")]
    RequesterResolution(String),

    #[error("Post not found")]
    AlreadyDeleted,

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl UploadError {
    /// The ephemeral notice shown to the invoking user. Other observers never
    /// see anything.
    pub fn user_notice(&self, dev: bool) -> String {
        let notice = match self {
            UploadError::FetchFailure(_) => "Failed to download your image, please try again.",
            UploadError::RequesterResolution(_) => "Invalid fulfilled request link provided, will skip pinging users.",
            UploadError::AlreadyDeleted => "Post not found, it may have already been deleted by admins.",
            UploadError::Configuration(_) | UploadError::Unexpected(_) => "An unexpected error happened.",
        };

        if dev {
            format!("{notice}\n```\n{self}\n```")
        } else {
            notice.to_string()
        }
    }
}

impl From<serenity::Error> for UploadError {
    fn from(e: serenity::Error) -> Self {
        UploadError::Unexpected(e.into())
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        UploadError::FetchFailure(e.to_string())
    }
}

/// Whether a serenity error is a plain 404 from the REST API.
pub fn is_not_found(e: &serenity::Error) -> bool {
    match e {
        serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response)) => response.status_code.as_u16() == 404,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_deleted_has_specific_notice() {
        let notice = UploadError::AlreadyDeleted.user_notice(false);
        assert_eq!(notice, "Post not found, it may have already been deleted by admins.");
    }

    #[test]
    fn unexpected_is_generic() {
        let err = UploadError::Unexpected(anyhow::anyhow!("boom"));
        assert_eq!(err.user_notice(false), "An unexpected error happened.");
    }

    #[test]
    fn dev_mode_appends_detail() {
        let err = UploadError::FetchFailure("status 403".to_string());
        let notice = err.user_notice(true);
        assert!(notice.starts_with("Failed to download your image"));
        assert!(notice.contains("status 403"));
    }
}
