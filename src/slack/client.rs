//! Slack Web API client for handler-initiated calls.
//!
//! The gateway core never talks to Slack; handlers do, through this
//! small wrapper exposing the two capabilities the demo needs: opening a
//! modal in response to a trigger and posting a channel message.

use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiToken, SlackApiTokenType, SlackApiTokenValue,
    SlackApiViewsOpenRequest, SlackChannelId, SlackClient, SlackClientHyperHttpsConnector,
    SlackClientSession, SlackMessageContent, SlackTriggerId, SlackView,
};
use tracing::info;

use crate::{AppError, Result};

/// Slack Web API wrapper bound to a bot token.
pub struct SlackGateway {
    client: SlackClient<SlackClientHyperHttpsConnector>,
    bot_token: SlackApiToken,
}

impl SlackGateway {
    /// Create a gateway from a bot token.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn new(bot_token: &str) -> Result<Self> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = SlackClient::new(connector);
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(bot_token.to_owned()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };

        info!("slack gateway initialised");
        Ok(Self { client, bot_token })
    }

    /// Open a modal view against a short-lived trigger identifier.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the API call fails.
    pub async fn open_view(&self, trigger_id: &str, view: SlackView) -> Result<()> {
        let request =
            SlackApiViewsOpenRequest::new(SlackTriggerId(trigger_id.to_owned()), view);
        self.session()
            .views_open(&request)
            .await
            .map_err(|err| AppError::Slack(format!("failed to open modal: {err}")))?;
        Ok(())
    }

    /// Post a plain-text message to a channel.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the API call fails.
    pub async fn post_message(&self, channel: &str, text: impl Into<String>) -> Result<()> {
        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel.to_owned()),
            SlackMessageContent::new().with_text(text.into()),
        );
        self.session()
            .chat_post_message(&request)
            .await
            .map_err(|err| AppError::Slack(format!("failed to post message: {err}")))?;
        Ok(())
    }

    fn session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }
}
