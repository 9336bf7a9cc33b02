//! Demo handlers: the help-request flow.
//!
//! `/help-me` opens a modal collecting a description; submitting the
//! modal logs the request and posts a confirmation to the configured
//! channel. Both handlers degrade to local-only behavior when no Slack
//! gateway is configured.

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::info;

use crate::errors::{HandlerError, RouteError};
use crate::slack::client::SlackGateway;
use crate::slack::views;
use crate::webhook::dispatcher::HandlerReply;
use crate::webhook::payload::InteractionKind;
use crate::webhook::routes::RouteTable;

/// Register the help-request routes on a table.
///
/// # Errors
///
/// Returns [`RouteError::DuplicateRoute`] if either route is already
/// registered.
pub fn register_routes(
    table: &mut RouteTable,
    gateway: Option<Arc<SlackGateway>>,
    channel_id: String,
) -> Result<(), RouteError> {
    let command_gateway = gateway.clone();
    table.on_command("/help-me", move |ctx| {
        let gateway = command_gateway.clone();
        async move {
            let command = ctx.command()?;
            info!(user = %command.user_name, channel = %command.channel_name, "help requested");

            let Some(gateway) = gateway else {
                return Ok(HandlerReply::text(
                    StatusCode::OK,
                    "helpdesk is running in local-only mode; no dialog available",
                ));
            };

            gateway
                .open_view(&command.trigger_id, views::help_request_modal())
                .await
                .map_err(|err| HandlerError::from(format!("failed to open help dialog: {err}")))?;
            Ok(HandlerReply::empty())
        }
    })?;

    table.on_interaction(
        "view_submission",
        views::HELP_REQUEST_CALLBACK_ID,
        move |ctx| {
            let gateway = gateway.clone();
            let channel = channel_id.clone();
            async move {
                let interaction = ctx.interaction()?;
                let description = match &interaction.kind {
                    InteractionKind::ViewSubmission(view) => view
                        .input_value(views::HELP_REQUEST_BLOCK_ID, views::HELP_REQUEST_ACTION_ID)
                        .unwrap_or_default()
                        .to_owned(),
                    InteractionKind::DialogSubmission(dialog) => dialog
                        .submission
                        .get(views::HELP_REQUEST_ACTION_ID)
                        .cloned()
                        .unwrap_or_default(),
                    InteractionKind::Other => String::new(),
                };

                info!(
                    callback_id = %interaction.callback.callback_id,
                    %description,
                    "help request submitted"
                );

                if let Some(gateway) = gateway {
                    gateway
                        .post_message(&channel, format!("New help request: {description}"))
                        .await
                        .map_err(|err| {
                            HandlerError::from(format!("failed to post confirmation: {err}"))
                        })?;
                }
                Ok(HandlerReply::empty())
            }
        },
    )?;

    Ok(())
}
