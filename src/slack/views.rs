//! Modal view builders for the demo help-request flow.

use slack_morphism::prelude::{
    SlackActionId, SlackBlockId, SlackBlockPlainTextInputElement, SlackBlockPlainTextOnly,
    SlackCallbackId, SlackInputBlock, SlackInputBlockElement, SlackModalView, SlackView,
};

/// Callback identifier shared by the help-request modal and its route.
pub const HELP_REQUEST_CALLBACK_ID: &str = "help_request";

/// Block identifier of the description input.
pub const HELP_REQUEST_BLOCK_ID: &str = "help_request_block";

/// Action identifier of the description input.
pub const HELP_REQUEST_ACTION_ID: &str = "help_request_description";

/// Build the modal that collects a help request description.
#[must_use]
pub fn help_request_modal() -> SlackView {
    let input_element =
        SlackBlockPlainTextInputElement::new(SlackActionId(HELP_REQUEST_ACTION_ID.to_owned()))
            .with_multiline(true)
            .with_placeholder(SlackBlockPlainTextOnly::from(
                "Describe what you would like help with ...",
            ));

    let input_block = SlackInputBlock::new(
        SlackBlockPlainTextOnly::from("Help request description"),
        SlackInputBlockElement::PlainTextInput(input_element),
    )
    .with_block_id(SlackBlockId(HELP_REQUEST_BLOCK_ID.to_owned()));

    SlackView::Modal(
        SlackModalView::new(
            SlackBlockPlainTextOnly::from("Request help"),
            vec![input_block.into()],
        )
        .with_callback_id(SlackCallbackId(HELP_REQUEST_CALLBACK_ID.to_owned()))
        .with_submit(SlackBlockPlainTextOnly::from("Create")),
    )
}
