use tonepicker_core::ToneDescriptor;

/// Build the single user turn sent to the model.
pub fn user_message(text: &str, tone: &ToneDescriptor) -> String {
    format!(
        "Rewrite the following text to have a {} tone. \
Maintain the same meaning and content, but adjust the language style accordingly. \
Return ONLY the rewritten text without any explanations, quotes, or formatting.\n\n\
Original text: \"{}\"\n\n\
Rewritten text:",
        tone.description, text
    )
}
