use super::parser::SINGLE_TAG;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Reserved for per-channel expanded settings, currently does nothing
    ToggleExpanded,
    Unknown(String),
}

impl Command {
    fn parse(raw: &str) -> Option<Self> {
        let name = raw.strip_prefix('!')?;
        let command = match name.to_lowercase().as_str() {
            "help" => Command::Help,
            "toggle expanded" => Command::ToggleExpanded,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Pull `{!command}` style tags out of `text`.
///
/// Returns the text with every command tag removed, so none of them is looked
/// up as a title afterwards, together with the commands in message order.
pub fn extract_commands(text: &str) -> (String, Vec<Command>) {
    let mut remaining = text.to_string();
    let mut commands = Vec::new();

    for tag in SINGLE_TAG.find_iter(text) {
        let raw: String = tag
            .as_str()
            .chars()
            .filter(|c| !matches!(c, '<' | '>' | '{' | '}' | '[' | ']'))
            .collect();

        if let Some(command) = Command::parse(raw.trim()) {
            commands.push(command);
            remaining = remaining.replace(tag.as_str(), "");
        }
    }

    (remaining, commands)
}
