//! Classification of lines typed at the client prompt
//!
//! A few commands are handled by the client itself; everything else goes to
//! the server untouched.

pub const HELP_TEXT: &str = "\
Available commands:
/join <channel> - Join a channel
/leave <channel> - Leave current channel
/channels - List all channels
/msg <nick> <message> - Send private message
/reconnect - Reconnect to server
/quit - Disconnect from server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Print the command list locally
    Help,
    /// Rebind the socket and register again under the same nickname
    Reconnect,
    /// Tell the server we are leaving, then exit
    Quit,
    /// Send the line to the server as typed
    Forward(String),
    /// Nothing worth sending
    Skip,
}

impl InputAction {
    pub fn from_line(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return InputAction::Skip;
        }

        if trimmed.eq_ignore_ascii_case("/quit") {
            InputAction::Quit
        } else if trimmed.eq_ignore_ascii_case("/reconnect") {
            InputAction::Reconnect
        } else if trimmed.eq_ignore_ascii_case("/help") {
            InputAction::Help
        } else {
            InputAction::Forward(line.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

/// Normalises a nickname entered at the prompt; `None` if nothing usable
pub fn parse_nickname(line: &str) -> Option<String> {
    line.split_whitespace().next().map(str::to_string)
}
