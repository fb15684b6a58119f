pub const DEFAULT_PORT: u16 = 9876;
pub const MAX_PACKET_SIZE: usize = 1024;

pub const HISTORY_END: &str = "--- End of history ---";
pub const NO_ACTIVE_CHANNELS: &str = "No active channels";
pub const IDLE_DISCONNECT: &str = "Disconnected due to inactivity";

/// A parsed inbound payload.
///
/// Parsing splits on single spaces into at most three parts (keyword, first
/// argument, remainder), so private message text keeps its own spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Nick { name: String },
    Join { channel: String },
    Leave { channel: String },
    Channels,
    Msg { to: String, text: String },
    Quit,
    Chat { text: String },
}

impl Command {
    /// Returns `None` for a recognised keyword with missing arguments.
    pub fn parse(payload: &str) -> Option<Command> {
        let mut parts = payload.splitn(3, ' ');
        let keyword = parts.next().unwrap_or_default();
        let first = parts.next().filter(|arg| !arg.is_empty());
        let rest = parts.next().filter(|arg| !arg.is_empty());

        match keyword {
            "/nick" => first.map(|name| Command::Nick {
                name: name.to_string(),
            }),
            "/join" => first.map(|channel| Command::Join {
                channel: channel.to_string(),
            }),
            "/leave" => first.map(|channel| Command::Leave {
                channel: channel.to_string(),
            }),
            "/channels" => Some(Command::Channels),
            "/msg" => match (first, rest) {
                (Some(to), Some(text)) => Some(Command::Msg {
                    to: to.to_string(),
                    text: text.to_string(),
                }),
                _ => None,
            },
            "/quit" => Some(Command::Quit),
            _ => Some(Command::Chat {
                text: payload.to_string(),
            }),
        }
    }
}

pub fn welcome(name: &str) -> String {
    format!("Welcome {}! Type /join <channel> to join a channel.", name)
}

pub fn name_taken(name: &str) -> String {
    format!("Nickname {} is already taken", name)
}

pub fn user_not_found(name: &str) -> String {
    format!("User {} not found", name)
}

pub fn history_start(channel: &str) -> String {
    format!("--- Channel history for {} ---", channel)
}

pub fn left_notice(channel: &str) -> String {
    format!("You left channel: {}", channel)
}

pub fn joined_line(name: &str) -> String {
    format!("{} has joined the channel", name)
}

pub fn departed_line(name: &str) -> String {
    format!("{} has left the channel", name)
}

pub fn chat_line(name: &str, text: &str) -> String {
    format!("{}: {}", name, text)
}

pub fn channel_line(channel: &str, line: &str) -> String {
    format!("[{}] {}", channel, line)
}

pub fn global_line(name: &str, text: &str) -> String {
    format!("[Global] {}: {}", name, text)
}

pub fn pm_from(sender: &str, text: &str) -> String {
    format!("[PM from {}] {}", sender, text)
}

pub fn pm_to(recipient: &str, text: &str) -> String {
    format!("[PM to {}] {}", recipient, text)
}

/// Formats the `/channels` reply from `(name, member count)` pairs.
pub fn channel_listing(channels: &[(String, usize)]) -> String {
    if channels.is_empty() {
        return NO_ACTIVE_CHANNELS.to_string();
    }

    let mut listing = String::from("Active channels:\n");
    for (name, members) in channels {
        listing.push_str(&format!("{} ({} users)\n", name, members));
    }
    listing
}
