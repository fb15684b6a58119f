//! Channel registry: member sets and append-only history per channel

use std::collections::{BTreeMap, HashSet};

/// A named group of sessions with its replayable history
#[derive(Debug, Default)]
pub struct Channel {
    /// Display names of the current members
    pub members: HashSet<String>,
    /// Notices and chat lines in the order they happened
    pub history: Vec<String>,
}

/// Name and size of a channel, as reported by `/channels`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub name: String,
    pub members: usize,
}

/// All live channels, ordered by name
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: BTreeMap<String, Channel>,
}

impl ChannelRegistry {
    /// Creates a registry with no channels
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` to `channel`, creating the channel on first use
    ///
    /// A new channel starts with empty history. Returns the channel so the
    /// caller can snapshot its history before anything else is appended.
    pub fn add_member(&mut self, channel: &str, name: &str) -> &Channel {
        let entry = self.channels.entry(channel.to_string()).or_default();
        entry.members.insert(name.to_string());
        entry
    }

    /// Removes `name` from `channel`
    ///
    /// Returns false if it was not a member. The channel itself stays until
    /// `remove_if_empty` is called, so a departure notice can still be
    /// appended to its history.
    pub fn remove_member(&mut self, channel: &str, name: &str) -> bool {
        self.channels
            .get_mut(channel)
            .is_some_and(|entry| entry.members.remove(name))
    }

    /// Records a line at the end of the channel's history
    ///
    /// History is append-only and never trimmed while the channel lives.
    /// Lines for a channel that does not exist are dropped.
    pub fn append(&mut self, channel: &str, line: String) {
        if let Some(entry) = self.channels.get_mut(channel) {
            entry.history.push(line);
        }
    }

    /// Drops the channel and its history once nobody is left in it
    ///
    /// Returns true if the channel was deleted. A later join under the same
    /// name starts over with empty history.
    pub fn remove_if_empty(&mut self, channel: &str) -> bool {
        let empty = self
            .channels
            .get(channel)
            .is_some_and(|entry| entry.members.is_empty());
        if empty {
            self.channels.remove(channel);
        }
        empty
    }

    /// Looks up a channel by name
    pub fn get(&self, channel: &str) -> Option<&Channel> {
        self.channels.get(channel)
    }

    pub fn contains(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Returns true if `name` is currently in `channel`
    pub fn is_member(&self, channel: &str, name: &str) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|entry| entry.members.contains(name))
    }

    /// Members of `channel` other than `exclude`
    ///
    /// Used to build the audience of a notice or chat line, which never
    /// includes the session that caused it. Empty for unknown channels.
    pub fn members_except(&self, channel: &str, exclude: Option<&str>) -> Vec<String> {
        self.channels
            .get(channel)
            .map(|entry| {
                entry
                    .members
                    .iter()
                    .filter(|member| Some(member.as_str()) != exclude)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Iterates over channels in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Channel)> {
        self.channels.iter()
    }

    /// Name and member count of every live channel, sorted by name
    pub fn summaries(&self) -> Vec<ChannelSummary> {
        self.channels
            .iter()
            .map(|(name, entry)| ChannelSummary {
                name: name.clone(),
                members: entry.members.len(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
