//! Message routing: turns one inbound payload into outbound datagrams
//!
//! The router is stateless. Each call borrows the chat state mutably for the
//! duration of one packet, applies the command, and returns everything that
//! has to be sent as a result. Sending is left to the network layer so that a
//! failing recipient can never interrupt the state change itself.

use crate::state::{
    Arrival, ChatState, Departure, PrivateDelivery, Registration, Relay, Removal,
};
use log::debug;
use shared::{
    channel_line, channel_listing, departed_line, global_line, history_start, joined_line,
    left_notice, name_taken, pm_from, pm_to, user_not_found, welcome, Command, HISTORY_END,
    IDLE_DISCONNECT,
};
use std::net::SocketAddr;
use std::time::Duration;

/// A single datagram to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub addr: SocketAddr,
    pub text: String,
}

impl Outbound {
    pub fn new(addr: SocketAddr, text: impl Into<String>) -> Self {
        Self {
            addr,
            text: text.into(),
        }
    }
}

/// Applies one inbound payload from `peer` and returns the resulting sends
pub fn route(state: &mut ChatState, peer: SocketAddr, payload: &str) -> Vec<Outbound> {
    state.touch(peer);

    let Some(command) = Command::parse(payload) else {
        debug!("Ignoring malformed command from {}: {:?}", peer, payload);
        return Vec::new();
    };

    let mut outbox = Outbox::default();
    match command {
        Command::Nick { name } => match state.register(peer, &name) {
            Registration::Registered { departure } => {
                outbox.departure(departure);
                outbox.push(peer, welcome(&name));
            }
            Registration::NameTaken => outbox.push(peer, name_taken(&name)),
        },
        Command::Join { channel } => {
            if let Some(arrival) = state.join(peer, &channel) {
                outbox.arrival(peer, arrival);
            }
        }
        Command::Leave { channel } => outbox.departure(state.leave(peer, &channel)),
        Command::Channels => {
            let channels: Vec<(String, usize)> = state
                .channel_summaries()
                .into_iter()
                .map(|summary| (summary.name, summary.members))
                .collect();
            outbox.push(peer, channel_listing(&channels));
        }
        Command::Msg { to, text } => match state.private_message(peer, &to) {
            Some(PrivateDelivery::Deliver { sender, recipient }) => {
                outbox.push(recipient, pm_from(&sender, &text));
                outbox.push(peer, pm_to(&to, &text));
            }
            Some(PrivateDelivery::UnknownRecipient) => outbox.push(peer, user_not_found(&to)),
            None => {}
        },
        Command::Quit => outbox.removal(state.remove(peer)),
        Command::Chat { text } => match state.relay(peer, &text) {
            Some(Relay::Channel {
                channel,
                line,
                recipients,
            }) => outbox.fan_out(&recipients, &channel_line(&channel, &line)),
            Some(Relay::Global { name, recipients }) => {
                outbox.fan_out(&recipients, &global_line(&name, &text))
            }
            None => debug!("Dropping chat line from unregistered peer {}", peer),
        },
    }

    outbox.into_messages()
}

/// Removes a session that is still idle, notifying its channel and the peer
///
/// Returns nothing when the peer was heard from since the idle scan.
pub fn expire(state: &mut ChatState, peer: SocketAddr, timeout: Duration) -> Vec<Outbound> {
    let mut outbox = Outbox::default();
    if let Some(removal) = state.remove_if_idle(peer, timeout) {
        outbox.removal(Some(removal));
        outbox.push(peer, IDLE_DISCONNECT);
    }
    outbox.into_messages()
}

#[derive(Default)]
struct Outbox {
    messages: Vec<Outbound>,
}

impl Outbox {
    fn push(&mut self, addr: SocketAddr, text: impl Into<String>) {
        self.messages.push(Outbound::new(addr, text));
    }

    fn fan_out(&mut self, recipients: &[SocketAddr], text: &str) {
        for addr in recipients {
            self.push(*addr, text);
        }
    }

    fn departure(&mut self, departure: Option<Departure>) {
        let Some(departure) = departure else {
            return;
        };

        self.push(departure.peer, left_notice(&departure.channel));
        self.fan_out(
            &departure.recipients,
            &channel_line(&departure.channel, &departed_line(&departure.name)),
        );
        if departure.closed {
            debug!("Channel {} closed", departure.channel);
        }
    }

    fn arrival(&mut self, peer: SocketAddr, arrival: Arrival) {
        self.departure(arrival.departure);

        self.push(peer, history_start(&arrival.channel));
        for line in arrival.history {
            self.push(peer, line);
        }
        self.push(peer, HISTORY_END);

        self.fan_out(
            &arrival.recipients,
            &channel_line(&arrival.channel, &joined_line(&arrival.name)),
        );
    }

    fn removal(&mut self, removal: Option<Removal>) {
        if let Some(removal) = removal {
            self.departure(removal.departure);
        }
    }

    fn into_messages(self) -> Vec<Outbound> {
        self.messages
    }
}
