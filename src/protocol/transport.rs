use super::messages::ServerEvent;
use crate::session::ConnectionId;

/// Outbound delivery used by the protocol handlers.
///
/// Sends are fire-and-forget: an implementation must not block the caller
/// waiting for a recipient, and a failed delivery affects only that recipient.
pub trait Transport {
    /// Deliver an event to a single connection
    fn emit(&mut self, to: &ConnectionId, event: &ServerEvent);

    /// Room broadcast: deliver to every member except `except`.
    ///
    /// Returns the number of recipients the event was handed to.
    fn broadcast(
        &mut self,
        members: &[ConnectionId],
        except: Option<&ConnectionId>,
        event: &ServerEvent,
    ) -> usize {
        let mut recipients = 0;
        for member in members {
            if Some(member) == except {
                continue;
            }
            self.emit(member, event);
            recipients += 1;
        }
        recipients
    }
}
