// Tests for the session protocol handlers
//
// A recording transport captures every emitted event so broadcasts can be
// checked recipient by recipient.

use syncwatch::protocol::{
    JoinReply, JoinSnapshot, MembershipUpdate, RelayedControl, ServerEvent, SessionProtocol,
    Transport, VideoControl,
};
use syncwatch::session::{ConnectionId, PlaybackAction, SessionStore};

#[derive(Default)]
struct RecordingTransport {
    sent: Vec<(ConnectionId, ServerEvent)>,
}

impl Transport for RecordingTransport {
    fn emit(&mut self, to: &ConnectionId, event: &ServerEvent) {
        self.sent.push((to.clone(), event.clone()));
    }
}

impl RecordingTransport {
    fn recipients(&self) -> Vec<ConnectionId> {
        self.sent.iter().map(|(to, _)| to.clone()).collect()
    }

    fn take(&mut self) -> Vec<(ConnectionId, ServerEvent)> {
        std::mem::take(&mut self.sent)
    }
}

fn conn(id: &str) -> ConnectionId {
    ConnectionId::from(id)
}

fn protocol_with_session(id: &str, url: &str) -> SessionProtocol {
    let mut protocol = SessionProtocol::new(SessionStore::new());
    protocol.create_session(id, url);
    protocol
}

fn snapshot(reply: JoinReply) -> JoinSnapshot {
    match reply {
        JoinReply::Snapshot(s) => s,
        JoinReply::Error { error } => panic!("expected snapshot, got error: {}", error),
    }
}

fn control(action: PlaybackAction, progress: f64) -> VideoControl {
    VideoControl { action, progress }
}

#[test]
fn test_join_unknown_session_returns_error_without_broadcast() {
    let mut protocol = SessionProtocol::new(SessionStore::new());
    let mut transport = RecordingTransport::default();

    let reply = protocol.join(&conn("X"), "missing", &mut transport);

    assert_eq!(reply, JoinReply::error("Session not found"));
    assert!(transport.sent.is_empty());
    assert!(protocol.store().sessions_of(&conn("X")).is_empty());
}

#[test]
fn test_end_to_end_two_joins() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();

    let first = snapshot(protocol.join(&conn("X"), "s1", &mut transport));
    assert_eq!(
        first,
        JoinSnapshot {
            video_url: "http://v".to_string(),
            users: vec![conn("X")],
            progress: 0.0,
            is_playing: false,
        }
    );
    assert!(transport.sent.is_empty(), "first joiner notifies nobody");

    let second = snapshot(protocol.join(&conn("Y"), "s1", &mut transport));
    assert!(second.users.contains(&conn("X")));
    assert!(second.users.contains(&conn("Y")));

    assert_eq!(
        transport.take(),
        vec![(
            conn("X"),
            ServerEvent::UserJoined(MembershipUpdate {
                user_id: conn("Y"),
                users: vec![conn("X"), conn("Y")],
            })
        )]
    );
}

#[test]
fn test_each_join_notifies_only_earlier_members() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();
    let ids: Vec<ConnectionId> = (0..5).map(|i| conn(&format!("c{}", i))).collect();

    for (n, id) in ids.iter().enumerate() {
        protocol.join(id, "s1", &mut transport);
        let recipients = transport.recipients();
        transport.take();

        assert_eq!(recipients, ids[..n].to_vec(), "join #{} recipients", n);
    }

    let session = protocol.store().get_session("s1").unwrap();
    assert_eq!(session.members().len(), ids.len());
}

#[test]
fn test_snapshot_reflects_last_event() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();

    protocol.video_control(&conn("X"), "s1", control(PlaybackAction::Play, 0.0), &mut transport);
    protocol.video_control(&conn("X"), "s1", control(PlaybackAction::Seek, 42.0), &mut transport);

    let late = snapshot(protocol.join(&conn("Z"), "s1", &mut transport));
    assert_eq!(late.progress, 42.0);
    assert!(!late.is_playing);
}

#[test]
fn test_snapshot_is_playing_after_play() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();

    protocol.video_control(&conn("X"), "s1", control(PlaybackAction::Pause, 3.0), &mut transport);
    protocol.video_control(&conn("X"), "s1", control(PlaybackAction::Play, 7.5), &mut transport);

    let late = snapshot(protocol.join(&conn("Z"), "s1", &mut transport));
    assert_eq!(late.progress, 7.5);
    assert!(late.is_playing);
}

#[test]
fn test_video_control_relays_to_others_only() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();
    for id in ["X", "Y", "Z"] {
        protocol.join(&conn(id), "s1", &mut transport);
    }
    transport.take();

    let ctl = control(PlaybackAction::Pause, 12.0);
    assert!(protocol.video_control(&conn("Y"), "s1", ctl, &mut transport));

    let expected = ServerEvent::VideoControl(RelayedControl {
        user_id: conn("Y"),
        video_control: ctl,
    });
    assert_eq!(
        transport.take(),
        vec![(conn("X"), expected.clone()), (conn("Z"), expected)]
    );
    assert_eq!(protocol.store().last_event("s1").unwrap().progress, 12.0);
}

#[test]
fn test_video_control_for_unknown_session_is_dropped() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();
    protocol.join(&conn("X"), "s1", &mut transport);
    transport.take();

    let relayed = protocol.video_control(
        &conn("X"),
        "missing",
        control(PlaybackAction::Play, 1.0),
        &mut transport,
    );

    assert!(!relayed);
    assert!(transport.sent.is_empty());
    assert!(protocol.store().last_event("s1").is_none());
}

#[test]
fn test_disconnect_from_multiple_sessions() {
    let mut protocol = SessionProtocol::new(SessionStore::new());
    protocol.create_session("A", "http://a");
    protocol.create_session("B", "http://b");
    let mut transport = RecordingTransport::default();

    protocol.join(&conn("X"), "A", &mut transport);
    protocol.join(&conn("X"), "B", &mut transport);
    protocol.join(&conn("P"), "A", &mut transport);
    protocol.join(&conn("Q"), "B", &mut transport);
    transport.take();

    let left = protocol.disconnect(&conn("X"), &mut transport);
    assert_eq!(left, 2);

    assert_eq!(
        transport.take(),
        vec![
            (
                conn("P"),
                ServerEvent::UserLeft(MembershipUpdate {
                    user_id: conn("X"),
                    users: vec![conn("P")],
                })
            ),
            (
                conn("Q"),
                ServerEvent::UserLeft(MembershipUpdate {
                    user_id: conn("X"),
                    users: vec![conn("Q")],
                })
            ),
        ]
    );

    let store = protocol.store();
    assert!(!store.get_session("A").unwrap().is_member(&conn("X")));
    assert!(!store.get_session("B").unwrap().is_member(&conn("X")));
    assert!(store.sessions_of(&conn("X")).is_empty());
}

#[test]
fn test_disconnect_unjoined_connection_is_silent() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();

    assert_eq!(protocol.disconnect(&conn("ghost"), &mut transport), 0);
    assert!(transport.sent.is_empty());
}

#[test]
fn test_malformed_video_control_frame_is_dropped() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();
    protocol.join(&conn("X"), "s1", &mut transport);
    protocol.join(&conn("Y"), "s1", &mut transport);
    transport.take();

    let frames = [
        r#"{"event":"videoControl","args":["s1",{"type":"PLAY"}]}"#,
        r#"{"event":"videoControl","args":["s1"]}"#,
        r#"{"event":"videoControl","args":["s1",{"type":"JUMP","progress":1}]}"#,
        r#"{"event":"videoControl","args":["s1",{"type":"PLAY","progress":1}],"ack":3}"#,
        "garbage",
    ];

    // Only the last well-formed frame (index 3) gets through, and it is never acked
    for frame in &frames[..3] {
        assert!(protocol.handle_frame(&conn("X"), frame, &mut transport).is_none());
    }
    assert!(transport.sent.is_empty());
    assert!(protocol.store().last_event("s1").is_none());

    assert!(protocol
        .handle_frame(&conn("X"), frames[3], &mut transport)
        .is_none());
    assert_eq!(transport.recipients(), vec![conn("Y")]);

    assert!(protocol
        .handle_frame(&conn("X"), frames[4], &mut transport)
        .is_none());
    assert_eq!(transport.sent.len(), 1);
}

#[test]
fn test_join_frame_is_acked() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();

    let ack = protocol
        .handle_frame(
            &conn("X"),
            r#"{"event":"joinSession","args":["s1"],"ack":9}"#,
            &mut transport,
        )
        .expect("join with ack id should be answered");

    assert_eq!(ack.ack, 9);
    let snap = snapshot(ack.data);
    assert_eq!(snap.users, vec![conn("X")]);

    // Without an ack id the join still happens but nothing is returned
    let none = protocol.handle_frame(
        &conn("Y"),
        r#"{"event":"joinSession","args":["s1"]}"#,
        &mut transport,
    );
    assert!(none.is_none());
    assert_eq!(protocol.store().get_session("s1").unwrap().members().len(), 2);
}

#[test]
fn test_malformed_join_frame_gets_error_ack() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();

    let ack = protocol
        .handle_frame(&conn("X"), r#"{"event":"joinSession","args":[],"ack":1}"#, &mut transport)
        .unwrap();
    assert_eq!(ack.data, JoinReply::error("Invalid joinSession payload"));

    let missing = protocol
        .handle_frame(
            &conn("X"),
            r#"{"event":"joinSession","args":["nope"],"ack":2}"#,
            &mut transport,
        )
        .unwrap();
    assert_eq!(missing.data, JoinReply::error("Session not found"));
    assert!(transport.sent.is_empty());
}

#[test]
fn test_end_session_resets_late_joiners() {
    let mut protocol = protocol_with_session("s1", "http://v");
    let mut transport = RecordingTransport::default();
    protocol.video_control(&conn("X"), "s1", control(PlaybackAction::Play, 30.0), &mut transport);

    assert!(protocol.end_session("s1"));
    assert!(!protocol.end_session("missing"));

    let late = snapshot(protocol.join(&conn("Z"), "s1", &mut transport));
    assert_eq!(late.progress, 0.0);
    assert!(!late.is_playing);
    assert_eq!(
        protocol.store().last_event("s1").unwrap().action,
        PlaybackAction::End
    );
}

#[test]
fn test_empty_session_id_is_joinable_when_created() {
    let mut protocol = protocol_with_session("", "http://v");
    let mut transport = RecordingTransport::default();

    let ack = protocol
        .handle_frame(
            &conn("Y"),
            r#"{"event":"joinSession","args":[""],"ack":1}"#,
            &mut transport,
        )
        .unwrap();
    assert_eq!(snapshot(ack.data).users, vec![conn("Y")]);

    // Without a matching session the empty id is an ordinary not-found
    let mut empty = SessionProtocol::new(SessionStore::new());
    let ack = empty
        .handle_frame(
            &conn("Y"),
            r#"{"event":"joinSession","args":[""],"ack":2}"#,
            &mut transport,
        )
        .unwrap();
    assert_eq!(ack.data, JoinReply::error("Session not found"));
}
