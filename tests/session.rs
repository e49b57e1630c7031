mod common;

use bytes::Bytes;
use common::*;
use muxado::frame::{Data, Frame, GoAway};
use muxado::{Error, Reason, SessionBuilder};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn open_accept_round_trip() {
    trace_init();
    let (client, server) = session_pair();

    let send = async {
        let mut stream = client.open().await.unwrap();
        assert_eq!(stream.id(), 3);
        stream.write_all(b"ping").await.unwrap();
        stream.shutdown().await.unwrap();
        stream
    };
    let recv = async {
        let mut stream = server.accept().await.unwrap();
        assert_eq!(stream.id(), 3);
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"ping");
        stream
    };
    let (_sent, _received) = tokio::join!(send, recv);
}

#[tokio::test]
async fn open_allocates_ids_by_parity() {
    trace_init();
    let (client, server) = session_pair();

    assert_eq!(client.open().await.unwrap().id(), 3);
    assert_eq!(client.open().await.unwrap().id(), 5);
    assert_eq!(server.open().await.unwrap().id(), 2);
    assert_eq!(server.open().await.unwrap().id(), 4);
}

#[tokio::test]
async fn syn_payload_and_fin_are_delivered() {
    trace_init();
    let (client, mut peer) = client_with_raw_peer();

    let mut syn = Data::new(2.into(), Bytes::from_static(b"early"));
    syn.set_syn();
    syn.set_fin();
    peer.send(syn).await;

    let mut stream = client.accept().await.unwrap();
    assert_eq!(stream.id(), 2);
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    assert_eq!(buf, b"early");
}

#[tokio::test]
async fn out_of_order_syn_is_fatal() {
    trace_init();
    let (client, mut peer) = client_with_raw_peer();

    peer.send(Data::syn(6.into())).await;
    let stream = client.accept().await.unwrap();
    assert_eq!(stream.id(), 6);

    // going backwards is a protocol violation
    peer.send(Data::syn(4.into())).await;

    let (local, _, _) = client.wait().await;
    assert!(matches!(local, Some(Error::Protocol(_))), "got {local:?}");

    // the peer is told why
    match peer.recv_not_wndinc().await {
        Frame::GoAway(go_away) => {
            assert_eq!(go_away.reason(), Reason::PROTOCOL_ERROR);
            assert_eq!(go_away.last_stream_id(), 6);
        }
        other => panic!("expected GOAWAY, got {other:?}"),
    }

    // blocked and future acceptors observe the cause
    assert!(matches!(client.accept().await, Err(Error::Protocol(_))));
}

#[tokio::test]
async fn replayed_syn_is_fatal() {
    trace_init();
    let (client, mut peer) = client_with_raw_peer();

    peer.send(Data::syn(2.into())).await;
    let stream = client.accept().await.unwrap();
    assert_eq!(stream.id(), 2);

    // re-creating a live stream id must not be possible
    peer.send(Data::syn(2.into())).await;

    let (local, _, _) = client.wait().await;
    assert!(matches!(local, Some(Error::Protocol(_))));
}

#[tokio::test]
async fn wrong_parity_syn_is_fatal() {
    trace_init();
    // the peer of a client is a server; odd ids are ours, not theirs
    let (client, mut peer) = client_with_raw_peer();

    peer.send(Data::syn(7.into())).await;

    let (local, _, _) = client.wait().await;
    assert!(matches!(local, Some(Error::Protocol(_))), "got {local:?}");
}

#[tokio::test]
async fn frame_for_unassigned_id_is_fatal() {
    trace_init();
    let (client, mut peer) = client_with_raw_peer();

    // no stream 8 was ever announced with a SYN
    peer.send(Data::new(8.into(), Bytes::from_static(b"hi"))).await;

    let (local, _, _) = client.wait().await;
    assert!(matches!(local, Some(Error::Protocol(_))), "got {local:?}");
}

#[tokio::test(start_paused = true)]
async fn accept_queue_overflow_refuses_stream() {
    trace_init();
    let (a, b) = tokio::io::duplex(64 * 1024);
    let mut builder = SessionBuilder::new();
    builder.accept_queue_depth(2);
    let client = builder.client(a);
    let mut peer = RawPeer::new(b);

    peer.send(Data::syn(2.into())).await;
    peer.send(Data::syn(4.into())).await;
    // nobody calls accept, so the third stream can't be queued
    peer.send(Data::syn(6.into())).await;

    match peer.recv_not_wndinc().await {
        Frame::Reset(reset) => {
            assert_eq!(reset.stream_id(), 6);
            assert_eq!(reset.reason(), Reason::ACCEPT_QUEUE_FULL);
        }
        other => panic!("expected RST, got {other:?}"),
    }

    // the refused stream left no table entry: DATA for it is answered with
    // STREAM_CLOSED, and the session is still alive
    peer.send(Data::new(6.into(), Bytes::from_static(b"x"))).await;
    match peer.recv_not_wndinc().await {
        Frame::Reset(reset) => {
            assert_eq!(reset.stream_id(), 6);
            assert_eq!(reset.reason(), Reason::STREAM_CLOSED);
        }
        other => panic!("expected RST, got {other:?}"),
    }

    // the queued streams are still deliverable
    assert_eq!(client.accept().await.unwrap().id(), 2);
    assert_eq!(client.accept().await.unwrap().id(), 4);
}

#[tokio::test]
async fn go_away_refuses_new_streams() {
    trace_init();
    let (client, mut peer) = client_with_raw_peer();

    let mut stream = client.open().await.unwrap();
    match peer.recv().await {
        Frame::Data(data) => assert!(data.is_syn()),
        other => panic!("expected SYN, got {other:?}"),
    }

    client
        .go_away(Reason::NO_ERROR, Bytes::from_static(b"bye"), None)
        .await
        .unwrap();
    match peer.recv().await {
        Frame::GoAway(go_away) => {
            assert_eq!(go_away.reason(), Reason::NO_ERROR);
            assert_eq!(&go_away.debug()[..], b"bye");
        }
        other => panic!("expected GOAWAY, got {other:?}"),
    }

    // a SYN after our departure is refused, not fatal
    peer.send(Data::syn(2.into())).await;
    match peer.recv_not_wndinc().await {
        Frame::Reset(reset) => {
            assert_eq!(reset.stream_id(), 2);
            assert_eq!(reset.reason(), Reason::STREAM_REFUSED);
        }
        other => panic!("expected RST, got {other:?}"),
    }

    // existing streams keep working
    stream.write_all(b"still here").await.unwrap();
    match peer.recv_not_wndinc().await {
        Frame::Data(data) => {
            assert_eq!(data.stream_id(), 3);
            assert_eq!(&data.payload()[..], b"still here");
        }
        other => panic!("expected DATA, got {other:?}"),
    }

    // a second go_away is fine
    client
        .go_away(Reason::NO_ERROR, Bytes::from_static(b"bye again"), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn remote_go_away_truncates_unseen_streams() {
    trace_init();
    let (client, mut peer) = client_with_raw_peer();

    let mut s3 = client.open().await.unwrap();
    let _s5 = client.open().await.unwrap();
    let mut s7 = client.open().await.unwrap();
    let mut s9 = client.open().await.unwrap();

    peer.send(GoAway::new(
        5.into(),
        Reason::NO_ERROR,
        Bytes::from_static(b"moving on"),
    ))
    .await;

    // streams above the peer's last seen id were never observed there
    let mut buf = [0u8; 8];
    let err = s7.read(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
    let err = s9.read(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);

    // no new streams either
    assert!(matches!(client.open().await, Err(Error::RemoteGoneAway)));

    // 3 and 5 are unaffected
    s3.write_all(b"ok").await.unwrap();
    loop {
        match peer.recv_not_wndinc().await {
            Frame::Data(data) if data.is_syn() => continue,
            Frame::Data(data) => {
                assert_eq!(data.stream_id(), 3);
                assert_eq!(&data.payload()[..], b"ok");
                break;
            }
            other => panic!("expected DATA, got {other:?}"),
        }
    }

    // peer EOF completes a graceful shutdown carrying its diagnostics
    drop(peer);
    let (local, remote, debug) = client.wait().await;
    assert!(local.is_none(), "got {local:?}");
    assert!(matches!(remote, Some(Error::Remote { .. })), "got {remote:?}");
    assert_eq!(&debug[..], b"moving on");
}

#[tokio::test]
async fn close_is_idempotent() {
    trace_init();
    let (client, server) = session_pair();

    client.close().await.unwrap();
    assert!(matches!(client.close().await, Err(Error::SessionClosed)));
    assert!(matches!(client.close().await, Err(Error::SessionClosed)));

    // every operation fails fast afterwards
    assert!(client.open().await.is_err());

    // the peer shuts down cleanly, with our NO_ERROR goaway on record
    let (local, remote, _) = server.wait().await;
    assert!(local.is_none(), "got {local:?}");
    assert!(matches!(remote, Some(Error::Remote { .. })), "got {remote:?}");
}

#[tokio::test]
async fn accept_unblocks_on_close() {
    trace_init();
    let (client, server) = session_pair();

    let acceptor = tokio::spawn(async move { server.accept().await });
    client.close().await.unwrap();

    let res = acceptor.await.unwrap();
    assert!(res.is_err());
}

#[tokio::test]
async fn synthetic_addresses() {
    trace_init();
    let (client, _server) = session_pair();

    // an in-memory duplex has no socket addresses to forward
    assert_eq!(client.local_addr().network(), "muxado");
    assert_eq!(client.local_addr().to_string(), "muxado: local");
    assert_eq!(client.peer_addr().to_string(), "muxado: remote");
    assert_eq!(client.addr(), client.local_addr());
}
