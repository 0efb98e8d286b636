//! Driver-level round trips over an in-memory duplex stream.

mod common;

use std::time::Duration;

use bytes::Bytes;
use chunkwire::chunk::ChunkHeader;
use chunkwire::connection::Connection;
use chunkwire::handshake::{HANDSHAKE_SIZE, Role};
use chunkwire::message::{CommandCall, Message, Packet, ServiceCall};
use chunkwire_testing::{TestCodec, TestValue};
use common::{decoder, encoder};

fn connection(
    io: tokio::io::DuplexStream,
    role: Role,
) -> Connection<tokio::io::DuplexStream, TestCodec> {
    Connection::new(io, role, decoder(), encoder())
}

fn invoke_packet(invoke_id: u32, method: &str) -> Packet<TestValue> {
    Packet {
        header: ChunkHeader {
            channel_id: 3,
            timestamp: 0,
            size: 0,
            type_code: 0,
            stream_id: 0,
        },
        message: Message::Invoke(CommandCall {
            invoke_id,
            connection_params: None,
            call: ServiceCall::parse(method, Vec::new()),
        }),
    }
}

#[tokio::test]
async fn drivers_complete_the_handshake_and_exchange_packets() {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let mut client = connection(client_io, Role::Client);
    let mut server = connection(server_io, Role::Server);

    let exchange = async {
        let server_task = async {
            let packet = server
                .recv()
                .await
                .expect("server receives cleanly")
                .expect("one packet before close");
            server
                .send(&invoke_packet(1, "connect.result"))
                .await
                .expect("reply sent");
            packet
        };

        let client_task = async {
            let seed = vec![0x5C_u8; HANDSHAKE_SIZE];
            client.start(&seed).await.expect("handshake request sent");
            client
                .complete_handshake()
                .await
                .expect("handshake completes");
            client
                .send(&invoke_packet(1, "com.example.app.connect"))
                .await
                .expect("invoke sent");
            client
                .recv()
                .await
                .expect("client receives cleanly")
                .expect("one reply before close")
        };

        tokio::join!(server_task, client_task)
    };
    let (received_by_server, received_by_client) =
        tokio::time::timeout(Duration::from_secs(5), exchange)
            .await
            .expect("exchange completes");

    let Message::Invoke(command) = &received_by_server.message else {
        panic!("server expected an invoke");
    };
    assert_eq!(command.call.service_name.as_deref(), Some("com.example.app"));
    assert_eq!(command.call.method_name, "connect");
    assert!(server.state().handshake().is_established());

    let Message::Invoke(command) = &received_by_client.message else {
        panic!("client expected an invoke");
    };
    assert_eq!(command.call.method_name, "result");
    assert!(client.state().handshake().is_established());
}

#[tokio::test]
async fn clean_close_at_a_packet_boundary_yields_none() {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let client = connection(client_io, Role::Client);
    let mut server = connection(server_io, Role::Server);

    let server_task = async {
        let first = server.recv().await.expect("receives cleanly");
        assert!(first.is_some(), "one media packet expected");
        let end = server.recv().await.expect("clean close");
        assert!(end.is_none());
    };

    let client_task = async move {
        let mut client = client;
        let seed = vec![0x00_u8; HANDSHAKE_SIZE];
        client.start(&seed).await.expect("handshake request sent");
        client
            .complete_handshake()
            .await
            .expect("handshake completes");
        client
            .send(&Packet {
                header: ChunkHeader {
                    channel_id: 4,
                    timestamp: 5,
                    size: 0,
                    type_code: 0,
                    stream_id: 1,
                },
                message: Message::Audio(Bytes::from_static(&[0x77; 160])),
            })
            .await
            .expect("audio sent");
        // Dropping the client closes the stream at a packet boundary.
        drop(client);
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(server_task, client_task)
    })
    .await
    .expect("close sequence completes");
}
