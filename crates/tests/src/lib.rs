//! # Integration Tests
//!
//! End-to-end coverage in two layers:
//! - In-process pipeline tests: reorderer → dispatcher → recording sinks.
//! - Real-TCP scenarios against a full server on ephemeral ports.

#[cfg(test)]
mod pipeline_tests {
    use std::sync::{Arc, Mutex};

    use contracts::{ClientSink, Event, RelayError, UserId};
    use dispatcher::{ClientHandle, ClientRegistry, Dispatcher};
    use reorderer::Reorderer;
    use tokio::sync::mpsc;

    struct RecordingSink {
        user_id: UserId,
        lines: Arc<Mutex<Vec<String>>>,
    }

    impl ClientSink for RecordingSink {
        fn user_id(&self) -> UserId {
            self.user_id
        }

        async fn send(&mut self, line: &[u8]) -> Result<(), RelayError> {
            self.lines
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(line).into_owned());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), RelayError> {
            Ok(())
        }
    }

    fn register(registry: &ClientRegistry, user_id: UserId, token: u64) -> Arc<Mutex<Vec<String>>> {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = RecordingSink {
            user_id,
            lines: Arc::clone(&lines),
        };
        registry.register(ClientHandle::spawn(token, sink, 256));
        lines
    }

    /// Reorderer → Dispatcher: a scrambled broadcast stream reaches a
    /// client as `1, 2, ..., N` with no gaps and no repeats.
    #[tokio::test]
    async fn test_pipeline_restores_order_end_to_end() {
        let registry = ClientRegistry::new();
        let (dispatch_tx, dispatch_rx) = mpsc::channel(256);
        let dispatcher_handle = Dispatcher::new(registry.clone(), dispatch_rx).spawn();
        let lines = register(&registry, 1, 1);

        // A fixed scramble of 1..=20: pairs swapped, then tail first.
        let mut sequences: Vec<u64> = Vec::new();
        for chunk_start in [11u64, 1, 6, 16] {
            for offset in 0..5 {
                sequences.push(chunk_start + offset);
            }
        }

        let mut reorderer = Reorderer::new();
        for seq in sequences {
            reorderer.submit(Event::parse(&format!("{seq}|B")).unwrap());
            while let Some(ready) = reorderer.next_ready() {
                dispatch_tx.send(ready).await.unwrap();
            }
        }
        drop(dispatch_tx);

        let stats = dispatcher_handle.await.unwrap();
        registry.shutdown_all().await;

        let received: Vec<u64> = lines
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.split('|').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(received, (1..=20).collect::<Vec<u64>>());
        assert_eq!(stats.events_handled, 20);
    }

    /// A missing sequence holds back everything after it, across both
    /// pipeline stages.
    #[tokio::test]
    async fn test_pipeline_gap_reaches_no_client() {
        let registry = ClientRegistry::new();
        let (dispatch_tx, dispatch_rx) = mpsc::channel(256);
        let dispatcher_handle = Dispatcher::new(registry.clone(), dispatch_rx).spawn();
        let lines = register(&registry, 1, 1);

        let mut reorderer = Reorderer::new();
        for seq in [2u64, 3, 4] {
            reorderer.submit(Event::parse(&format!("{seq}|B")).unwrap());
            while let Some(ready) = reorderer.next_ready() {
                dispatch_tx.send(ready).await.unwrap();
            }
        }
        drop(dispatch_tx);

        let stats = dispatcher_handle.await.unwrap();
        registry.shutdown_all().await;

        assert!(lines.lock().unwrap().is_empty());
        assert_eq!(stats.events_handled, 0);
    }
}

#[cfg(test)]
mod tcp_tests {
    use std::net::SocketAddr;
    use std::time::Duration;

    use eventfan::server::{Server, ServerConfig};
    use eventfan::stats::ServerStats;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;
    use tokio::time::{sleep, timeout};

    async fn start_server() -> (
        SocketAddr,
        SocketAddr,
        JoinHandle<anyhow::Result<ServerStats>>,
    ) {
        let config = ServerConfig {
            event_addr: "127.0.0.1:0".parse().unwrap(),
            client_addr: "127.0.0.1:0".parse().unwrap(),
            client_queue: 64,
            dispatch_buffer: 64,
        };
        let server = Server::bind(config).await.unwrap();
        let (event_addr, client_addr) = server.local_addrs().unwrap();
        let handle = tokio::spawn(server.run());
        (event_addr, client_addr, handle)
    }

    /// Wait for in-flight registrations/dispatches to land.
    async fn settle() {
        sleep(Duration::from_millis(100)).await;
    }

    struct TestClient {
        lines: Lines<BufReader<TcpStream>>,
    }

    impl TestClient {
        async fn connect(addr: SocketAddr, user_id: u64) -> Self {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(format!("{user_id}\n").as_bytes())
                .await
                .unwrap();
            Self {
                lines: BufReader::new(stream).lines(),
            }
        }

        async fn expect_line(&mut self, expected: &str) {
            let line = timeout(Duration::from_secs(2), self.lines.next_line())
                .await
                .expect("timed out waiting for a line")
                .unwrap()
                .expect("connection closed before the expected line");
            assert_eq!(line, expected);
        }

        async fn expect_silence(&mut self) {
            if let Ok(line) = timeout(Duration::from_millis(200), self.lines.next_line()).await {
                panic!("expected no delivery, got {:?}", line.unwrap());
            }
        }

        async fn expect_closed(&mut self) {
            let line = timeout(Duration::from_secs(2), self.lines.next_line())
                .await
                .expect("timed out waiting for close")
                .unwrap();
            assert_eq!(line, None);
        }
    }

    struct Producer {
        stream: TcpStream,
    }

    impl Producer {
        async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.unwrap();
            Self { stream }
        }

        async fn send(&mut self, payload: &str) {
            self.stream.write_all(payload.as_bytes()).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_scrambled_stream_is_delivered_in_order() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut client = TestClient::connect(client_addr, 1).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("3|B\n2|S|2\n1|F|1|2\n").await;

        // The follow notification goes to user 2, who is not connected.
        // It does add the edge 1-follows-2, so 2's status update reaches
        // client 1, followed by the broadcast.
        client.expect_line("2|S|2").await;
        client.expect_line("3|B").await;
        client.expect_silence().await;
    }

    #[tokio::test]
    async fn test_follow_notifies_the_followee() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut follower = TestClient::connect(client_addr, 1).await;
        let mut followee = TestClient::connect(client_addr, 2).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|F|1|2\n").await;

        followee.expect_line("1|F|1|2").await;
        follower.expect_silence().await;
    }

    #[tokio::test]
    async fn test_private_message_reaches_target_only() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut sender = TestClient::connect(client_addr, 10).await;
        let mut target = TestClient::connect(client_addr, 20).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|P|10|20\n").await;

        target.expect_line("1|P|10|20").await;
        sender.expect_silence().await;
    }

    #[tokio::test]
    async fn test_private_miss_does_not_stall_dispatch() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut client = TestClient::connect(client_addr, 10).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|P|10|99\n2|B\n").await;

        // Sequence 1 went to an unregistered user; sequence 2 still flows.
        client.expect_line("2|B").await;
        client.expect_silence().await;
    }

    #[tokio::test]
    async fn test_unfollow_cuts_off_status_updates() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut follower = TestClient::connect(client_addr, 1).await;
        let mut followee = TestClient::connect(client_addr, 2).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|F|1|2\n2|U|1|2\n3|S|2\n4|B\n").await;

        followee.expect_line("1|F|1|2").await;
        followee.expect_line("4|B").await;

        // The unfollow at sequence 2 removed the edge before sequence 3;
        // the follower's first delivery is the broadcast.
        follower.expect_line("4|B").await;
        follower.expect_silence().await;
    }

    #[tokio::test]
    async fn test_broadcast_fans_out_to_every_client() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut clients = Vec::new();
        for user_id in [1u64, 2, 3] {
            clients.push(TestClient::connect(client_addr, user_id).await);
        }
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|B\n").await;

        for client in &mut clients {
            client.expect_line("1|B").await;
        }
    }

    #[tokio::test]
    async fn test_gap_stalls_until_the_missing_sequence_arrives() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut client = TestClient::connect(client_addr, 1).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("2|B\n3|B\n").await;
        client.expect_silence().await;

        producer.send("1|B\n").await;
        client.expect_line("1|B").await;
        client.expect_line("2|B").await;
        client.expect_line("3|B").await;
    }

    #[tokio::test]
    async fn test_duplicate_sequence_is_delivered_once() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut client = TestClient::connect(client_addr, 1).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|B\n1|B\n2|B\n2|B\n").await;

        client.expect_line("1|B").await;
        client.expect_line("2|B").await;
        client.expect_silence().await;
    }

    #[tokio::test]
    async fn test_reregistration_displaces_previous_connection() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut first = TestClient::connect(client_addr, 7).await;
        settle().await;
        let mut second = TestClient::connect(client_addr, 7).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|P|1|7\n").await;

        second.expect_line("1|P|1|7").await;
        // The displaced connection was closed without receiving anything.
        first.expect_closed().await;
    }

    #[tokio::test]
    async fn test_malformed_event_lines_are_skipped() {
        let (event_addr, client_addr, _server) = start_server().await;
        let mut client = TestClient::connect(client_addr, 1).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer
            .send("not an event\n1|X|2|3\n1|B|9\n1|B\n")
            .await;

        client.expect_line("1|B").await;
        client.expect_silence().await;
    }

    #[tokio::test]
    async fn test_malformed_client_id_gets_error_and_close() {
        let (_event_addr, client_addr, _server) = start_server().await;

        let mut stream = TcpStream::connect(client_addr).await.unwrap();
        stream.write_all(b"banana\n").await.unwrap();

        let mut lines = BufReader::new(stream).lines();
        let reply = timeout(Duration::from_secs(2), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(reply.starts_with("error|"), "unexpected reply {reply:?}");
        assert!(lines.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_producer_eof_flushes_clients_and_stops_server() {
        let (event_addr, client_addr, server) = start_server().await;
        let mut client = TestClient::connect(client_addr, 1).await;
        settle().await;

        let mut producer = Producer::connect(event_addr).await;
        producer.send("1|B\n2|B\n3|B\n4|B\n5|B\n").await;
        drop(producer);

        for seq in 1..=5 {
            client.expect_line(&format!("{seq}|B")).await;
        }
        client.expect_closed().await;

        let stats = timeout(Duration::from_secs(2), server)
            .await
            .expect("server did not shut down")
            .unwrap()
            .unwrap();
        assert_eq!(stats.dispatch.events_handled, 5);
        assert_eq!(stats.dispatch.deliveries_queued, 5);
        assert_eq!(stats.ingress.lines_read, 5);
    }
}
