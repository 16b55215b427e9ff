//! Integration tests for the WebSocket transport.
//!
//! A real server and client exchange frames over loopback TCP.

#[cfg(feature = "websocket")]
mod websocket {
    use runegate_transport::{
        Connection, Transport, WebSocketClient, WebSocketTransport,
    };

    /// Binds on a free port and returns the transport with its `ws://` URL.
    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound address");
        (transport, format!("ws://{addr}"))
    }

    #[tokio::test]
    async fn test_websocket_accept_and_send_receive() {
        let (mut transport, url) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = WebSocketClient::connect(&url)
            .await
            .expect("client should connect");
        let server_conn = server_handle.await.expect("task should complete");

        assert!(server_conn.id().into_inner() > 0);
        assert_ne!(server_conn.id(), client.id());

        // --- Server sends, client receives ---
        server_conn
            .send(b"hello from server")
            .await
            .expect("send should succeed");
        let received = client.recv().await.unwrap().expect("should have data");
        assert_eq!(received, b"hello from server");

        // --- Client sends, server receives ---
        client.send(b"hello from client").await.unwrap();
        let received = server_conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"hello from client");

        server_conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (mut transport, url) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = WebSocketClient::connect(&url).await.unwrap();
        let server_conn = server_handle.await.unwrap();

        client.close().await.unwrap();

        let result = server_conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending() {
        let (mut transport, url) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = WebSocketClient::connect(&url).await.unwrap();
        let server_conn =
            std::sync::Arc::new(server_handle.await.unwrap());

        // A pending recv must not hold up a send on the same connection.
        let reader = std::sync::Arc::clone(&server_conn);
        let pending = tokio::spawn(async move { reader.recv().await });
        tokio::task::yield_now().await;

        server_conn.send(b"ping").await.unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), b"ping");

        client.send(b"pong").await.unwrap();
        let got = pending.await.unwrap().unwrap().unwrap();
        assert_eq!(got, b"pong");
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let (transport, url) = bind().await;
        drop(transport);

        let result = WebSocketClient::connect(&url).await;

        assert!(matches!(
            result,
            Err(runegate_transport::TransportError::ConnectFailed(_))
        ));
    }
}
