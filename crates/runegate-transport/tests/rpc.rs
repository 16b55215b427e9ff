//! RPC backend over a real WebSocket listener.

#![cfg(feature = "websocket")]

use std::sync::Arc;
use std::time::Duration;

use runegate_protocol::{
    CallContext, Codec, Envelope, JsonCodec, LoginService, LoginVerifyRequest,
    LoginVerifyResponse, Payload, ServiceError,
};
use runegate_transport::{
    Connection, DialService, Dialer, ListenService, Listener, LoginServiceClient,
    RpcDialer, RpcListener, TransportError, WebSocketClient, register_login_service,
};

/// Echoes the username back as the rejection text, or sleeps for
/// "slow" so deadlines can fire.
struct Echo(&'static str);

impl LoginService for Echo {
    async fn login_verify(
        &self,
        ctx: &CallContext,
        request: LoginVerifyRequest,
    ) -> Result<LoginVerifyResponse, ServiceError> {
        if request.username == "slow" {
            ctx.run(tokio::time::sleep(Duration::from_secs(30))).await?;
        }
        if request.username == "ok" {
            return Ok(LoginVerifyResponse::accepted(Vec::new()));
        }
        Ok(LoginVerifyResponse::rejected(format!(
            "{}:{}",
            self.0, request.username
        )))
    }
}

/// Binds a listener on a free port and serves it in the background.
async fn start() -> Arc<RpcListener<Echo>> {
    let listener = Arc::new(RpcListener::bind("127.0.0.1:0").await.unwrap());
    let serving = Arc::clone(&listener);
    tokio::spawn(async move { serving.serve().await });
    listener
}

fn request(username: &str) -> LoginVerifyRequest {
    LoginVerifyRequest::new(username, "pw", "")
}

#[tokio::test]
async fn test_dialer_round_trip_through_listener() {
    let listener = start().await;
    register_login_service(&*listener, Arc::new(Echo("a"))).unwrap();

    let dial = DialService::new(RpcDialer::new(listener.local_addr().to_string()));
    let ok = dial.login_verify(&CallContext::new(), request("ok")).await.unwrap();
    let rejected = dial
        .login_verify(&CallContext::new(), request("bob"))
        .await
        .unwrap();

    assert!(ok.is_accepted());
    assert_eq!(rejected.error, "a:bob");
    listener.shutdown_token().cancel();
}

#[tokio::test]
async fn test_listener_reregistration_last_wins() {
    let listener = start().await;
    let listen = ListenService::new(Arc::clone(&listener));
    listen.listener().login_register(Arc::new(Echo("first"))).unwrap();
    listen.listener().login_register(Arc::new(Echo("second"))).unwrap();

    let client = LoginServiceClient::connect(&listener.local_addr().to_string())
        .await
        .unwrap();
    let response = client
        .login_verify(&CallContext::new(), request("x"))
        .await
        .unwrap();

    assert_eq!(response.error, "second:x");
    listener.shutdown_token().cancel();
}

#[tokio::test]
async fn test_verify_before_registration_is_remote_501() {
    let listener = start().await;
    let client = LoginServiceClient::connect(&listener.local_addr().to_string())
        .await
        .unwrap();

    let result = client.login_verify(&CallContext::new(), request("x")).await;

    assert!(matches!(result, Err(TransportError::Remote { code: 501, .. })));
    listener.shutdown_token().cancel();
}

#[tokio::test]
async fn test_deadline_is_enforced_on_the_client() {
    let listener = start().await;
    listener.login_register(Arc::new(Echo("a"))).unwrap();
    let client = LoginServiceClient::connect(&listener.local_addr().to_string())
        .await
        .unwrap();

    let ctx = CallContext::with_timeout(Duration::from_millis(50));
    let result = client.login_verify(&ctx, request("slow")).await;

    assert!(matches!(
        result,
        Err(TransportError::Context(
            runegate_protocol::ContextError::DeadlineExceeded
        ))
    ));

    // The late reply is skipped; the next call gets its own answer.
    let next = client
        .login_verify(&CallContext::new(), request("ok"))
        .await
        .unwrap();
    assert!(next.is_accepted());
    listener.shutdown_token().cancel();
}

#[tokio::test]
async fn test_server_honours_timeout_ms() {
    let listener = start().await;
    listener.login_register(Arc::new(Echo("a"))).unwrap();
    let conn = WebSocketClient::connect(&format!("ws://{}", listener.local_addr()))
        .await
        .unwrap();

    let call = Envelope {
        call_id: 7,
        timeout_ms: Some(20),
        payload: Payload::LoginVerify {
            request: request("slow"),
        },
    };
    conn.send(&JsonCodec.encode(&call).unwrap()).await.unwrap();
    let reply: Envelope = JsonCodec
        .decode(&conn.recv().await.unwrap().unwrap())
        .unwrap();

    assert_eq!(reply.call_id, 7);
    assert!(matches!(reply.payload, Payload::Failure { code: 504, .. }));
    listener.shutdown_token().cancel();
}

#[tokio::test]
async fn test_garbage_frame_gets_400_failure() {
    let listener = start().await;
    let conn = WebSocketClient::connect(&format!("ws://{}", listener.local_addr()))
        .await
        .unwrap();

    conn.send(b"{not json").await.unwrap();
    let reply: Envelope = JsonCodec
        .decode(&conn.recv().await.unwrap().unwrap())
        .unwrap();

    assert!(matches!(reply.payload, Payload::Failure { code: 400, .. }));
    listener.shutdown_token().cancel();
}

#[tokio::test]
async fn test_dialer_reregistration_last_wins() {
    let first = start().await;
    first.login_register(Arc::new(Echo("first"))).unwrap();
    let second = start().await;
    second.login_register(Arc::new(Echo("second"))).unwrap();
    let dialer = RpcDialer::new(first.local_addr().to_string());

    dialer
        .login_register(
            LoginServiceClient::connect(&first.local_addr().to_string())
                .await
                .unwrap(),
        )
        .unwrap();
    dialer
        .login_register(
            LoginServiceClient::connect(&second.local_addr().to_string())
                .await
                .unwrap(),
        )
        .unwrap();
    let response = dialer
        .login_verify(&CallContext::new(), request("x"))
        .await
        .unwrap();

    assert_eq!(response.error, "second:x");
    first.shutdown_token().cancel();
    second.shutdown_token().cancel();
}

#[tokio::test]
async fn test_dialer_reconnects_after_listener_restart() {
    let listener = start().await;
    listener.login_register(Arc::new(Echo("before"))).unwrap();
    let addr = listener.local_addr().to_string();
    let dialer = RpcDialer::new(addr.clone());
    let before = dialer
        .login_verify(&CallContext::new(), request("x"))
        .await
        .unwrap();
    assert_eq!(before.error, "before:x");

    listener.shutdown_token().cancel();
    drop(listener);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let restarted = Arc::new(RpcListener::bind(&addr).await.unwrap());
    restarted.login_register(Arc::new(Echo("after"))).unwrap();
    let serving = Arc::clone(&restarted);
    tokio::spawn(async move { serving.serve().await });

    // The call on the dead socket fails; the dialer drops that client.
    let lost = dialer
        .login_verify(&CallContext::with_timeout(Duration::from_secs(5)), request("x"))
        .await;
    match lost {
        Err(e) => assert!(e.is_connection_lost(), "unexpected error: {e}"),
        Ok(response) => panic!("old connection answered: {response:?}"),
    }

    let after = dialer
        .login_verify(&CallContext::new(), request("x"))
        .await
        .unwrap();
    assert_eq!(after.error, "after:x");
    restarted.shutdown_token().cancel();
}

#[tokio::test]
async fn test_dialer_unreachable_endpoint_is_connect_error() {
    let listener = start().await;
    let addr = listener.local_addr().to_string();
    listener.shutdown_token().cancel();
    drop(listener);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let dialer = RpcDialer::new(addr);
    let result = dialer.login_verify(&CallContext::new(), request("ok")).await;

    assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
}
