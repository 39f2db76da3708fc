use indoc::indoc;
use micro_http_token::codec::RequestDecoder;
use micro_http_token::connection::RequestStream;
use micro_http_token::protocol::{Eager, ParseError};
use micro_http_token::token::ContentKind;
use tokio::io::AsyncWriteExt;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}

const KEEP_ALIVE_SESSION: &str = indoc! {r##"
    GET /health HTTP/1.1
    Host: service.local

    POST /form HTTP/1.1
    Host: service.local
    Content-Type: application/x-www-form-urlencoded
    Content-Length: 15

    name=ferris&x=1GET /bye HTTP/1.1
    Connection: close

    "##};

#[tokio::test]
async fn keep_alive_session_over_small_reads() {
    init_tracing();
    let (mut client, server) = tokio::io::duplex(16);
    let mut stream = RequestStream::new(server, RequestDecoder::<Eager>::new());

    let session = KEEP_ALIVE_SESSION.replace('\n', "\r\n");
    let writer = tokio::spawn(async move {
        for chunk in session.as_bytes().chunks(5) {
            client.write_all(chunk).await.unwrap();
        }
    });

    let health = stream.next_request().await.unwrap().unwrap();
    assert_eq!(health.path().as_bytes(), b"/health");
    assert!(health.keep_alive());

    let mut form = stream.next_request().await.unwrap().unwrap();
    assert_eq!(form.content_type().map(|c| c.kind()), Some(ContentKind::FormUrlEncoded));
    assert_eq!(form.take_body().as_deref(), Some(&b"name=ferris&x=1"[..]));

    let bye = stream.next_request().await.unwrap().unwrap();
    assert!(!bye.keep_alive());

    writer.await.unwrap();
    assert!(stream.next_request().await.is_none());
}

#[tokio::test]
async fn malformed_request_ends_the_stream_with_an_error() {
    init_tracing();
    let (mut client, server) = tokio::io::duplex(256);
    let mut stream = RequestStream::new(server, RequestDecoder::<Eager>::new());

    client.write_all(b"GET /ok HTTP/1.1\r\n\r\nGET /bad HTTP/1.1\r\nBroken Header: x\r\n\r\n").await.unwrap();

    assert!(stream.next_request().await.unwrap().is_ok());
    let error = stream.next_request().await.unwrap().unwrap_err();
    assert!(matches!(error, ParseError::InvalidHeader { .. }));
    assert_eq!(error.status_code(), http::StatusCode::BAD_REQUEST);
}
