//! End-to-end download behaviour against a local mock HTTP server.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use filestream::config::USER_AGENT;
use filestream::{
    DigestAlgorithm, DownloadError, DownloadRequest, Downloader, HashProvider, ObjectSchema,
    Store, is_valid,
};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &[u8] = b"the quick brown fox jumps over the lazy dog";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn setup(schema: ObjectSchema) -> (TempDir, Downloader) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path(), "download-cache", schema).unwrap();
    let downloader = Downloader::new(store).unwrap();
    (dir, downloader)
}

fn url_of(server: &MockServer, file: &str) -> Url {
    Url::parse(&format!("{}/{file}", server.uri())).unwrap()
}

async fn serve(server: &MockServer, file: &str, body: &[u8], expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{file}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn sha256(bytes: &[u8]) -> HashProvider {
    HashProvider::sha256(DigestAlgorithm::Sha256.hex_digest(bytes))
}

#[tokio::test]
async fn valid_object_is_reused_without_network() {
    let server = MockServer::start().await;
    serve(&server, "f.bin", BODY, 0).await;
    let (_dir, downloader) = setup(ObjectSchema::SHA256_SHARDED);

    let url = url_of(&server, "f.bin");
    let object = downloader.store().object(url.as_str());
    std::fs::create_dir_all(object.parent().unwrap()).unwrap();
    std::fs::write(&object, BODY).unwrap();

    let result = downloader
        .download(DownloadRequest::new(url).with_hash(sha256(BODY)))
        .get()
        .await
        .unwrap();

    assert_eq!(result, object);
}

#[tokio::test]
async fn missing_object_is_fetched_once_then_reused() {
    let server = MockServer::start().await;
    serve(&server, "f.bin", BODY, 1).await;
    let (_dir, downloader) = setup(ObjectSchema::SHA256_SHARDED);
    let url = url_of(&server, "f.bin");

    let first = downloader
        .download(DownloadRequest::new(url.clone()).with_hash(sha256(BODY)))
        .get()
        .await
        .unwrap();

    assert_eq!(std::fs::read(&first).unwrap(), BODY);
    assert!(is_valid(&first, Some(&sha256(BODY))).await.unwrap());

    let second = downloader
        .download(DownloadRequest::new(url).with_hash(sha256(BODY)))
        .get()
        .await
        .unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn invalid_object_is_overwritten() {
    let server = MockServer::start().await;
    serve(&server, "f.bin", BODY, 1).await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = url_of(&server, "f.bin");

    let object = downloader.store().object(url.as_str());
    std::fs::create_dir_all(object.parent().unwrap()).unwrap();
    std::fs::write(&object, b"corrupted from an earlier attempt").unwrap();

    let result = downloader
        .download(DownloadRequest::new(url).with_hash(sha256(BODY)))
        .get()
        .await
        .unwrap();

    assert_eq!(result, object);
    assert_eq!(std::fs::read(&object).unwrap(), BODY);
    assert!(is_valid(&object, Some(&sha256(BODY))).await.unwrap());
}

#[tokio::test]
async fn without_hash_provider_every_call_fetches() {
    let server = MockServer::start().await;
    serve(&server, "f.bin", BODY, 2).await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = url_of(&server, "f.bin");

    for _ in 0..2 {
        let path = downloader.download(url.clone()).get().await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), BODY);
    }
}

// Concurrent requests for one URL are not collapsed into a single fetch.
#[tokio::test]
async fn concurrent_identical_downloads_both_fetch() {
    let server = MockServer::start().await;
    serve(&server, "f.bin", BODY, 2).await;
    let (_dir, downloader) = setup(ObjectSchema::SHA256_SHARDED);
    let url = url_of(&server, "f.bin");

    let a = downloader.download(url.clone());
    let b = downloader.download(url);
    let (a, b) = tokio::join!(a.get(), b.get());

    assert_eq!(a.unwrap(), b.unwrap());
}

#[tokio::test]
async fn materializes_to_target_path() {
    let server = MockServer::start().await;
    serve(&server, "tool.zip", BODY, 1).await;
    let (dir, downloader) = setup(ObjectSchema::SHA256_SHARDED);
    let url = url_of(&server, "tool.zip");
    let target = dir.path().join("install").join("bin").join("tool.zip");

    let result = downloader
        .download(
            DownloadRequest::new(url.clone())
                .with_hash(sha256(BODY))
                .to_path(&target),
        )
        .get()
        .await
        .unwrap();

    assert_eq!(result, target);
    assert_eq!(std::fs::read(&target).unwrap(), BODY);

    // A second call reuses both the object and the existing target
    let again = downloader
        .download(DownloadRequest::new(url).with_hash(sha256(BODY)).to_path(&target))
        .get()
        .await
        .unwrap();
    assert_eq!(again, target);
}

#[tokio::test]
async fn materializes_into_store_under_url_hash() {
    let server = MockServer::start().await;
    serve(&server, "lib.jar", BODY, 1).await;
    let (dir, downloader) = setup(ObjectSchema::SHA256_SHARDED);
    let libraries = Store::direct(dir.path(), "libraries").unwrap();
    let url = url_of(&server, "lib.jar");

    let result = downloader
        .download(DownloadRequest::new(url.clone()).into_store(libraries.clone()))
        .get()
        .await
        .unwrap();

    let expected: PathBuf = libraries
        .root()
        .join(DigestAlgorithm::Sha256.hash_str(url.as_str()));
    assert_eq!(result, expected);
    assert_eq!(std::fs::read(&expected).unwrap(), BODY);
}

#[tokio::test]
async fn progress_is_ordered_and_complete() {
    let server = MockServer::start().await;
    let body = vec![42u8; 256 * 1024];
    serve(&server, "big.bin", &body, 1).await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let request = DownloadRequest::new(url_of(&server, "big.bin"))
        .with_progress(move |read, total| sink.lock().unwrap().push((read, total)));

    downloader.download(request).get().await.unwrap();

    let calls = calls.lock().unwrap();
    assert!(!calls.is_empty());
    assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(calls.last().unwrap().0, body.len() as u64);
    assert!(calls.iter().all(|(_, total)| *total == Some(body.len() as u64)));
}

#[tokio::test]
async fn zero_length_response_completes() {
    let server = MockServer::start().await;
    serve(&server, "empty", b"", 1).await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let request = DownloadRequest::new(url_of(&server, "empty"))
        .with_progress(move |read, total| sink.lock().unwrap().push((read, total)));

    let path = downloader.download(request).get().await.unwrap();

    assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    for (read, total) in calls.lock().unwrap().iter() {
        assert_eq!(*read, 0);
        assert!(matches!(total, Some(0) | None));
    }
}

#[tokio::test]
async fn sends_fixed_headers() {
    let server = MockServer::start().await;
    let url = url_of(&server, "f.bin");
    let host = format!("{}:{}", url.host_str().unwrap(), url.port().unwrap());

    Mock::given(method("GET"))
        .and(header("accept", "*/*"))
        .and(header("user-agent", USER_AGENT))
        .and(header("referer", url.as_str()))
        .and(header("host", host.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(BODY.to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, downloader) = setup(ObjectSchema::Direct);
    downloader.download(url).get().await.unwrap();
}

#[tokio::test]
async fn http_error_surfaces_through_handle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = url_of(&server, "missing.bin");

    let download = downloader.download(url.clone());
    let err = download.get().await.unwrap_err();

    assert!(matches!(err, DownloadError::Status { status, .. } if status.as_u16() == 404));
    assert!(err.is_network());
    assert!(download.is_done());
    assert!(!downloader.store().object(url.as_str()).exists());
}

#[tokio::test]
async fn unreachable_host_is_a_connect_error() {
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = Url::parse("http://127.0.0.1:1/f.bin").unwrap();

    let err = downloader.download(url).get().await.unwrap_err();
    assert!(matches!(err, DownloadError::Connect { .. }));
}

#[tokio::test]
async fn cancel_before_start_prevents_fetch() {
    let server = MockServer::start().await;
    serve(&server, "f.bin", BODY, 0).await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = url_of(&server, "f.bin");

    // The current-thread runtime has not polled the task yet
    let download = downloader.download(url.clone());
    assert!(download.cancel(false));
    assert!(download.is_cancelled());

    assert!(matches!(download.get().await, Err(DownloadError::Cancelled)));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!downloader.store().object(url.as_str()).exists());
}

#[tokio::test]
async fn forced_cancel_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(BODY.to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = url_of(&server, "slow.bin");

    let download = downloader.download(url.clone());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(download.cancel(true));

    assert!(matches!(download.get().await, Err(DownloadError::Cancelled)));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!downloader.store().object(url.as_str()).exists());
}

#[tokio::test]
async fn forced_cancel_while_connecting_keeps_cached_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(BODY.to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = url_of(&server, "cached.bin");

    let object = downloader.store().object(url.as_str());
    std::fs::create_dir_all(object.parent().unwrap()).unwrap();
    std::fs::write(&object, b"previous").unwrap();

    let download = downloader.download(url);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(download.cancel(true));

    assert!(matches!(download.get().await, Err(DownloadError::Cancelled)));
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(std::fs::read(&object).unwrap(), b"previous");
}

#[tokio::test]
async fn url_with_trailing_slash_downloads_into_direct_store() {
    let server = MockServer::start().await;
    serve(&server, "dir/", BODY, 1).await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = url_of(&server, "dir/");

    let path = downloader.download(url).get().await.unwrap();

    assert_eq!(path.file_name().unwrap(), "dir");
    assert!(path.is_file());
    assert_eq!(std::fs::read(&path).unwrap(), BODY);
}

/// Serve one response announcing 1000 bytes but closing after 10.
async fn serve_truncated_body() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = socket.read(&mut buf).await.unwrap();
            if read == 0 {
                return;
            }
            request.extend_from_slice(&buf[..read]);
        }

        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n")
            .await
            .unwrap();
        socket.write_all(&[7u8; 10]).await.unwrap();
        socket.flush().await.unwrap();
    });

    Url::parse(&format!("http://{addr}/partial.bin")).unwrap()
}

#[tokio::test]
async fn truncated_body_leaves_no_object() {
    let (_dir, downloader) = setup(ObjectSchema::Direct);
    let url = serve_truncated_body().await;

    let object = downloader.store().object(url.as_str());
    std::fs::create_dir_all(object.parent().unwrap()).unwrap();
    std::fs::write(&object, b"stale").unwrap();

    let err = downloader.download(url).get().await.unwrap_err();

    assert!(matches!(err, DownloadError::Read { .. }));
    assert!(err.is_network());
    assert!(!object.exists());
    let leftovers: Vec<_> = std::fs::read_dir(object.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "leftover staging files: {leftovers:?}");
}

#[tokio::test]
async fn get_timeout_leaves_download_running() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(BODY.to_vec())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let (_dir, downloader) = setup(ObjectSchema::Direct);

    let download = downloader.download(url_of(&server, "slow.bin"));
    let err = download
        .get_timeout(Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::Timeout(_)));
    assert!(!download.is_cancelled());

    let path = download.get_timeout(Duration::from_secs(5)).await.unwrap();
    assert_eq!(std::fs::read(path).unwrap(), BODY);
}

#[test]
fn sharded_object_path_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(dir.path(), "objects", ObjectSchema::SHA256_SHARDED).unwrap();
    let name = "https://example.test/f.bin";
    let h = DigestAlgorithm::Sha256.hash_str(name);

    assert_eq!(
        store.object(name),
        store.root().join(&h[0..2]).join(&h[0..4]).join(&h)
    );
}
