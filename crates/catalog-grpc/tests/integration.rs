//! Integration tests for the catalog gRPC service.
//!
//! Each test starts a real server on an ephemeral port and talks to it with
//! the generated client.

#![allow(clippy::unwrap_used)] // unwrap is acceptable in tests

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Duration;

static INIT_TRACING: Once = Once::new();

fn init_tracing() {
    INIT_TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("catalog_grpc=debug,catalog=debug")
            .with_test_writer()
            .init();
    });
}

use catalog::{
    DiskImageStore, Filter, InMemoryLaptopStore, LaptopStore, MAX_IMAGE_SIZE, Memory,
    memory::Unit, sample,
};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::{Code, Request};

use catalog_grpc::CatalogService;
use catalog_grpc::proto::{
    CreateLaptopRequest, LaptopServiceClient, LaptopServiceServer, RateLaptopRequest,
    SearchLaptopRequest, UploadImageRequest,
};

/// Macro to log messages in tests (visible with --nocapture)
macro_rules! test_log {
    ($($arg:tt)*) => {
        eprintln!("[TEST] {}", format!($($arg)*));
    };
}

/// Start the test server over `store`, writing images into `image_dir`.
async fn start_test_server(store: Arc<InMemoryLaptopStore>, image_dir: &Path) -> SocketAddr {
    test_log!("Starting test server...");
    let addr: SocketAddr = "[::1]:0".parse().unwrap();

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let actual_addr = listener.local_addr().unwrap();
    test_log!("Server bound to {}", actual_addr);

    let service = CatalogService::new(store, Arc::new(DiskImageStore::new(image_dir)));

    tokio::spawn(async move {
        let result = tonic::transport::Server::builder()
            .add_service(LaptopServiceServer::new(service))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await;
        test_log!("Server task ended: {:?}", result);
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    actual_addr
}

/// Connect a client to the server.
async fn connect_client(addr: SocketAddr) -> LaptopServiceClient<Channel> {
    let endpoint = format!("http://{}", addr);
    LaptopServiceClient::connect(endpoint).await.unwrap()
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

// ==================== CreateLaptop ====================

#[tokio::test]
async fn test_create_laptop() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store.clone(), dir.path()).await;
    let mut client = connect_client(addr).await;

    let laptop = sample::new_laptop();
    let response = client
        .create_laptop(CreateLaptopRequest {
            laptop: Some(laptop.clone()),
        })
        .await
        .unwrap()
        .into_inner();

    assert_eq!(response.id, laptop.id);
    let stored = store.find(&laptop.id).unwrap().unwrap();
    assert_eq!(stored, laptop);
}

#[tokio::test]
async fn test_create_without_id_gets_uuid() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store.clone(), dir.path()).await;
    let mut client = connect_client(addr).await;

    let mut laptop = sample::new_laptop();
    laptop.id.clear();
    let id = client
        .create_laptop(CreateLaptopRequest {
            laptop: Some(laptop),
        })
        .await
        .unwrap()
        .into_inner()
        .id;

    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert!(store.find(&id).unwrap().is_some());
}

#[tokio::test]
async fn test_create_error_codes() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store.clone(), dir.path()).await;
    let mut client = connect_client(addr).await;

    let mut invalid = sample::new_laptop();
    invalid.id = "invalid-uuid".to_string();
    let status = client
        .create_laptop(CreateLaptopRequest {
            laptop: Some(invalid),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let laptop = sample::new_laptop();
    client
        .create_laptop(CreateLaptopRequest {
            laptop: Some(laptop.clone()),
        })
        .await
        .unwrap();
    let status = client
        .create_laptop(CreateLaptopRequest {
            laptop: Some(laptop),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);

    assert_eq!(store.len().unwrap(), 1);
}

// ==================== SearchLaptop ====================

#[tokio::test]
async fn test_search_laptop() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let mut expected = Vec::new();

    for i in 0..6 {
        let mut laptop = sample::new_laptop();
        let cpu = laptop.cpu.as_mut().unwrap();
        match i {
            0 => laptop.price_usd = 2500.0,
            1 => cpu.number_cores = 2,
            2 => cpu.min_ghz = 2.0,
            3 => laptop.ram = Some(Memory::new(4096, Unit::Megabyte)),
            4 => {
                laptop.price_usd = 1999.0;
                cpu.number_cores = 4;
                cpu.min_ghz = 2.5;
                cpu.max_ghz = 4.5;
                laptop.ram = Some(Memory::new(16, Unit::Gigabyte));
                expected.push(laptop.id.clone());
            }
            _ => {
                laptop.price_usd = 2000.0;
                cpu.number_cores = 6;
                cpu.min_ghz = 2.8;
                cpu.max_ghz = 5.0;
                laptop.ram = Some(Memory::new(64, Unit::Gigabyte));
                expected.push(laptop.id.clone());
            }
        }
        store.save(&laptop).unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store.clone(), dir.path()).await;
    let mut client = connect_client(addr).await;

    let filter = Filter {
        max_price_usd: 2000.0,
        min_cpu_cores: 4,
        min_cpu_ghz: 2.2,
        min_ram: Some(Memory::new(8, Unit::Gigabyte)),
    };
    let mut stream = client
        .search_laptop(SearchLaptopRequest {
            filter: Some(filter),
        })
        .await
        .unwrap()
        .into_inner();

    let mut found = Vec::new();
    while let Some(response) = stream.next().await {
        let laptop = response.unwrap().laptop.unwrap();
        test_log!("found {}", laptop.id);
        // Every streamed record is a full copy of what was stored.
        assert_eq!(store.find(&laptop.id).unwrap().unwrap(), laptop);
        found.push(laptop.id);
    }

    found.sort();
    expected.sort();
    assert_eq!(found, expected);
}

// ==================== UploadImage ====================

async fn upload(
    client: &mut LaptopServiceClient<Channel>,
    messages: Vec<UploadImageRequest>,
) -> Result<catalog_grpc::proto::UploadImageResponse, tonic::Status> {
    client
        .upload_image(tokio_stream::iter(messages))
        .await
        .map(|response| response.into_inner())
}

fn image_messages(laptop_id: &str, size: usize) -> Vec<UploadImageRequest> {
    let mut messages = vec![UploadImageRequest::info(laptop_id, ".jpg")];
    let mut remaining = size;
    while remaining > 0 {
        let n = remaining.min(64 * 1024);
        messages.push(UploadImageRequest::chunk(vec![0xab; n]));
        remaining -= n;
    }
    messages
}

#[tokio::test]
async fn test_upload_image_at_ceiling() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let laptop_id = store.save(&sample::new_laptop()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store, dir.path()).await;
    let mut client = connect_client(addr).await;

    let response = upload(&mut client, image_messages(&laptop_id, MAX_IMAGE_SIZE))
        .await
        .unwrap();

    assert_eq!(response.size as usize, MAX_IMAGE_SIZE);
    let saved = dir.path().join(format!("{}.jpg", response.id));
    assert_eq!(std::fs::metadata(saved).unwrap().len() as usize, MAX_IMAGE_SIZE);
}

#[tokio::test]
async fn test_upload_image_one_byte_over() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let laptop_id = store.save(&sample::new_laptop()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store, dir.path()).await;
    let mut client = connect_client(addr).await;

    let status = upload(&mut client, image_messages(&laptop_id, MAX_IMAGE_SIZE + 1))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_upload_image_unknown_laptop() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store, dir.path()).await;
    let mut client = connect_client(addr).await;

    let unknown = uuid::Uuid::new_v4().to_string();
    let status = upload(&mut client, image_messages(&unknown, 1024))
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(count_files(dir.path()), 0);
}

#[tokio::test]
async fn test_upload_image_without_info() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store, dir.path()).await;
    let mut client = connect_client(addr).await;

    let status = upload(&mut client, vec![UploadImageRequest::chunk(vec![1; 16])])
        .await
        .unwrap_err();

    assert_eq!(status.code(), Code::Unknown);
}

// ==================== RateLaptop ====================

#[tokio::test]
async fn test_rate_laptop() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store, dir.path()).await;
    let mut client = connect_client(addr).await;

    let ids: Vec<String> = (0..3).map(|_| uuid::Uuid::new_v4().to_string()).collect();
    let scores = [8.0, 7.5, 10.0];
    let rounds = 2;

    let (tx, rx) = mpsc::channel(8);
    let mut responses = client
        .rate_laptop(ReceiverStream::new(rx))
        .await
        .unwrap()
        .into_inner();

    // Send one request and wait for its answer before sending the next.
    for round in 1..=rounds {
        for (id, score) in ids.iter().zip(scores) {
            tx.send(RateLaptopRequest {
                laptop_id: id.clone(),
                score,
            })
            .await
            .unwrap();

            let response = responses.next().await.unwrap().unwrap();
            test_log!("rated {} -> {:?}", id, response);
            assert_eq!(&response.laptop_id, id);
            assert_eq!(response.rated_count, round);
            assert_eq!(response.average_score, score);
        }
    }

    drop(tx);
    assert!(responses.next().await.is_none());
}

#[tokio::test]
async fn test_rate_laptop_deadline() {
    init_tracing();
    let store = Arc::new(InMemoryLaptopStore::new());
    let dir = tempfile::tempdir().unwrap();
    let addr = start_test_server(store, dir.path()).await;
    let mut client = connect_client(addr).await;

    // Keep the request stream open without sending anything.
    let (_tx, rx) = mpsc::channel::<RateLaptopRequest>(1);
    let mut request = Request::new(ReceiverStream::new(rx));
    request.set_timeout(Duration::from_millis(200));

    let result = match client.rate_laptop(request).await {
        Ok(response) => {
            let mut responses = response.into_inner();
            responses.next().await.unwrap()
        }
        Err(status) => Err(status),
    };

    let status = result.unwrap_err();
    assert!(
        matches!(status.code(), Code::DeadlineExceeded | Code::Cancelled),
        "unexpected status: {status:?}"
    );
}
