//! gRPC server implementation for the laptop service.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use catalog::{
    CallContext, DiskImageStore, Filter, ImageCollector, ImageStore, InMemoryLaptopStore, Laptop,
    LaptopStore, RatingAggregator, StoreError, validate_id,
};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status, Streaming};

use crate::config::ServerConfig;
use crate::metadata::{call_context, cancel_on_disconnect};
use crate::proto::{
    self, CreateLaptopRequest, CreateLaptopResponse, RateLaptopRequest, RateLaptopResponse,
    SearchLaptopRequest, SearchLaptopResponse, UploadImageRequest, UploadImageResponse,
    upload_image_request::Data,
};
use crate::status::{
    collect_status, context_status, image_store_status, join_status, log_status, receive_status,
    send_status, store_status,
};

/// Capacity of the per-call response channels.
const RESPONSE_BUFFER: usize = 16;

type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

/// The laptop catalog service.
///
/// Cloning is cheap: clones share the same stores.
#[derive(Clone)]
pub struct CatalogService {
    laptop_store: Arc<dyn LaptopStore>,
    image_store: Arc<dyn ImageStore>,
    max_image_size: usize,
    shutdown: CancellationToken,
}

impl fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogService")
            .field("max_image_size", &self.max_image_size)
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Create a service over the given stores.
    pub fn new(laptop_store: Arc<dyn LaptopStore>, image_store: Arc<dyn ImageStore>) -> Self {
        Self {
            laptop_store,
            image_store,
            max_image_size: catalog::MAX_IMAGE_SIZE,
            shutdown: CancellationToken::new(),
        }
    }

    /// Override the largest accepted image.
    pub fn with_max_image_size(mut self, max_image_size: usize) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    /// Cancel every call in flight, and every later one, once `shutdown` is
    /// cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Validate and store a new laptop, returning its final ID.
    pub async fn save_laptop(
        &self,
        ctx: &CallContext,
        laptop: Option<Laptop>,
    ) -> Result<String, Status> {
        let laptop = laptop.ok_or_else(|| Status::invalid_argument("laptop is missing"))?;
        tracing::info!(id = %laptop.id, "receive a create-laptop request");

        if !laptop.id.is_empty() {
            validate_id(&laptop.id).map_err(store_status)?;
        }
        ctx.check().map_err(context_status)?;

        let store = Arc::clone(&self.laptop_store);
        let id = tokio::task::spawn_blocking(move || store.save(&laptop))
            .await
            .map_err(join_status)?
            .map_err(store_status)?;

        tracing::info!(%id, "saved laptop");
        Ok(id)
    }

    /// Send every laptop matching `filter` on `tx`, one response per match.
    ///
    /// The scan runs on the blocking pool and waits for each response to be
    /// queued before moving on, but never past the end of `ctx`: once it is
    /// done the scan ends quietly and releases the store. Returns the number
    /// of laptops sent.
    pub async fn search_laptops(
        &self,
        ctx: CallContext,
        filter: Filter,
        tx: mpsc::Sender<Result<SearchLaptopResponse, Status>>,
    ) -> Result<usize, Status> {
        let store = Arc::clone(&self.laptop_store);
        let runtime = Handle::current();
        tokio::task::spawn_blocking(move || {
            let mut sent = 0;
            store.search(&ctx, &filter, &mut |laptop| {
                tracing::debug!(id = %laptop.id, "found laptop");
                let response = Ok(SearchLaptopResponse {
                    laptop: Some(laptop),
                });
                // A full channel must not outlive the call; the store stops
                // at its next context check.
                let queued = runtime.block_on(async {
                    tokio::select! {
                        biased;
                        err = ctx.done() => Err(err),
                        queued = tx.send(response) => Ok(queued.is_ok()),
                    }
                });
                match queued {
                    Ok(true) => sent += 1,
                    Ok(false) => {
                        return Err(StoreError::Aborted(
                            "cannot send stream response".to_string(),
                        ));
                    }
                    Err(err) => tracing::debug!("search send abandoned: {}", err),
                }
                Ok(())
            })?;
            Ok::<_, StoreError>(sent)
        })
        .await
        .map_err(join_status)?
        .map_err(store_status)
    }

    /// Receive an image upload and persist it.
    ///
    /// The first message must carry the image info; every later message a
    /// chunk. Nothing is persisted unless the whole stream is accepted.
    pub async fn receive_image<S>(
        &self,
        ctx: &CallContext,
        mut requests: S,
    ) -> Result<UploadImageResponse, Status>
    where
        S: Stream<Item = Result<UploadImageRequest, Status>> + Unpin + Send,
    {
        let info = match requests.next().await {
            Some(Ok(UploadImageRequest {
                data: Some(Data::Info(info)),
            })) => info,
            Some(Ok(_)) => return Err(Status::unknown("first upload message must be image info")),
            Some(Err(status)) => return Err(receive_status(&status)),
            None => return Err(Status::unknown("cannot receive image info: stream closed")),
        };
        tracing::info!(
            laptop_id = %info.laptop_id,
            image_type = %info.image_type,
            "receive an upload-image request"
        );

        let store = Arc::clone(&self.laptop_store);
        let laptop_id = info.laptop_id.clone();
        let owner = tokio::task::spawn_blocking(move || store.find(&laptop_id))
            .await
            .map_err(join_status)?
            .map_err(|err| Status::internal(format!("cannot find laptop: {err}")))?;
        if owner.is_none() {
            return Err(Status::invalid_argument(format!(
                "laptop id {} doesn't exist",
                info.laptop_id
            )));
        }

        let chunks = requests.map(|request| match request {
            Ok(UploadImageRequest {
                data: Some(Data::ChunkData(chunk)),
            }) => Ok(chunk),
            Ok(_) => Err(Status::unknown("expected chunk data")),
            Err(status) => Err(status),
        });
        let image = ImageCollector::with_max_size(self.max_image_size)
            .collect(ctx, chunks)
            .await
            .map_err(collect_status)?;

        let size = u32::try_from(image.size)
            .map_err(|_| Status::internal(format!("image size {} overflows", image.size)))?;
        let id = self
            .image_store
            .save(&info.laptop_id, &info.image_type, image.data)
            .await
            .map_err(image_store_status)?;

        tracing::info!(%id, size, "saved image");
        Ok(UploadImageResponse {
            id,
            size,
        })
    }

    /// Run a rating exchange until the client stops sending.
    ///
    /// A producer task reads each request and answers it on `tx` before
    /// reading the next. It reports how it ended on a oneshot, which this
    /// driver waits for. Returns the number of ratings answered.
    pub async fn rate_laptops<S>(
        ctx: CallContext,
        requests: S,
        tx: mpsc::Sender<Result<RateLaptopResponse, Status>>,
    ) -> Result<usize, Status>
    where
        S: Stream<Item = Result<RateLaptopRequest, Status>> + Unpin + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = produce_ratings(&ctx, requests, &tx).await;
            let _ = done_tx.send(result);
        });

        done_rx
            .await
            .unwrap_or_else(|_| Err(Status::internal("rating task stopped without a result")))
    }
}

async fn produce_ratings<S>(
    ctx: &CallContext,
    mut requests: S,
    tx: &mpsc::Sender<Result<RateLaptopResponse, Status>>,
) -> Result<usize, Status>
where
    S: Stream<Item = Result<RateLaptopRequest, Status>> + Unpin,
{
    let mut aggregator = RatingAggregator::new();
    let mut rated = 0;

    loop {
        ctx.check().map_err(context_status)?;

        let next = tokio::select! {
            biased;
            err = ctx.done() => return Err(context_status(err)),
            next = requests.next() => next,
        };
        let request = match next {
            Some(Ok(request)) => request,
            Some(Err(status)) => return Err(receive_status(&status)),
            None => {
                tracing::debug!("no more data");
                return Ok(rated);
            }
        };

        let rating = aggregator.add(&request.laptop_id, request.score);
        tracing::debug!(
            laptop_id = %request.laptop_id,
            score = request.score,
            "received a rate-laptop request"
        );

        let response = RateLaptopResponse {
            laptop_id: request.laptop_id,
            rated_count: rating.count,
            average_score: rating.average(),
        };
        tokio::select! {
            biased;
            err = ctx.done() => return Err(context_status(err)),
            sent = tx.send(Ok(response)) => sent.map_err(|_| send_status())?,
        }
        rated += 1;
    }
}

#[tonic::async_trait]
impl proto::LaptopService for CatalogService {
    async fn create_laptop(
        &self,
        request: Request<CreateLaptopRequest>,
    ) -> Result<Response<CreateLaptopResponse>, Status> {
        let ctx = call_context(request.metadata(), &self.shutdown);
        let id = self
            .save_laptop(&ctx, request.into_inner().laptop)
            .await
            .inspect_err(log_status)?;
        Ok(Response::new(CreateLaptopResponse { id }))
    }

    type SearchLaptopStream = ResponseStream<SearchLaptopResponse>;

    async fn search_laptop(
        &self,
        request: Request<SearchLaptopRequest>,
    ) -> Result<Response<Self::SearchLaptopStream>, Status> {
        let ctx = call_context(request.metadata(), &self.shutdown);
        let filter = request.into_inner().filter.unwrap_or_default();
        tracing::info!(?filter, "receive a search-laptop request");

        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        let service = self.clone();

        tokio::spawn(async move {
            let _watch = cancel_on_disconnect(&ctx, &tx);
            match service.search_laptops(ctx, filter, tx.clone()).await {
                Ok(sent) => tracing::info!(sent, "search finished"),
                Err(status) => {
                    log_status(&status);
                    let _ = tx.send(Err(status)).await;
                }
            }
        });

        Ok(Response::new(
            Box::pin(ReceiverStream::new(rx)) as Self::SearchLaptopStream
        ))
    }

    async fn upload_image(
        &self,
        request: Request<Streaming<UploadImageRequest>>,
    ) -> Result<Response<UploadImageResponse>, Status> {
        let ctx = call_context(request.metadata(), &self.shutdown);
        let response = self
            .receive_image(&ctx, request.into_inner())
            .await
            .inspect_err(log_status)?;
        Ok(Response::new(response))
    }

    type RateLaptopStream = ResponseStream<RateLaptopResponse>;

    async fn rate_laptop(
        &self,
        request: Request<Streaming<RateLaptopRequest>>,
    ) -> Result<Response<Self::RateLaptopStream>, Status> {
        let ctx = call_context(request.metadata(), &self.shutdown);
        let requests = request.into_inner();

        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);

        tokio::spawn(async move {
            let _watch = cancel_on_disconnect(&ctx, &tx);
            match Self::rate_laptops(ctx, requests, tx.clone()).await {
                Ok(rated) => tracing::info!(rated, "rating finished"),
                Err(status) => {
                    log_status(&status);
                    let _ = tx.send(Err(status)).await;
                }
            }
        });

        Ok(Response::new(
            Box::pin(ReceiverStream::new(rx)) as Self::RateLaptopStream
        ))
    }
}

/// Server configuration and runner.
#[derive(Debug)]
pub struct CatalogServer {
    config: ServerConfig,
}

impl CatalogServer {
    /// Create a new server from `config`.
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Run the server until shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        self.config.validate()?;

        let laptop_store = Arc::new(InMemoryLaptopStore::new());
        let image_store = Arc::new(DiskImageStore::new(&self.config.image_dir));
        let shutdown = CancellationToken::new();
        let service = CatalogService::new(laptop_store, image_store)
            .with_max_image_size(self.config.max_image_size)
            .with_shutdown(shutdown.clone());

        tracing::info!(
            image_dir = %self.config.image_dir.display(),
            max_image_size = self.config.max_image_size,
            "Starting gRPC server on {}",
            self.config.addr
        );

        tonic::transport::Server::builder()
            .add_service(proto::LaptopServiceServer::new(service))
            .serve_with_shutdown(self.config.addr, shutdown_signal(shutdown))
            .await?;

        tracing::info!("gRPC server shut down");
        Ok(())
    }
}

/// Resolve on the first Ctrl+C or SIGTERM. Streams still running are
/// cancelled through `shutdown` so the server can drain.
async fn shutdown_signal(shutdown: CancellationToken) {
    let signal = wait_for_signal().await;
    tracing::info!(signal, "shutting down, cancelling calls in flight");
    shutdown.cancel();
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            tracing::error!("Failed to install SIGTERM handler: {}", e);
            ctrl_c().await;
            return "SIGINT";
        }
    };
    tokio::select! {
        _ = ctrl_c() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await;
    "Ctrl+C"
}
