//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio_stream::StreamExt;
use tonic::transport::Channel;
use tonic::{Code, Request};

use catalog::{Filter, Laptop, sample, serializer};
use catalog_grpc::LaptopServiceClient;
use catalog_grpc::proto::{
    CreateLaptopRequest, RateLaptopRequest, SearchLaptopRequest, UploadImageRequest,
};

type Client = LaptopServiceClient<Channel>;

/// Deadline for every call made by the CLI.
const TIMEOUT: Duration = Duration::from_secs(5);

/// Upload chunk size.
const CHUNK_SIZE: usize = 1024;

fn with_timeout<T>(message: T) -> Request<T> {
    let mut request = Request::new(message);
    request.set_timeout(TIMEOUT);
    request
}

/// Create one laptop, returning its ID or `None` if it already existed.
async fn create_laptop(client: &mut Client, laptop: Laptop) -> Result<Option<String>> {
    let request = with_timeout(CreateLaptopRequest {
        laptop: Some(laptop),
    });
    match client.create_laptop(request).await {
        Ok(response) => {
            let id = response.into_inner().id;
            tracing::info!(%id, "created laptop");
            Ok(Some(id))
        }
        Err(status) if status.code() == Code::AlreadyExists => {
            println!("laptop already exists");
            Ok(None)
        }
        Err(status) => Err(status).context("Failed to create laptop"),
    }
}

pub async fn create(client: &mut Client, count: usize) -> Result<()> {
    for _ in 0..count {
        if let Some(id) = create_laptop(client, sample::new_laptop()).await? {
            println!("created laptop with id: {id}");
        }
    }
    Ok(())
}

pub async fn search(client: &mut Client, filter: Filter) -> Result<()> {
    println!("search filter: {filter:?}");

    let request = with_timeout(SearchLaptopRequest {
        filter: Some(filter),
    });
    let mut stream = client
        .search_laptop(request)
        .await
        .context("Failed to search laptops")?
        .into_inner();

    let mut found = 0;
    while let Some(response) = stream.next().await {
        let response = response.context("Failed to receive search response")?;
        if let Some(laptop) = response.laptop {
            print_laptop(&laptop);
            found += 1;
        }
    }
    println!("found {found} laptop(s)");
    Ok(())
}

fn print_laptop(laptop: &Laptop) {
    println!("- found: {}", laptop.id);
    println!("  + name: {} {}", laptop.brand, laptop.name);
    if let Some(cpu) = &laptop.cpu {
        println!("  + cpu cores: {}", cpu.number_cores);
        println!("  + cpu min ghz: {}", cpu.min_ghz);
    }
    if let Some(ram) = &laptop.ram {
        println!("  + ram: {} {:?}", ram.value, ram.unit());
    }
    println!("  + price: {:.2} usd", laptop.price_usd);
}

pub async fn upload(client: &mut Client, image: &Path, laptop_id: Option<String>) -> Result<()> {
    let laptop_id = match laptop_id {
        Some(id) => id,
        None => match create_laptop(client, sample::new_laptop()).await? {
            Some(id) => id,
            None => bail!("Failed to create a laptop for the image"),
        },
    };
    let image_type = image
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let data = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read image {}", image.display()))?;

    let mut messages = vec![UploadImageRequest::info(&laptop_id, image_type)];
    messages.extend(data.chunks(CHUNK_SIZE).map(UploadImageRequest::chunk));

    let response = client
        .upload_image(with_timeout(tokio_stream::iter(messages)))
        .await
        .context("Failed to upload image")?
        .into_inner();

    println!(
        "image uploaded with id: {}, size: {}",
        response.id, response.size
    );
    Ok(())
}

pub async fn rate(client: &mut Client, count: usize, rounds: usize) -> Result<()> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        if let Some(id) = create_laptop(client, sample::new_laptop()).await? {
            ids.push(id);
        }
    }

    let mut requests = Vec::with_capacity(ids.len() * rounds);
    for _ in 0..rounds {
        requests.extend(ids.iter().map(|id| RateLaptopRequest {
            laptop_id: id.clone(),
            score: sample::random_laptop_score(),
        }));
    }
    for request in &requests {
        println!("rating laptop {} with {}", request.laptop_id, request.score);
    }

    let mut stream = client
        .rate_laptop(with_timeout(tokio_stream::iter(requests)))
        .await
        .context("Failed to rate laptops")?
        .into_inner();

    while let Some(response) = stream.next().await {
        let response = response.context("Failed to receive rating response")?;
        println!(
            "received response: laptop {} rated {} time(s), average score {:.2}",
            response.laptop_id, response.rated_count, response.average_score
        );
    }
    Ok(())
}

pub fn write_sample(binary: Option<PathBuf>, json: Option<PathBuf>) -> Result<()> {
    let laptop = sample::new_laptop();

    match (&binary, &json) {
        (None, None) => println!("{}", serializer::to_json(&laptop)?),
        _ => {
            if let Some(path) = &binary {
                serializer::write_binary_file(&laptop, path)?;
                println!("wrote {}", path.display());
            }
            if let Some(path) = &json {
                serializer::write_json_file(&laptop, path)?;
                println!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Read a laptop from `input` and write it to `output`, picking each format
/// from the file extension.
pub fn convert(input: &Path, output: &Path) -> Result<()> {
    let laptop: Laptop = if is_json(input) {
        serializer::read_json_file(input)?
    } else {
        serializer::read_binary_file(input)?
    };

    if is_json(output) {
        serializer::write_json_file(&laptop, output)?;
    } else {
        serializer::write_binary_file(&laptop, output)?;
    }
    println!("converted {} -> {}", input.display(), output.display());
    Ok(())
}
