// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use roadroute::osm;

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct GraphLoadError(PathBuf, #[source] osm::Error);

#[derive(Parser)]
#[command(version, about = "Shortest driving routes over OpenStreetMap data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Find a single route and print it as GeoJSON
    Route {
        #[command(flatten)]
        graph: GraphArgs,

        /// Latitude of the start point
        #[arg(allow_negative_numbers = true)]
        start_lat: f64,

        /// Longitude of the start point
        #[arg(allow_negative_numbers = true)]
        start_lon: f64,

        /// Latitude of the end point
        #[arg(allow_negative_numbers = true)]
        end_lat: f64,

        /// Longitude of the end point
        #[arg(allow_negative_numbers = true)]
        end_lon: f64,

        /// Use A* instead of Dijkstra's algorithm
        #[arg(long)]
        astar: bool,
    },

    /// Answer route requests over HTTP
    Serve {
        #[command(flatten)]
        graph: GraphArgs,

        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,

        /// Time budget of a single route search, in milliseconds
        #[arg(long, default_value_t = 10_000)]
        timeout_ms: u64,
    },
}

#[derive(Args)]
struct GraphArgs {
    /// The path to the OSM file
    osm_file: PathBuf,

    /// Format of the OSM file
    #[arg(long, value_enum, default_value_t = Format::Unknown)]
    format: Format,

    /// Which roads to route over
    #[arg(long, value_enum, default_value_t = ProfileArg::Drive)]
    profile: ProfileArg,

    /// Only load nodes within min_lon,min_lat,max_lon,max_lat
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    bbox: Option<[f64; 4]>,

    /// Keep disconnected fragments of the road network
    #[arg(long)]
    retain_all: bool,

    /// Maximum number of nodes expanded by a single route search
    #[arg(long, default_value_t = roadroute::DEFAULT_STEP_LIMIT)]
    step_limit: usize,
}

fn parse_bbox(s: &str) -> Result<[f64; 4], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;

    <[f64; 4]>::try_from(values)
        .map_err(|v| format!("expected 4 comma-separated numbers, got {}", v.len()))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Unknown,
    Xml,
    XmlGz,
    XmlBz2,
}

impl From<Format> for osm::FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Unknown => osm::FileFormat::Unknown,
            Format::Xml => osm::FileFormat::Xml,
            Format::XmlGz => osm::FileFormat::XmlGz,
            Format::XmlBz2 => osm::FileFormat::XmlBz2,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileArg {
    Drive,
    DriveService,
}

impl ProfileArg {
    fn profile(self) -> &'static osm::Profile<'static> {
        match self {
            Self::Drive => &osm::DRIVE_PROFILE,
            Self::DriveService => &osm::DRIVE_SERVICE_PROFILE,
        }
    }
}

impl GraphArgs {
    fn options(&self) -> osm::Options<'static> {
        osm::Options {
            profile: self.profile.profile(),
            file_format: self.format.into(),
            bbox: self.bbox.unwrap_or([0.0; 4]),
            retain_all: self.retain_all,
        }
    }

    fn limits(&self) -> roadroute::SearchLimits {
        roadroute::SearchLimits {
            step_limit: self.step_limit,
            deadline: None,
        }
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let mut logger = colog::default_builder();
    logger.parse_default_env();
    logger.init();

    match Cli::parse().command {
        Command::Route {
            graph,
            start_lat,
            start_lon,
            end_lat,
            end_lon,
            astar,
        } => {
            let service = load_service(&graph)?;
            let result = service.compute_route(&roadroute::RouteRequest {
                start_lat,
                start_lon,
                end_lat,
                end_lon,
                use_astar: astar,
            })?;
            print_geojson(&result)?;
        }

        Command::Serve {
            graph,
            bind,
            timeout_ms,
        } => {
            let service = load_service(&graph)?.with_timeout(Duration::from_millis(timeout_ms));
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(serve(service, bind))?;
        }
    }

    Ok(())
}

fn load_service(args: &GraphArgs) -> Result<roadroute::RouteService, Box<dyn Error>> {
    let started = Instant::now();
    let g = load_graph(&args.osm_file, &args.options())?;
    info!(
        "Loaded {} in {:.2?}",
        args.osm_file.display(),
        started.elapsed()
    );

    let service = roadroute::RouteService::new(Arc::new(g))?.with_limits(args.limits());
    Ok(service)
}

fn load_graph<P: AsRef<Path>>(
    path: P,
    options: &osm::Options<'_>,
) -> Result<roadroute::Graph, GraphLoadError> {
    osm::load_graph(options, path.as_ref())
        .map_err(|e| GraphLoadError(PathBuf::from(path.as_ref()), e))
}

async fn serve(service: roadroute::RouteService, bind: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, roadroute::http::router(service)).await
}

fn print_geojson(result: &roadroute::RouteResult) -> Result<(), serde_json::Error> {
    let coordinates: Vec<[f64; 2]> = result.route.iter().map(|&[lat, lon]| [lon, lat]).collect();
    let collection = serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "distance": result.distance,
                    "algorithm": result.algorithm,
                },
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates,
                },
            },
        ],
    });
    println!("{}", serde_json::to_string_pretty(&collection)?);
    Ok(())
}
