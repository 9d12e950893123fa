// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use graph_builder::GraphBuilder;
use log::{debug, info};

use crate::osm::{Profile, DRIVE_PROFILE};
use crate::Graph;

mod graph_builder;
mod model;
mod xml;

/// Format of the input OSM file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format of a file from its first few bytes.
    /// Anything which is not gzip- or bzip2-compressed is assumed to be plain XML.
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::XmlGz
        } else if head.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// Additional controls for interpreting OSM data as a routing [Graph].
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    /// How OSM features should be interpreted and converted into a [Graph].
    pub profile: &'a Profile<'a>,

    /// Format of the input data.
    pub file_format: FileFormat,

    /// Filter features by a specific bounding box. In order: left (min lon), bottom (min lat),
    /// right (max lon), top (max lat). Ignored if all values are set to zero, or at least one
    /// of them is not finite.
    pub bbox: [f64; 4],

    /// Keep every connected component of the road network.
    /// By default, [load_graph] only retains the largest one,
    /// so that isolated fragments don't attract nearest-node lookups.
    pub retain_all: bool,
}

impl Default for Options<'static> {
    fn default() -> Self {
        Self {
            profile: &DRIVE_PROFILE,
            file_format: FileFormat::Unknown,
            bbox: [0.0; 4],
            retain_all: false,
        }
    }
}

/// Error conditions which may occur when building a [Graph] from OSM data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("invalid OSM XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// No routable roads were found in the input (within the bounding box).
    #[error("no routable roads in the provided OSM data")]
    EmptyGraph,
}

/// Internal trait for objects which can stream [osm features](model::Feature)
/// from an underlying source.
trait FeatureReader {
    type Error;
    fn next_feature(&mut self) -> Result<Option<model::Feature>, Self::Error>;
}

impl<E, I: Iterator<Item = Result<model::Feature, E>>> FeatureReader for I {
    type Error = E;

    #[inline]
    fn next_feature(&mut self) -> Result<Option<model::Feature>, E> {
        self.next().transpose()
    }
}

/// Parse OSM features from a reader into a [Graph] as per the provided [Options].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn add_features_from_io<'a, R: io::Read>(
    g: &'a mut Graph,
    options: &'a Options<'a>,
    reader: R,
) -> Result<(), Error> {
    let mut b = io::BufReader::new(reader);

    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(b.fill_buf()?),
        known => known,
    };
    debug!("Reading OSM data as {file_format:?}");

    match file_format {
        FileFormat::Unknown | FileFormat::Xml => {
            let r = xml::Reader::from_io(b);
            GraphBuilder::new(g, options).add_features(r)?;
        }

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(g, options).add_features(r)?;
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            let r = xml::Reader::from_io(io::BufReader::new(d));
            GraphBuilder::new(g, options).add_features(r)?;
        }
    }

    Ok(())
}

/// Parse OSM features from a file at the provided path into a [Graph] as per the provided [Options].
pub fn add_features_from_file<'a, P: AsRef<Path>>(
    g: &'a mut Graph,
    options: &'a Options<'a>,
    path: P,
) -> Result<(), Error> {
    let f = File::open(path)?;
    add_features_from_io(g, options, f)
}

/// Parse OSM features from a static buffer into a [Graph] as per the provided [Options].
pub fn add_features_from_buffer<'a>(
    g: &'a mut Graph,
    options: &'a Options<'a>,
    data: &[u8],
) -> Result<(), Error> {
    let file_format = match options.file_format {
        FileFormat::Unknown => FileFormat::detect(data),
        known => known,
    };

    if file_format == FileFormat::Xml {
        // Fast path is available for in-memory XML data
        let r = xml::Reader::from_buffer(data);
        GraphBuilder::new(g, options).add_features(r)?;
        Ok(())
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let options = Options {
            file_format,
            ..*options
        };
        add_features_from_io(g, &options, io::Cursor::new(data))
    }
}

/// Builds a complete road network [Graph] from an OSM file.
///
/// Unless [Options::retain_all] is set, only the largest weakly connected
/// component is kept. Fails with [Error::EmptyGraph] if no routable roads remain.
pub fn load_graph<P: AsRef<Path>>(options: &Options<'_>, path: P) -> Result<Graph, Error> {
    let mut g = Graph::default();
    add_features_from_file(&mut g, options, path)?;
    finish_graph(g, options)
}

/// Same as [load_graph], but reads OSM data from an in-memory buffer.
pub fn load_graph_from_buffer(options: &Options<'_>, data: &[u8]) -> Result<Graph, Error> {
    let mut g = Graph::default();
    add_features_from_buffer(&mut g, options, data)?;
    finish_graph(g, options)
}

fn finish_graph(mut g: Graph, options: &Options<'_>) -> Result<Graph, Error> {
    if !options.retain_all {
        let removed = g.retain_largest_component();
        if removed > 0 {
            debug!("Removed {removed} nodes outside of the largest connected component");
        }
    }

    if g.is_empty() {
        return Err(Error::EmptyGraph);
    }

    info!(
        "Built {} graph with {} nodes and {} edges",
        options.profile.name,
        g.len(),
        g.edge_count(),
    );
    Ok(g)
}
