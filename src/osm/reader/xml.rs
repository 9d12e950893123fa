// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use log::debug;

use super::model;
use crate::Node;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
pub(super) trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<quick_xml::events::Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
pub(super) struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<quick_xml::events::Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
pub(super) struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<quick_xml::events::Event<'b>> {
        self.0.read_event()
    }
}

/// Reader reads osm [Features](model::Feature) from an XML file.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<model::Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<model::Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };

            match event {
                quick_xml::events::Event::Empty(start) => {
                    match start.local_name().as_ref() {
                        b"node" => {
                            if let Some(n) = parse_node(start) {
                                return Some(Ok(model::Feature::Node(n)));
                            }
                        }
                        // "way" can't be self-closing
                        b"tag" => {
                            if let Some(tags) = feature_tags(&mut f) {
                                if let Some((k, v)) = parse_tag(start) {
                                    tags.insert(k, v);
                                }
                            }
                        }
                        b"nd" => {
                            if let Some(nodes) = feature_nodes(&mut f) {
                                if let Some(ref_) = parse_nd(start) {
                                    nodes.push(ref_);
                                }
                            }
                        }
                        _ => {}
                    }
                }

                quick_xml::events::Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => f = parse_node(start).map(model::Feature::Node),
                    b"way" => f = parse_way(start).map(model::Feature::Way),
                    // "tag" and "nd" must be self-closing,
                    // relations are irrelevant without turn restriction support
                    _ => {}
                },

                quick_xml::events::Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    _ => {}
                },

                quick_xml::events::Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        f.map(Ok)
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    pub(super) fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    pub(super) fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

fn parse_attr<T: std::str::FromStr>(value: &[u8]) -> Option<T> {
    from_utf8(value).ok()?.parse().ok()
}

fn parse_node(start: quick_xml::events::BytesStart<'_>) -> Option<Node> {
    let mut id: i64 = 0;
    let mut lat = f64::NAN;
    let mut lon = f64::NAN;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"id" => id = parse_attr(&attr.value).unwrap_or(0),
            b"lat" => lat = parse_attr(&attr.value).unwrap_or(f64::NAN),
            b"lon" => lon = parse_attr(&attr.value).unwrap_or(f64::NAN),
            _ => {}
        }
    }

    if id != 0 && lat.is_finite() && lon.is_finite() {
        Some(Node { id, lat, lon })
    } else {
        debug!("Skipping node {id} with invalid position ({lat}, {lon})");
        None
    }
}

fn parse_way(start: quick_xml::events::BytesStart<'_>) -> Option<model::Way> {
    let mut id: i64 = 0;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"id" {
            id = parse_attr(&attr.value)?;
        }
    }

    if id != 0 {
        Some(model::Way {
            id,
            nodes: Vec::default(),
            tags: HashMap::default(),
        })
    } else {
        debug!("Skipping way without an id");
        None
    }
}

fn parse_tag(start: quick_xml::events::BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"k" => k = from_utf8(&attr.value).ok().map(|s| s.to_string()),
            b"v" => v = from_utf8(&attr.value).ok().map(|s| s.to_string()),
            _ => {}
        }
    }

    k.map(|k| (k, v.unwrap_or_default()))
}

fn parse_nd(start: quick_xml::events::BytesStart<'_>) -> Option<i64> {
    let mut ref_: i64 = 0;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"ref" {
            ref_ = parse_attr(&attr.value)?;
        }
    }

    if ref_ != 0 {
        Some(ref_)
    } else {
        None
    }
}

fn feature_tags(f: &mut Option<model::Feature>) -> Option<&mut HashMap<String, String>> {
    match f {
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.tags),
        _ => None,
    }
}

fn feature_nodes(f: &mut Option<model::Feature>) -> Option<&mut Vec<i64>> {
    match f {
        Some(model::Feature::Way(ref mut w)) => Some(&mut w.nodes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::model::{Feature, Way};
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    const SIMPLE_XML: &[u8] = include_bytes!("test_fixtures/simple.osm");

    fn get_expected_nodes() -> Vec<Node> {
        [
            (1, 22.2510, -97.8700),
            (2, 22.2510, -97.8690),
            (3, 22.2510, -97.8680),
            (4, 22.2500, -97.8700),
            (5, 22.2500, -97.8690),
            (6, 22.2500, -97.8680),
            (7, 22.2490, -97.8690),
            (8, 22.2490, -97.8680),
            (9, 22.2500, -97.8670),
            (10, 22.2600, -97.8600),
            (11, 22.2600, -97.8590),
            (13, 22.2450, -97.8650),
            (14, 95.0, -97.8650),
        ]
        .into_iter()
        .map(|(id, lat, lon)| Node { id, lat, lon })
        .collect()
    }

    fn get_expected_ways() -> Vec<Way> {
        vec![
            Way {
                id: 100,
                nodes: vec![1, 2, 3],
                tags: tags! {"highway": "primary", "name": "Avenida Hidalgo"},
            },
            Way {
                id: 101,
                nodes: vec![4, 5, 6],
                tags: tags! {"highway": "residential"},
            },
            Way {
                id: 102,
                nodes: vec![1, 4],
                tags: tags! {"highway": "residential"},
            },
            Way {
                id: 103,
                nodes: vec![3, 6],
                tags: tags! {"highway": "residential", "oneway": "yes"},
            },
            Way {
                id: 104,
                nodes: vec![2, 5],
                tags: tags! {"highway": "footway"},
            },
            Way {
                id: 105,
                nodes: vec![5, 7],
                tags: tags! {"highway": "service"},
            },
            Way {
                id: 106,
                nodes: vec![6, 8],
                tags: tags! {"highway": "residential", "access": "private"},
            },
            Way {
                id: 107,
                nodes: vec![10, 11],
                tags: tags! {"highway": "residential"},
            },
            Way {
                id: 108,
                nodes: vec![6, 9, 12],
                tags: tags! {"highway": "residential"},
            },
            Way {
                id: 109,
                nodes: vec![9, 3],
                tags: tags! {"highway": "motorway_link"},
            },
            Way {
                id: 110,
                nodes: vec![14, 9],
                tags: tags! {"highway": "residential"},
            },
        ]
    }

    fn collect_all<I>(features: I) -> Result<(Vec<Node>, Vec<Way>), quick_xml::Error>
    where
        I: Iterator<Item = Result<Feature, quick_xml::Error>>,
    {
        let mut nodes = Vec::default();
        let mut ways = Vec::default();

        for f in features {
            match f? {
                Feature::Node(n) => nodes.push(n),
                Feature::Way(w) => ways.push(w),
            }
        }

        Ok((nodes, ways))
    }

    fn check_against_expected<I>(features: I) -> Result<(), quick_xml::Error>
    where
        I: Iterator<Item = Result<Feature, quick_xml::Error>>,
    {
        let (nodes, ways) = collect_all(features)?;
        assert_eq!(nodes, get_expected_nodes());
        assert_eq!(ways, get_expected_ways());
        Ok(())
    }

    #[test]
    fn parse_from_buf() -> Result<(), quick_xml::Error> {
        check_against_expected(Reader::from_buffer(SIMPLE_XML))
    }

    #[test]
    fn parse_from_io() -> Result<(), quick_xml::Error> {
        check_against_expected(Reader::from_io(io::Cursor::new(SIMPLE_XML)))
    }

    #[test]
    fn malformed_xml() {
        let data = b"<osm><way id='1'><nd ref='1'/></node></osm>";
        let result: Result<Vec<_>, _> = Reader::from_buffer(data).collect();
        assert!(result.is_err());
    }
}
