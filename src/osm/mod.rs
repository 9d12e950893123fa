// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Building road network [Graphs](crate::Graph) from
//! [OpenStreetMap](https://www.openstreetmap.org/) data.

mod profile;
mod reader;

pub use profile::{Profile, DRIVE_PROFILE, DRIVE_SERVICE_PROFILE};
pub use reader::{
    add_features_from_buffer, add_features_from_file, add_features_from_io, load_graph,
    load_graph_from_buffer, Error, FileFormat, Options,
};

#[cfg(test)]
mod tests {
    use super::super::{dijkstra, Graph, SearchLimits};
    use super::*;

    const XML: &[u8] = include_bytes!("reader/test_fixtures/simple.osm");
    const XML_GZ: &[u8] = include_bytes!("reader/test_fixtures/simple.osm.gz");
    const XML_BZ2: &[u8] = include_bytes!("reader/test_fixtures/simple.osm.bz2");

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-4),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    macro_rules! assert_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_finite());
        };
    }

    macro_rules! assert_no_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_infinite());
        };
    }

    fn node_ids(g: &Graph) -> Vec<i64> {
        g.iter().map(|n| n.id).collect()
    }

    fn check_simple_graph(g: &Graph) {
        //  1───2───3
        //  │       ↓ ↖
        //  4───5───6───9

        assert_eq!(node_ids(g), vec![1, 2, 3, 4, 5, 6, 9]);
        assert_eq!(g.edge_count(), 14);

        // Check edge lengths
        assert_almost_eq!(g.get_edge(1, 2), 102.9147);
        assert_eq!(g.get_edge(1, 2), g.get_edge(2, 1));
        assert_almost_eq!(g.get_edge(1, 4), 111.1949);
        assert_almost_eq!(g.get_edge(9, 3), 151.5118);

        // Check oneway handling: 3 -> 6 has oneway=yes, 9 -> 3 is a motorway_link
        assert_edge!(g, 3, 6);
        assert_no_edge!(g, 6, 3);
        assert_edge!(g, 9, 3);
        assert_no_edge!(g, 3, 9);

        // Check highway handling: 2 - 5 is a footway, 5 - 7 is a service road
        assert_no_edge!(g, 2, 5);
        assert_no_edge!(g, 5, 2);
        assert!(g.get_node(7).is_none());

        // Check access tag handling: 6 - 8 has access=private
        assert!(g.get_node(8).is_none());

        // Unused and invalid nodes are not loaded
        assert!(g.get_node(13).is_none());
        assert!(g.get_node(14).is_none());

        assert_eq!(g.heuristic_scale(), 1.0);
    }

    #[test]
    fn build_graph_xml() {
        let options = Options {
            file_format: FileFormat::Xml,
            ..Options::default()
        };
        check_simple_graph(&load_graph_from_buffer(&options, XML).unwrap());
    }

    #[test]
    fn build_graph_gz() {
        let options = Options {
            file_format: FileFormat::XmlGz,
            ..Options::default()
        };
        check_simple_graph(&load_graph_from_buffer(&options, XML_GZ).unwrap());
    }

    #[test]
    fn build_graph_bz2() {
        let options = Options {
            file_format: FileFormat::XmlBz2,
            ..Options::default()
        };
        check_simple_graph(&load_graph_from_buffer(&options, XML_BZ2).unwrap());
    }

    #[test]
    fn build_graph_unknown_format() {
        let options = Options::default();
        for data in [XML, XML_GZ, XML_BZ2] {
            check_simple_graph(&load_graph_from_buffer(&options, data).unwrap());
        }
    }

    #[test]
    fn build_graph_from_io() {
        let mut g = Graph::default();
        add_features_from_io(&mut g, &Options::default(), std::io::Cursor::new(XML_BZ2)).unwrap();
        assert_eq!(node_ids(&g), vec![1, 2, 3, 4, 5, 6, 9, 10, 11]);
    }

    #[test]
    fn build_graph_from_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/osm/reader/test_fixtures/simple.osm.gz");
        check_simple_graph(&load_graph(&Options::default(), path).unwrap());
    }

    #[test]
    fn missing_file() {
        let err = load_graph(&Options::default(), "no/such/file.osm").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn malformed_file() {
        let err = load_graph_from_buffer(&Options::default(), b"<osm><way id='1'></node></osm>")
            .unwrap_err();
        assert!(matches!(err, Error::Xml(_)));
    }

    #[test]
    fn detect_file_format() {
        assert_eq!(FileFormat::detect(XML), FileFormat::Xml);
        assert_eq!(FileFormat::detect(XML_GZ), FileFormat::XmlGz);
        assert_eq!(FileFormat::detect(XML_BZ2), FileFormat::XmlBz2);
        assert_eq!(FileFormat::detect(b""), FileFormat::Xml);
    }

    #[test]
    fn retain_all() {
        let options = Options {
            retain_all: true,
            ..Options::default()
        };
        let g = load_graph_from_buffer(&options, XML).unwrap();
        assert_eq!(node_ids(&g), vec![1, 2, 3, 4, 5, 6, 9, 10, 11]);
        assert_eq!(g.edge_count(), 16);
        assert_almost_eq!(g.get_edge(10, 11), 102.9081);
    }

    #[test]
    fn drive_service_profile() {
        let options = Options {
            profile: &DRIVE_SERVICE_PROFILE,
            ..Options::default()
        };
        let g = load_graph_from_buffer(&options, XML).unwrap();
        assert_eq!(node_ids(&g), vec![1, 2, 3, 4, 5, 6, 7, 9]);
        assert_edge!(g, 5, 7);
        assert_edge!(g, 7, 5);
        assert!(g.get_node(8).is_none());
    }

    #[test]
    fn bounding_box() {
        let options = Options {
            bbox: [-97.8695, 22.2495, -97.8665, 22.2515],
            ..Options::default()
        };
        let g = load_graph_from_buffer(&options, XML).unwrap();
        assert_eq!(node_ids(&g), vec![2, 3, 5, 6, 9]);
        assert_eq!(g.edge_count(), 8);
        assert_no_edge!(g, 1, 2);
    }

    #[test]
    fn empty_graph() {
        let options = Options {
            bbox: [10.0, 10.0, 11.0, 11.0],
            ..Options::default()
        };
        let err = load_graph_from_buffer(&options, XML).unwrap_err();
        assert!(matches!(err, Error::EmptyGraph));
    }

    #[test]
    fn route_over_loaded_graph() {
        let g = load_graph_from_buffer(&Options::default(), XML).unwrap();

        // 6 -> 3 is against the oneway, so the route detours through the motorway_link
        let route = dijkstra(&g, 6, 3, SearchLimits::default()).unwrap();
        assert_eq!(route.nodes, vec![6, 9, 3]);

        let route = dijkstra(&g, 3, 6, SearchLimits::default()).unwrap();
        assert_eq!(route.nodes, vec![3, 6]);
    }
}
