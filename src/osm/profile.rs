// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Describes which OSM ways make up a drivable road network,
/// and how to convert them into [Graph](crate::Graph) edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile<'a> {
    /// Human readable name of the routing profile, used only for logging.
    pub name: &'a str,

    /// Values of the [highway](https://wiki.openstreetmap.org/wiki/Key:highway) tag
    /// of ways which can be used for routing. Ways without a matching `highway`
    /// tag are ignored.
    pub highways: &'a [&'a str],

    /// Key-value pairs which disqualify an otherwise matching way,
    /// e.g. `area=yes` or `service=driveway`.
    pub excluded: &'a [(&'a str, &'a str)],

    /// Array of OSM [access tags](https://wiki.openstreetmap.org/wiki/Key:access#Land-based_transportation)
    /// (in order from least to most specific) to consider when checking for road prohibitions.
    ///
    /// This array is also used to follow mode-specific one-way tags
    /// (see [Profile::is_allowed] and [Profile::way_direction]).
    pub access: &'a [&'a str],

    /// Force no routing over [motorroad=yes](https://wiki.openstreetmap.org/wiki/Key:motorroad) ways.
    pub disallow_motorroad: bool,
}

impl<'a> Profile<'a> {
    /// Checks if a way with given tags is part of the road network:
    /// it must have one of the [Profile::highways], none of the [Profile::excluded]
    /// tags, and must be allowed by [Profile::is_allowed].
    pub fn is_routable(&self, tags: &HashMap<String, String>) -> bool {
        let Some(highway) = tags.get("highway") else {
            return false;
        };

        self.highways.contains(&highway.as_str())
            && !self
                .excluded
                .iter()
                .any(|&(k, v)| tags.get(k).map(|s| s.as_str()) == Some(v))
            && self.is_allowed(tags)
    }

    /// Checks if the way is routable, by considering motor roads ([Profile::disallow_motorroad])
    /// and access tags ([Profile::access]).
    pub fn is_allowed(&self, tags: &HashMap<String, String>) -> bool {
        if self.disallow_motorroad && tags.get("motorroad").map(|v| v.as_str()) == Some("yes") {
            return false;
        }

        // The most specific access tag wins
        match self
            .access
            .iter()
            .rev()
            .find_map(|&mode| tags.get(mode).map(|v| v.as_str()))
        {
            Some("no") | Some("private") => false,
            _ => true,
        }
    }

    /// Checks if a way is traversable forward (first return value) and
    /// backwards (second return value) by investigating mode-specific and generic one-way tags.
    ///
    /// Some ways (highway=motorway, highway=motorway_link, junction=roundabout and
    /// junction=circular) default to being one-way, except if overridden by specific tags.
    pub fn way_direction(&self, tags: &HashMap<String, String>) -> (bool, bool) {
        let mut forward = true;
        let mut backward = true;

        match tags.get("highway").map(|s| s.as_str()).unwrap_or("") {
            "motorway" | "motorway_link" => {
                backward = false;
            }
            _ => {}
        }

        match tags.get("junction").map(|s| s.as_str()).unwrap_or("") {
            "roundabout" | "circular" => {
                backward = false;
            }
            _ => {}
        }

        match self.get_active_oneway_value(tags) {
            "yes" | "true" | "1" => {
                forward = true;
                backward = false;
            }

            "-1" | "reverse" => {
                forward = false;
                backward = true;
            }

            "no" | "false" | "0" => {
                forward = true;
                backward = true;
            }

            _ => {}
        }

        (forward, backward)
    }

    /// Returns the value of the most specific "oneway:MODE" tag (based on [Profile::access]),
    /// falling back to simply "oneway", and returning an empty string if no relevant tag was found.
    fn get_active_oneway_value<'t>(&self, tags: &'t HashMap<String, String>) -> &'t str {
        self.access
            .iter()
            .rev()
            .filter(|&&mode| mode != "access")
            .find_map(|&mode| tags.get(&format!("oneway:{}", mode)))
            .or_else(|| tags.get("oneway"))
            .map(|oneway_tag| oneway_tag.as_str())
            .unwrap_or("")
    }
}

const DRIVE_EXCLUDED: &[(&str, &str)] = &[
    ("area", "yes"),
    ("service", "alley"),
    ("service", "driveway"),
    ("service", "emergency_access"),
    ("service", "parking"),
    ("service", "parking_aisle"),
    ("service", "private"),
];

const DRIVE_ACCESS: &[&str] = &["access", "vehicle", "motor_vehicle", "motorcar"];

/// Public drivable streets, excluding service roads, with
/// [access tags](https://wiki.openstreetmap.org/wiki/Key:access) for cars.
pub const DRIVE_PROFILE: Profile = Profile {
    name: "drive",
    highways: &[
        "motorway",
        "motorway_link",
        "trunk",
        "trunk_link",
        "primary",
        "primary_link",
        "secondary",
        "secondary_link",
        "tertiary",
        "tertiary_link",
        "unclassified",
        "residential",
        "living_street",
        "road",
    ],
    excluded: DRIVE_EXCLUDED,
    access: DRIVE_ACCESS,
    disallow_motorroad: false,
};

/// Like [DRIVE_PROFILE], but also routes over `highway=service` roads,
/// except for driveways, parking aisles, alleys and other private service roads.
pub const DRIVE_SERVICE_PROFILE: Profile = Profile {
    name: "drive_service",
    highways: &[
        "motorway",
        "motorway_link",
        "trunk",
        "trunk_link",
        "primary",
        "primary_link",
        "secondary",
        "secondary_link",
        "tertiary",
        "tertiary_link",
        "unclassified",
        "residential",
        "living_street",
        "road",
        "service",
    ],
    excluded: DRIVE_EXCLUDED,
    access: DRIVE_ACCESS,
    disallow_motorroad: false,
};
