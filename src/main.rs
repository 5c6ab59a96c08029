// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use edgeroute::{
    Algorithm, Coordinate, DefaultWeightHandler, Direction, EdgeIndex, Factor, Graph, GraphRouter,
    MassResolver, MassResolvingAlgorithm, ResolveOptions, RouterPointError, WeightMatrixAlgorithm,
};

#[derive(Debug, thiserror::Error)]
enum ParseError {
    #[error("unknown record type: {0:?}")]
    UnknownRecord(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    #[error("reference to unknown vertex {0}")]
    UnknownVertex(u32),

    #[error("shape point without longitude")]
    UnpairedShapePoint,
}

#[derive(Debug, thiserror::Error)]
enum GraphLoadError {
    #[error("{0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("{0}:{1}: {2}")]
    Parse(PathBuf, usize, #[source] ParseError),
}

#[derive(Parser)]
struct Cli {
    /// The path to the graph file, with "v <lat> <lon>" lines for vertices and
    /// "e <from> <to> <profile> [<lat> <lon>]..." lines for edges
    graph_file: PathBuf,

    /// Locations to compute the weight matrix between, as "lat,lon".
    /// Options must be given before the locations.
    #[arg(required = true, allow_hyphen_values = true, value_parser = parse_location)]
    locations: Vec<Coordinate>,

    /// Maximum distance between a location and its edge, in meters
    #[arg(long, default_value_t = edgeroute::DEFAULT_MAX_EDGE_DISTANCE)]
    max_distance: f32,

    /// Distance around a location in which edges are looked up, in meters
    #[arg(long, default_value_t = edgeroute::DEFAULT_SEARCH_OFFSET)]
    search_offset: f32,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    colog::init();
    let cli = Cli::parse();

    let g = load_graph(&cli.graph_file)?;
    log::info!(
        "loaded {} vertices and {} edges",
        g.vertex_count(),
        g.edge_count()
    );

    let index = EdgeIndex::build(&g);
    let handler = DefaultWeightHandler::new(|_| Factor::new(1.0, Direction::Both));
    let options = ResolveOptions {
        search_offset: cli.search_offset,
        max_distance: cli.max_distance,
    };

    let resolver = MassResolvingAlgorithm::new(&g, &index, &handler, &cli.locations, options);
    let router = GraphRouter::new(&g);
    let mut matrix = WeightMatrixAlgorithm::new(&router, &handler, resolver);
    matrix.run()?;

    let weights = matrix.weights()?;
    let resolve_errors = matrix.mass_resolver().errors()?;
    let route_errors = matrix.errors()?;

    println!("{{");
    println!("  \"weights\": [");
    let mut rows = weights.iter().peekable();
    while let Some(row) = rows.next() {
        let suffix = if rows.peek().is_some() { "," } else { "" };
        let cells: Vec<String> = row.iter().map(|w| w.to_string()).collect();
        println!("    [{}]{}", cells.join(", "), suffix);
    }
    println!("  ],");

    println!("  \"locations\": [");
    for (idx, location) in cli.locations.iter().enumerate() {
        let suffix = if idx + 1 < cli.locations.len() { "," } else { "" };
        let corrected = match matrix.corrected_index_of(idx)? {
            Some(i) => i.to_string(),
            None => "null".to_string(),
        };
        let error = match resolve_errors.get(&idx).or_else(|| route_errors.get(&idx)) {
            Some(e) => format_error(e),
            None => "null".to_string(),
        };
        println!(
            "    {{\"lat\": {}, \"lon\": {}, \"index\": {}, \"error\": {}}}{}",
            location.lat, location.lon, corrected, error, suffix
        );
    }
    println!("  ]");
    println!("}}");

    Ok(())
}

fn format_error(e: &RouterPointError) -> String {
    format!(
        "{{\"code\": \"{:?}\", \"message\": \"{}\"}}",
        e.code,
        e.message.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

fn parse_location(s: &str) -> Result<Coordinate, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got {s:?}"))?;
    let lat = lat.trim().parse().map_err(|e| format!("invalid latitude: {e}"))?;
    let lon = lon.trim().parse().map_err(|e| format!("invalid longitude: {e}"))?;
    if !edgeroute::is_valid_coordinate(lat, lon) {
        return Err(format!("coordinate out of range: {lat},{lon}"));
    }
    Ok(Coordinate { lat, lon })
}

fn load_graph<P: AsRef<Path>>(path: P) -> Result<Graph, GraphLoadError> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|e| GraphLoadError::Io(PathBuf::from(path), e))?;

    let mut g = Graph::new();
    for (line_idx, line) in content.lines().enumerate() {
        parse_line(&mut g, line)
            .map_err(|e| GraphLoadError::Parse(PathBuf::from(path), line_idx + 1, e))?;
    }
    Ok(g)
}

fn parse_line(g: &mut Graph, line: &str) -> Result<(), ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    let mut fields = line.split_whitespace();
    match fields.next() {
        Some("v") => {
            let lat = parse_field(fields.next(), "latitude")?;
            let lon = parse_field(fields.next(), "longitude")?;
            g.add_vertex(lat, lon);
        }

        Some("e") => {
            let from: u32 = parse_field(fields.next(), "from")?;
            let to: u32 = parse_field(fields.next(), "to")?;
            let profile: u16 = parse_field(fields.next(), "profile")?;

            let mut shape = Vec::new();
            while let Some(lat) = fields.next() {
                let lat = parse_field(Some(lat), "shape latitude")?;
                let lon = fields.next().ok_or(ParseError::UnpairedShapePoint)?;
                let lon = parse_field(Some(lon), "shape longitude")?;
                shape.push(Coordinate { lat, lon });
            }

            for v in [from, to] {
                if g.vertex(v).is_none() {
                    return Err(ParseError::UnknownVertex(v));
                }
            }
            g.add_edge(from, to, profile, shape);
        }

        Some(other) => return Err(ParseError::UnknownRecord(other.to_string())),
        None => {}
    }

    Ok(())
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    name: &'static str,
) -> Result<T, ParseError> {
    let field = field.ok_or(ParseError::MissingField(name))?;
    field
        .parse()
        .map_err(|_| ParseError::InvalidNumber(field.to_string()))
}
