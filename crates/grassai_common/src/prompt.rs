//! Prompt assembly
//!
//! One prompt per inference call: a fixed preamble carrying GRASS module
//! knowledge, the environment block rendered from the probe snapshot,
//! prior session turns verbatim, and the user's query. No summarization
//! or token budgeting - the session is folded back in as-is.

use crate::error::{GrassAiError, Result};
use crate::grass::EnvironmentSnapshot;
use crate::session::Session;

/// GRASS module knowledge advertised to the model, grouped the way the
/// manual groups module families.
const GRASS_MODULES: &[(&str, &[&str])] = &[
    (
        "General (g.*)",
        &["g.list", "g.remove", "g.copy", "g.rename", "g.region", "g.proj", "g.gisenv"],
    ),
    (
        "Raster (r.*)",
        &[
            "r.in.gdal", "r.out.gdal", "r.info", "r.stats", "r.univar", "r.mapcalc",
            "r.slope.aspect", "r.watershed", "r.resample", "r.rescale", "r.colors",
        ],
    ),
    (
        "Vector (v.*)",
        &[
            "v.in.ogr", "v.out.ogr", "v.info", "v.db.select", "v.db.addcolumn", "v.buffer",
            "v.overlay", "v.select", "v.centroid", "v.voronoi", "v.clean",
        ],
    ),
    (
        "3D raster (r3.*)",
        &["r3.in.ascii", "r3.info", "r3.mapcalc", "r3.univar", "r3.out.vtk"],
    ),
    (
        "Imagery (i.*)",
        &[
            "i.group", "i.target", "i.class", "i.cluster", "i.maxlik", "i.smap",
            "i.vi", "i.tasscap", "i.pca", "i.fft",
        ],
    ),
    (
        "Database (db.*)",
        &["db.connect", "db.select", "db.execute", "db.tables", "db.columns", "db.describe"],
    ),
    (
        "Temporal (t.*)",
        &["t.create", "t.register", "t.info", "t.list", "t.remove", "t.rast.aggregate"],
    ),
    (
        "Miscellaneous (m.*)",
        &["m.proj", "m.cogo", "m.transform", "m.measure"],
    ),
];

const RESPONSE_GUIDELINES: &str = "\
RESPONSE GUIDELINES:
1. Provide specific, executable GRASS commands with correct syntax
2. Include parameter values where appropriate
3. Suggest GDAL tools when relevant for format conversion or processing
4. Consider the current region and available maps in recommendations
5. Provide step-by-step workflows for complex analyses
6. Put each suggested command on its own line

COMMAND SYNTAX EXAMPLES:
- GRASS: g.list type=raster
- GDAL: gdalinfo input.tif
- Download: wget https://example.com/data.zip

Be practical, specific, and focus on implementable solutions using the
available tools.";

/// Reject empty or whitespace-only input before any network call.
pub fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(GrassAiError::EmptyQuery);
    }
    Ok(trimmed)
}

/// Render the environment block injected into every prompt.
pub fn environment_block(snapshot: &EnvironmentSnapshot) -> String {
    let mut block = String::from("ENVIRONMENT CONTEXT:\n");
    block.push_str(&format!(
        "- GRASS GIS version: {}\n",
        snapshot.grass_version.as_deref().unwrap_or("unknown")
    ));
    block.push_str(&format!("- Database: {}\n", snapshot.database));
    block.push_str(&format!("- Location: {}\n", snapshot.location));
    block.push_str(&format!("- Mapset: {}\n", snapshot.mapset));

    match &snapshot.region {
        Some(r) => {
            block.push_str(&format!(
                "- Region: n={} s={} e={} w={} nsres={} ewres={} ({} rows x {} cols)\n",
                r.north, r.south, r.east, r.west, r.nsres, r.ewres, r.rows, r.cols
            ));
        }
        None => block.push_str("- Region: not available\n"),
    }

    block.push_str(&format!(
        "- Raster maps: {}\n",
        join_or_none(&snapshot.raster_maps)
    ));
    block.push_str(&format!(
        "- Vector maps: {}\n",
        join_or_none(&snapshot.vector_maps)
    ));
    block.push_str(&format!(
        "- GDAL tools: {}\n",
        join_or_none(&snapshot.gdal_tools)
    ));

    block
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

/// The static system preamble: who the assistant is and what it knows.
pub fn system_preamble() -> String {
    let mut preamble = String::from(
        "You are grassai, an expert assistant for GRASS GIS and remote \
         sensing analysis, running inside an active GRASS session.\n\n\
         AVAILABLE GRASS MODULES:\n",
    );
    for (family, modules) in GRASS_MODULES {
        preamble.push_str(&format!("{}: {}\n", family, modules.join(", ")));
    }
    preamble.push('\n');
    preamble.push_str(RESPONSE_GUIDELINES);
    preamble
}

/// Assemble the full single-use prompt for one inference call.
///
/// Prior turns are folded in verbatim, oldest first, so the model sees
/// the whole conversation.
pub fn build_prompt(snapshot: &EnvironmentSnapshot, session: &Session, query: &str) -> String {
    let mut prompt = system_preamble();
    prompt.push_str("\n\n");
    prompt.push_str(&environment_block(snapshot));

    if !session.turns.is_empty() {
        prompt.push_str("\nPREVIOUS CONVERSATION:\n");
        prompt.push_str(&session.context_block());
    }

    prompt.push_str("\nUser query: ");
    prompt.push_str(query);
    prompt
}
