//! GRASS session probe
//!
//! Read-only introspection of the active GRASS GIS session: gisenv, version,
//! current region and the maps visible in the current mapset. Everything is
//! collected once per invocation by shelling out to the g.* modules that
//! GRASS puts on PATH inside a session.
//!
//! The probe never mutates GRASS state.

use crate::error::{GrassAiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::process::Command;

/// Cap on maps listed per type, to keep the prompt small
pub const MAX_LISTED_MAPS: usize = 20;

/// GDAL/OGR command line tools worth advertising to the model, probed
/// with `which` so only installed ones show up.
const GDAL_TOOL_CANDIDATES: &[&str] = &[
    "gdalinfo",
    "gdal_translate",
    "gdalwarp",
    "gdalbuildvrt",
    "gdal_rasterize",
    "gdal_polygonize",
    "gdal_contour",
    "gdaldem",
    "gdal_grid",
    "gdal_merge",
    "ogrinfo",
    "ogr2ogr",
    "ogrmerge",
];

/// Current computational region from g.region -g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub nsres: f64,
    pub ewres: f64,
    pub rows: u64,
    pub cols: u64,
}

/// Everything we know about the active GRASS session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub grass_version: Option<String>,
    pub database: String,
    pub location: String,
    pub mapset: String,
    pub region: Option<RegionInfo>,
    pub raster_maps: Vec<String>,
    pub vector_maps: Vec<String>,
    pub gdal_tools: Vec<String>,
}

/// Check whether we are inside a GRASS session.
///
/// GRASS exports GISRC pointing at the session rc file; without it the
/// g.* modules are not runnable.
pub fn in_grass_session() -> bool {
    std::env::var_os("GISRC").is_some()
}

/// Collect the environment snapshot for the current session.
///
/// Fails with NotInGrassSession outside GRASS and with Probe when the
/// mandatory gisenv query cannot be run. Version, region and map lists
/// are optional; their absence degrades the prompt, not the program.
pub fn probe() -> Result<EnvironmentSnapshot> {
    if !in_grass_session() {
        return Err(GrassAiError::NotInGrassSession);
    }

    let gisenv_out = read_command("g.gisenv", &["-n"])
        .map_err(|e| GrassAiError::Probe(format!("g.gisenv: {e}")))?;
    let gisenv = parse_key_values(&gisenv_out);

    let database = gisenv.get("GISDBASE").cloned().unwrap_or_default();
    let location = gisenv.get("LOCATION_NAME").cloned().unwrap_or_default();
    let mapset = gisenv.get("MAPSET").cloned().unwrap_or_default();
    if database.is_empty() || location.is_empty() || mapset.is_empty() {
        return Err(GrassAiError::Probe(
            "g.gisenv did not report GISDBASE/LOCATION_NAME/MAPSET".to_string(),
        ));
    }

    let grass_version = read_command("g.version", &["-g"])
        .ok()
        .and_then(|out| parse_key_values(&out).get("version").cloned());

    let region = read_command("g.region", &["-g"])
        .ok()
        .and_then(|out| parse_region(&out));
    if region.is_none() {
        tracing::debug!("g.region unavailable, prompt will omit region");
    }

    let raster_maps = read_command("g.list", &["type=raster", "mapset=."])
        .map(|out| parse_map_list(&out))
        .unwrap_or_default();
    let vector_maps = read_command("g.list", &["type=vector", "mapset=."])
        .map(|out| parse_map_list(&out))
        .unwrap_or_default();

    Ok(EnvironmentSnapshot {
        grass_version,
        database,
        location,
        mapset,
        region,
        raster_maps,
        vector_maps,
        gdal_tools: installed_gdal_tools(),
    })
}

/// Run one introspection command and return its stdout.
fn read_command(program: &str, args: &[&str]) -> std::io::Result<String> {
    let output = Command::new(program).args(args).output()?;
    if !output.status.success() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!(
                "{} exited with {}: {}",
                program,
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse the key=value lines GRASS -g output uses.
fn parse_key_values(output: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('\'').trim_matches('"');
            map.insert(key.trim().to_string(), value.to_string());
        }
    }
    map
}

/// Parse g.region -g output into a RegionInfo.
fn parse_region(output: &str) -> Option<RegionInfo> {
    let kv = parse_key_values(output);
    let f = |k: &str| kv.get(k).and_then(|v| v.parse::<f64>().ok());
    let u = |k: &str| kv.get(k).and_then(|v| v.parse::<u64>().ok());

    Some(RegionInfo {
        north: f("n")?,
        south: f("s")?,
        east: f("e")?,
        west: f("w")?,
        nsres: f("nsres")?,
        ewres: f("ewres")?,
        rows: u("rows")?,
        cols: u("cols")?,
    })
}

/// Parse a g.list output, one map per line, capped at MAX_LISTED_MAPS.
fn parse_map_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(MAX_LISTED_MAPS)
        .map(str::to_string)
        .collect()
}

/// Which of the known GDAL/OGR tools are on PATH.
fn installed_gdal_tools() -> Vec<String> {
    GDAL_TOOL_CANDIDATES
        .iter()
        .filter(|tool| {
            Command::new("which")
                .arg(tool)
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
        })
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gisenv_output() {
        let out = "GISDBASE=/home/user/grassdata\nLOCATION_NAME=nc_spm_08\nMAPSET=PERMANENT\n";
        let kv = parse_key_values(out);
        assert_eq!(kv.get("GISDBASE").unwrap(), "/home/user/grassdata");
        assert_eq!(kv.get("LOCATION_NAME").unwrap(), "nc_spm_08");
        assert_eq!(kv.get("MAPSET").unwrap(), "PERMANENT");
    }

    #[test]
    fn test_parse_key_values_strips_quotes() {
        let kv = parse_key_values("GISDBASE='/data/grass'\n");
        assert_eq!(kv.get("GISDBASE").unwrap(), "/data/grass");
    }

    #[test]
    fn test_parse_region() {
        let out = "n=228500\ns=215000\nw=630000\ne=645000\nnsres=10\newres=10\nrows=1350\ncols=1500\n";
        let region = parse_region(out).unwrap();
        assert_eq!(region.north, 228500.0);
        assert_eq!(region.south, 215000.0);
        assert_eq!(region.nsres, 10.0);
        assert_eq!(region.rows, 1350);
        assert_eq!(region.cols, 1500);
    }

    #[test]
    fn test_parse_region_incomplete_is_none() {
        assert!(parse_region("n=100\ns=0\n").is_none());
        assert!(parse_region("").is_none());
    }

    #[test]
    fn test_parse_map_list_caps_entries() {
        let out = (0..50)
            .map(|i| format!("map_{i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let maps = parse_map_list(&out);
        assert_eq!(maps.len(), MAX_LISTED_MAPS);
        assert_eq!(maps[0], "map_0");
    }

    #[test]
    fn test_parse_map_list_skips_blank_lines() {
        let maps = parse_map_list("elevation\n\nlanduse\n  \nroads\n");
        assert_eq!(maps, vec!["elevation", "landuse", "roads"]);
    }

    #[test]
    fn test_in_grass_session_reflects_gisrc() {
        // Only assert the negative case when GISRC is genuinely unset;
        // test runners inside a GRASS session would see it set.
        if std::env::var_os("GISRC").is_none() {
            assert!(!in_grass_session());
            assert!(matches!(probe(), Err(GrassAiError::NotInGrassSession)));
        }
    }
}
