//! A toy CSV terrain grid for the `rf path`/`rf viewshed` demo paths
//! (`spec.md` §11 supplemented features): one `lat,lon,elevation_feet` row
//! per sample point, fed into `GridElevationProvider`.

use std::path::Path;

use color_eyre::eyre::{eyre, Result};

use tacfield_core::rfpath::{GridElevationProvider, LatLon};

pub fn load_grid(path: &Path) -> Result<GridElevationProvider> {
    let contents = std::fs::read_to_string(path).map_err(|e| eyre!("failed to read terrain grid {}: {e}", path.display()))?;

    let mut samples = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(eyre!("{}:{}: expected `lat,lon,elevation_feet`, got `{line}`", path.display(), line_no + 1));
        }
        let lat_deg: f64 = fields[0].parse().map_err(|_| eyre!("{}:{}: invalid latitude `{}`", path.display(), line_no + 1, fields[0]))?;
        let lon_deg: f64 = fields[1].parse().map_err(|_| eyre!("{}:{}: invalid longitude `{}`", path.display(), line_no + 1, fields[1]))?;
        let elevation_feet: f64 = fields[2].parse().map_err(|_| eyre!("{}:{}: invalid elevation `{}`", path.display(), line_no + 1, fields[2]))?;
        samples.push((LatLon { lat_deg, lon_deg }, elevation_feet));
    }

    if samples.is_empty() {
        return Err(eyre!("terrain grid {} contained no sample rows", path.display()));
    }
    Ok(GridElevationProvider::new(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_a_well_formed_grid() {
        let mut file = tempfile_with_contents("40.0,-105.0,1000.0\n40.1,-105.0,1200.0\n# a comment\n\n40.2,-105.0,900.0\n");
        let provider = load_grid(file.path()).unwrap();
        let point = LatLon { lat_deg: 40.0, lon_deg: -105.0 };
        use tacfield_core::rfpath::ElevationProvider;
        assert_eq!(provider.elevation_feet(point), Some(1000.0));
        file.flush().unwrap();
    }

    #[test]
    fn rejects_a_malformed_row() {
        let file = tempfile_with_contents("40.0,-105.0\n");
        assert!(load_grid(file.path()).is_err());
    }

    #[test]
    fn rejects_an_empty_file() {
        let file = tempfile_with_contents("# only comments\n");
        assert!(load_grid(file.path()).is_err());
    }

    fn tempfile_with_contents(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }
}
