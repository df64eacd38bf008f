use anyhow::{Context, Result};
use reslice_core::coordinate::{CoordinateMap, LinearCoordinateMap};
use reslice_core::spatial::Vector3;
use std::fs;
use std::path::Path;

/// Read a linear coordinate map in the `TomoOrig` / `Scale` / `RelRot` text format.
pub fn read_linear_map<P: AsRef<Path>>(path: P) -> Result<LinearCoordinateMap> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read coordinate map {}", path.display()))?;
    let map = LinearCoordinateMap::parse(&text)
        .with_context(|| format!("Failed to parse coordinate map {}", path.display()))?;
    tracing::info!(path = %path.display(), origin = %map.origin(), "read linear coordinate map");
    Ok(map)
}

/// Write a linear coordinate map; pixel origins are converted with `resolutions`.
pub fn write_linear_map<P: AsRef<Path>>(
    path: P,
    map: &LinearCoordinateMap,
    resolutions: Option<&Vector3>,
) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, map.to_text(resolutions))
        .with_context(|| format!("Failed to write coordinate map {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote linear coordinate map");
    Ok(())
}

/// Read any coordinate map saved with [`write_coordinate_map`].
pub fn read_coordinate_map<P: AsRef<Path>>(path: P) -> Result<CoordinateMap> {
    let path = path.as_ref();
    let script = fs::read_to_string(path)
        .with_context(|| format!("Failed to read coordinate map {}", path.display()))?;
    let map = CoordinateMap::from_script(&script)
        .with_context(|| format!("Failed to rebuild coordinate map from {}", path.display()))?;
    tracing::info!(path = %path.display(), kind = map.name(), "read coordinate map");
    Ok(map)
}

pub fn write_coordinate_map<P: AsRef<Path>>(path: P, map: &CoordinateMap) -> Result<()> {
    let path = path.as_ref();
    let script = map.to_script().context("Failed to serialize coordinate map")?;
    fs::write(path, script)
        .with_context(|| format!("Failed to write coordinate map {}", path.display()))?;
    tracing::info!(path = %path.display(), kind = map.name(), "wrote coordinate map");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reslice_core::coordinate::{NiftiQForm, OriginUnits};
    use tempfile::tempdir;

    #[test]
    fn test_linear_map_file_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("map.txt");

        let map = LinearCoordinateMap::default()
            .with_origin(Vector3::new(4.0, 0.0, -2.0), OriginUnits::Pixels)
            .with_scale(Vector3::new(1.0, 1.0, 2.5))
            .with_rotation_degrees(Vector3::new(0.0, 15.0, 0.0));
        write_linear_map(&file_path, &map, Some(&Vector3::new(0.5, 0.5, 3.0)))?;

        let back = read_linear_map(&file_path)?;
        assert_eq!(back.origin_units(), OriginUnits::Millimeters);
        assert_eq!(back.origin(), Vector3::new(2.0, 0.0, -6.0));
        assert_eq!(back.scale(), map.scale());
        assert!((back.rotation_degrees().y() - 15.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_hand_written_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("map.txt");
        fs::write(
            &file_path,
            "// exported by hand\nTOMOORIG pix 1 2 3\n/* no rotation */\nscale = (2, 2, 2)\n",
        )?;
        let map = read_linear_map(&file_path)?;
        assert_eq!(map.origin_units(), OriginUnits::Pixels);
        assert_eq!(map.scale(), Vector3::uniform(2.0));
        assert_eq!(map.rotation(), Vector3::zeros());
        Ok(())
    }

    #[test]
    fn test_parse_error_reports_line() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("bad.txt");
        fs::write(&file_path, "Scale = (1, 1, 1)\nRelRot(deg) = (0, zero, 0)\n")?;
        let err = read_linear_map(&file_path).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("zero"), "{message}");
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_linear_map(dir.path().join("absent.txt")).is_err());
    }

    #[test]
    fn test_coordinate_map_script_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("map.json");
        let map = CoordinateMap::nifti_qform(NiftiQForm::new([0.0, 0.0, 0.5], -1.0, [1.0, 2.0, 3.0], [4.0, 5.0, 6.0]));
        write_coordinate_map(&file_path, &map)?;
        assert_eq!(read_coordinate_map(&file_path)?, map);
        Ok(())
    }
}
