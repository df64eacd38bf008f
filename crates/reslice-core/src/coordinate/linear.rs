//! Linear coordinate map: origin, per-axis scale and a Z-Y-X Euler rotation.
//!
//! The compiled matrix is
//!
//! ```text
//! L = (Rz(γ) · Ry(β) · Rx(α)) · diag(1, 1, −1) · diag(sx, sy, sz)
//! t = origin
//! ```
//!
//! The third column is negated because tomographic slices stack along a
//! left-handed axis.
//!
//! # Text format
//!
//! ```text
//! TomoOrig(mm) = (0, 0, -12.5)
//! Scale = (1, 1, 1)
//! RelRot(degrees) = (0, 0, 90)
//! ```
//!
//! Tokens are separated by whitespace, `=`, `,`, `(` and `)`. Directive
//! and unit keywords are case-insensitive. `#` and `//` comment to end of
//! line; `/* ... */` may span lines. Missing directives keep their
//! defaults.

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::map::ShiftUnits;
use crate::error::{ResliceError, Result};
use crate::spatial::{AffineMatrix, Axis, MatrixType, Vector3};

/// Unit of a linear map's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginUnits {
    Pixels,
    #[default]
    Millimeters,
}

impl OriginUnits {
    /// Pixel origins shift by pixel-relative amounts.
    pub fn shift_units(self) -> ShiftUnits {
        match self {
            OriginUnits::Pixels => ShiftUnits::Pixels,
            OriginUnits::Millimeters => ShiftUnits::Physical,
        }
    }
}

/// Origin, scale and rotation (radians) of a linear map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearCoordinateMap {
    origin: Vector3,
    origin_units: OriginUnits,
    scale: Vector3,
    rotation: Vector3,
}

impl Default for LinearCoordinateMap {
    fn default() -> Self {
        Self {
            origin: Vector3::zeros(),
            origin_units: OriginUnits::Millimeters,
            scale: Vector3::uniform(1.0),
            rotation: Vector3::zeros(),
        }
    }
}

impl LinearCoordinateMap {
    pub fn new(origin: Vector3, origin_units: OriginUnits, scale: Vector3, rotation: Vector3) -> Self {
        Self {
            origin,
            origin_units,
            scale,
            rotation,
        }
    }

    pub fn with_origin(mut self, origin: Vector3, units: OriginUnits) -> Self {
        self.set_origin(origin, units);
        self
    }

    pub fn with_scale(mut self, scale: Vector3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation angles about x, y and z in radians.
    pub fn with_rotation(mut self, rotation: Vector3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_rotation_degrees(mut self, degrees: Vector3) -> Self {
        self.set_rotation_degrees(degrees);
        self
    }

    pub fn origin(&self) -> Vector3 {
        self.origin
    }

    pub fn origin_units(&self) -> OriginUnits {
        self.origin_units
    }

    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    pub fn rotation(&self) -> Vector3 {
        self.rotation
    }

    pub fn rotation_degrees(&self) -> Vector3 {
        Vector3(self.rotation.0.map(f64::to_degrees))
    }

    pub fn set_origin(&mut self, origin: Vector3, units: OriginUnits) {
        self.origin = origin;
        self.origin_units = units;
    }

    pub fn set_scale(&mut self, scale: Vector3) {
        self.scale = scale;
    }

    pub fn set_rotation(&mut self, radians: Vector3) {
        self.rotation = radians;
    }

    pub fn set_rotation_degrees(&mut self, degrees: Vector3) {
        self.rotation = Vector3(degrees.0.map(f64::to_radians));
    }

    pub fn shift_units(&self) -> ShiftUnits {
        self.origin_units.shift_units()
    }

    /// Origin in millimetres; pixel origins are multiplied by `resolutions`.
    pub fn origin_mm(&self, resolutions: Option<&Vector3>) -> Vector3 {
        let mut origin = self.origin;
        if self.origin_units == OriginUnits::Pixels {
            if let Some(res) = resolutions {
                origin.multiply_each(res);
            }
        }
        origin
    }

    /// Compile the parameters into one affine matrix.
    pub fn matrix(&self) -> AffineMatrix {
        let rx = AffineMatrix::build_axis_rotation(Axis::X, self.rotation.x()).linear();
        let ry = AffineMatrix::build_axis_rotation(Axis::Y, self.rotation.y()).linear();
        let rz = AffineMatrix::build_axis_rotation(Axis::Z, self.rotation.z()).linear();
        let mut linear: Matrix3<f64> = rz * ry * rx;
        for r in 0..3 {
            linear[(r, 2)] = -linear[(r, 2)];
        }
        for c in 0..3 {
            for r in 0..3 {
                linear[(r, c)] *= self.scale[c];
            }
        }
        AffineMatrix::from_parts(linear, self.origin, MatrixType::Composite)
    }

    /// Parse the text format.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text);
        let mut map = Self::default();
        let mut cursor = Cursor {
            tokens: &tokens,
            pos: 0,
        };

        while let Some(token) = cursor.advance() {
            match token.text.to_ascii_lowercase().as_str() {
                "tomoorig" => {
                    let units = match cursor.peek_lower().as_deref() {
                        Some("pixels" | "pixel" | "pix") => {
                            cursor.pos += 1;
                            OriginUnits::Pixels
                        }
                        Some("mm") => {
                            cursor.pos += 1;
                            OriginUnits::Millimeters
                        }
                        _ => OriginUnits::Millimeters,
                    };
                    let origin = cursor.triple(token)?;
                    map.set_origin(origin, units);
                }
                "scale" => {
                    map.scale = cursor.triple(token)?;
                }
                "relrot" => {
                    let radians = match cursor.peek_lower().as_deref() {
                        Some("rad" | "radians") => {
                            cursor.pos += 1;
                            true
                        }
                        Some("deg" | "degrees") => {
                            cursor.pos += 1;
                            false
                        }
                        _ => false,
                    };
                    let angles = cursor.triple(token)?;
                    if radians {
                        map.set_rotation(angles);
                    } else {
                        map.set_rotation_degrees(angles);
                    }
                }
                _ => {
                    return Err(ResliceError::format(
                        token.line,
                        token.text,
                        "unknown directive",
                    ))
                }
            }
        }

        tracing::debug!(
            origin = %map.origin,
            scale = %map.scale,
            rotation = %map.rotation_degrees(),
            "parsed linear coordinate map"
        );
        Ok(map)
    }

    /// Render the text format: origin in millimetres, rotation in degrees.
    pub fn to_text(&self, resolutions: Option<&Vector3>) -> String {
        let origin = self.origin_mm(resolutions);
        let rotation = self.rotation_degrees();
        format!(
            "TomoOrig(mm) = ({}, {}, {})\nScale = ({}, {}, {})\nRelRot(degrees) = ({}, {}, {})\n",
            origin.x(),
            origin.y(),
            origin.z(),
            self.scale.x(),
            self.scale.y(),
            self.scale.z(),
            rotation.x(),
            rotation.y(),
            rotation.z()
        )
    }
}

impl FromStr for LinearCoordinateMap {
    type Err = ResliceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    line: usize,
}

struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'t, 'a> Cursor<'t, 'a> {
    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn peek_lower(&self) -> Option<String> {
        self.tokens
            .get(self.pos)
            .map(|t| t.text.to_ascii_lowercase())
    }

    fn number(&mut self, directive: Token<'a>) -> Result<f64> {
        match self.advance() {
            Some(token) => token.text.parse::<f64>().map_err(|_| {
                ResliceError::format(token.line, token.text, "expected a number")
            }),
            None => Err(ResliceError::format(
                directive.line,
                directive.text,
                "unexpected end of input, expected three values",
            )),
        }
    }

    fn triple(&mut self, directive: Token<'a>) -> Result<Vector3> {
        Ok(Vector3::new(
            self.number(directive)?,
            self.number(directive)?,
            self.number(directive)?,
        ))
    }
}

/// Split into tokens, dropping comments, keeping 1-based line numbers.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut in_block = false;

    for (n, line) in text.lines().enumerate() {
        let line_no = n + 1;
        let mut rest = line;
        while !rest.is_empty() {
            if in_block {
                match rest.find("*/") {
                    Some(end) => {
                        rest = &rest[end + 2..];
                        in_block = false;
                    }
                    None => break,
                }
                continue;
            }
            let cut = [rest.find('#'), rest.find("//"), rest.find("/*")]
                .into_iter()
                .flatten()
                .min();
            let (code, tail) = match cut {
                Some(i) => (&rest[..i], Some(&rest[i..])),
                None => (rest, None),
            };
            tokens.extend(
                code.split(|c: char| c.is_whitespace() || matches!(c, '=' | ',' | '(' | ')'))
                    .filter(|t| !t.is_empty())
                    .map(|text| Token {
                        text,
                        line: line_no,
                    }),
            );
            match tail {
                Some(t) if t.starts_with("/*") => {
                    in_block = true;
                    rest = &t[2..];
                }
                _ => break,
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matrix_flips_third_axis() {
        let m = LinearCoordinateMap::default().matrix();
        assert!(m.approx_eq(&AffineMatrix::build_scale(1.0, 1.0, -1.0), 1e-12));
    }

    #[test]
    fn test_scale_and_origin() {
        let map = LinearCoordinateMap::default()
            .with_scale(Vector3::new(2.0, 3.0, 4.0))
            .with_origin(Vector3::new(1.0, 2.0, 3.0), OriginUnits::Millimeters);
        let p = map.matrix().product(&Vector3::new(1.0, 1.0, 1.0));
        assert!(p.approx_eq(&Vector3::new(3.0, 5.0, -1.0), 1e-12));
    }

    #[test]
    fn test_z_rotation() {
        let map = LinearCoordinateMap::default().with_rotation_degrees(Vector3::new(0.0, 0.0, 90.0));
        let p = map.matrix().product(&Vector3::new(1.0, 0.0, 0.0));
        assert!(p.approx_eq(&Vector3::new(0.0, 1.0, 0.0), 1e-12));
    }

    #[test]
    fn test_parse_full() {
        let text = "TomoOrig(pixels) = (1, 2, 3)\nScale=(2,2,2)\nRelRot(radians)=(0 0 1.5)\n";
        let map = LinearCoordinateMap::parse(text).unwrap();
        assert_eq!(map.origin(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(map.origin_units(), OriginUnits::Pixels);
        assert_eq!(map.scale(), Vector3::uniform(2.0));
        assert_eq!(map.rotation(), Vector3::new(0.0, 0.0, 1.5));
        assert_eq!(map.shift_units(), ShiftUnits::Pixels);
    }

    #[test]
    fn test_parse_defaults_and_units() {
        let map = LinearCoordinateMap::parse("relrot = (90, 0, 0)").unwrap();
        assert_eq!(map.origin(), Vector3::zeros());
        assert_eq!(map.origin_units(), OriginUnits::Millimeters);
        assert_eq!(map.scale(), Vector3::uniform(1.0));
        assert!((map.rotation().x() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);

        assert_eq!(LinearCoordinateMap::parse("").unwrap(), LinearCoordinateMap::default());
    }

    #[test]
    fn test_parse_comments() {
        let text = "# header\n\
                    Scale = (2, 2, 2) // trailing\n\
                    /* TomoOrig(mm) = (9, 9, 9)\n\
                    still comment */ TomoOrig(mm) = (1, 0, 0)\n";
        let map = LinearCoordinateMap::parse(text).unwrap();
        assert_eq!(map.scale(), Vector3::uniform(2.0));
        assert_eq!(map.origin(), Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_parse_errors_name_line_and_token() {
        let err = LinearCoordinateMap::parse("Scale = (1, 1, 1)\nOrigin = (1, 2, 3)").unwrap_err();
        assert_eq!(err, ResliceError::format(2, "Origin", "unknown directive"));

        let err = LinearCoordinateMap::parse("Scale = (1, x, 1)").unwrap_err();
        assert!(matches!(err, ResliceError::Format { line: 1, ref token, .. } if token == "x"));

        let err = LinearCoordinateMap::parse("Scale = (1, 1)").unwrap_err();
        assert!(matches!(err, ResliceError::Format { line: 1, .. }));
    }

    #[test]
    fn test_write_uses_mm_and_degrees() {
        let map = LinearCoordinateMap::default()
            .with_origin(Vector3::new(2.0, 4.0, 6.0), OriginUnits::Pixels)
            .with_rotation(Vector3::new(0.0, 0.0, 0.5));
        let text = map.to_text(Some(&Vector3::new(0.5, 0.5, 2.0)));
        assert!(text.contains("TomoOrig(mm) = (1, 2, 12)"));
        assert!(text.contains("RelRot(degrees) = (0, 0, "));
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with('\n'));

        let back = LinearCoordinateMap::parse(&text).unwrap();
        assert_eq!(back.origin_units(), OriginUnits::Millimeters);
        assert_eq!(back.origin(), Vector3::new(1.0, 2.0, 12.0));
        assert!((back.rotation().z() - 0.5).abs() < 1e-12);
    }
}
