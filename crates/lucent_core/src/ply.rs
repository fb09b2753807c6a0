//! Minimal PLY reader for triangle meshes.
//!
//! Handles `ascii`, `binary_little_endian` and `binary_big_endian` bodies.
//! Only vertex positions (`x`, `y`, `z`) and the face index list
//! (`vertex_indices` or `vertex_index`) are kept; every other element and
//! property is parsed and skipped. Polygons are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use glam::Vec3;
use thiserror::Error;

/// Errors that can occur while reading a PLY file.
#[derive(Error, Debug)]
pub enum PlyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a PLY file (missing 'ply' magic)")]
    MissingMagic,

    #[error("Header error at line {line}: {message}")]
    Header { line: usize, message: String },

    #[error("Unsupported PLY format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported property type: {0}")]
    UnsupportedProperty(String),

    #[error("Missing required property: {0}")]
    MissingProperty(&'static str),

    #[error("Unexpected end of file in element body")]
    UnexpectedEof,

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Face references vertex {index}, but only {vertex_count} vertices exist")]
    IndexOutOfRange { index: usize, vertex_count: usize },
}

/// Result type for PLY reading.
pub type PlyResult<T> = Result<T, PlyError>;

/// Triangles with 0-based indices into `positions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlyMesh {
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

/// Read a PLY file from disk.
pub fn read_ply<P: AsRef<Path>>(path: P) -> PlyResult<PlyMesh> {
    let file = File::open(path.as_ref())?;
    let mesh = parse_ply(BufReader::new(file))?;
    log::debug!(
        "Read {} vertices, {} triangles from {}",
        mesh.positions.len(),
        mesh.triangles.len(),
        path.as_ref().display()
    );
    Ok(mesh)
}

/// Parse PLY data from any buffered reader.
pub fn parse_ply<R: BufRead>(mut reader: R) -> PlyResult<PlyMesh> {
    let header = Header::read(&mut reader)?;

    match header.encoding {
        Encoding::Ascii => {
            let mut body = String::new();
            reader.read_to_string(&mut body)?;
            let mut values = AsciiValues {
                tokens: body.split_whitespace(),
            };
            read_body(&header, &mut values)
        }
        Encoding::BinaryLittleEndian => read_body(
            &header,
            &mut BinaryValues {
                reader,
                big_endian: false,
            },
        ),
        Encoding::BinaryBigEndian => read_body(
            &header,
            &mut BinaryValues {
                reader,
                big_endian: true,
            },
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Encoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> PlyResult<Self> {
        Ok(match name {
            "char" | "int8" => ScalarType::I8,
            "uchar" | "uint8" => ScalarType::U8,
            "short" | "int16" => ScalarType::I16,
            "ushort" | "uint16" => ScalarType::U16,
            "int" | "int32" => ScalarType::I32,
            "uint" | "uint32" => ScalarType::U32,
            "float" | "float32" => ScalarType::F32,
            "double" | "float64" => ScalarType::F64,
            other => return Err(PlyError::UnsupportedProperty(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Debug, Clone)]
struct Property {
    name: String,
    kind: PropertyKind,
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Debug)]
struct Header {
    encoding: Encoding,
    elements: Vec<Element>,
}

impl Header {
    fn read<R: BufRead>(reader: &mut R) -> PlyResult<Header> {
        let mut line = String::new();
        let mut line_number = 0;
        let mut encoding = None;
        let mut elements: Vec<Element> = Vec::new();

        let header_error = |line: usize, message: &str| PlyError::Header {
            line,
            message: message.to_string(),
        };

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(header_error(line_number, "missing end_header"));
            }
            line_number += 1;
            let mut words = line.split_whitespace();
            let keyword = words.next().unwrap_or("");

            if line_number == 1 {
                if keyword != "ply" {
                    return Err(PlyError::MissingMagic);
                }
                continue;
            }

            match keyword {
                "format" => {
                    encoding = Some(match words.next() {
                        Some("ascii") => Encoding::Ascii,
                        Some("binary_little_endian") => Encoding::BinaryLittleEndian,
                        Some("binary_big_endian") => Encoding::BinaryBigEndian,
                        other => {
                            return Err(PlyError::UnsupportedFormat(
                                other.unwrap_or("").to_string(),
                            ))
                        }
                    });
                }
                "element" => {
                    let name = words
                        .next()
                        .ok_or_else(|| header_error(line_number, "element without name"))?;
                    let count = words
                        .next()
                        .and_then(|c| c.parse().ok())
                        .ok_or_else(|| header_error(line_number, "element without count"))?;
                    elements.push(Element {
                        name: name.to_string(),
                        count,
                        properties: Vec::new(),
                    });
                }
                "property" => {
                    let element = elements
                        .last_mut()
                        .ok_or_else(|| header_error(line_number, "property before element"))?;
                    let parts: Vec<&str> = words.collect();
                    let property = match parts.as_slice() {
                        ["list", count, item, name] => Property {
                            name: name.to_string(),
                            kind: PropertyKind::List {
                                count: ScalarType::parse(count)?,
                                item: ScalarType::parse(item)?,
                            },
                        },
                        [ty, name] => Property {
                            name: name.to_string(),
                            kind: PropertyKind::Scalar(ScalarType::parse(ty)?),
                        },
                        _ => return Err(header_error(line_number, "malformed property")),
                    };
                    element.properties.push(property);
                }
                "end_header" => break,
                "comment" | "obj_info" | "" => {}
                other => {
                    return Err(header_error(
                        line_number,
                        &format!("unknown keyword '{}'", other),
                    ))
                }
            }
        }

        let encoding = encoding.ok_or_else(|| header_error(line_number, "missing format line"))?;
        Ok(Header { encoding, elements })
    }
}

trait ValueSource {
    fn next_value(&mut self, ty: ScalarType) -> PlyResult<f64>;
}

struct AsciiValues<'a> {
    tokens: std::str::SplitWhitespace<'a>,
}

impl ValueSource for AsciiValues<'_> {
    fn next_value(&mut self, _ty: ScalarType) -> PlyResult<f64> {
        let token = self.tokens.next().ok_or(PlyError::UnexpectedEof)?;
        token
            .parse::<f64>()
            .map_err(|_| PlyError::InvalidValue(token.to_string()))
    }
}

struct BinaryValues<R> {
    reader: R,
    big_endian: bool,
}

impl<R: Read> BinaryValues<R> {
    fn bytes<const N: usize>(&mut self) -> PlyResult<[u8; N]> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => PlyError::UnexpectedEof,
            _ => PlyError::Io(e),
        })?;
        if self.big_endian {
            buf.reverse();
        }
        Ok(buf)
    }
}

impl<R: Read> ValueSource for BinaryValues<R> {
    fn next_value(&mut self, ty: ScalarType) -> PlyResult<f64> {
        // Bytes are normalized to little-endian by `bytes`.
        Ok(match ty {
            ScalarType::I8 => i8::from_le_bytes(self.bytes()?) as f64,
            ScalarType::U8 => u8::from_le_bytes(self.bytes()?) as f64,
            ScalarType::I16 => i16::from_le_bytes(self.bytes()?) as f64,
            ScalarType::U16 => u16::from_le_bytes(self.bytes()?) as f64,
            ScalarType::I32 => i32::from_le_bytes(self.bytes()?) as f64,
            ScalarType::U32 => u32::from_le_bytes(self.bytes()?) as f64,
            ScalarType::F32 => f32::from_le_bytes(self.bytes()?) as f64,
            ScalarType::F64 => f64::from_le_bytes(self.bytes()?),
        })
    }
}

fn read_body(header: &Header, values: &mut dyn ValueSource) -> PlyResult<PlyMesh> {
    let mut mesh = PlyMesh::default();
    let mut polygons: Vec<Vec<usize>> = Vec::new();

    for element in &header.elements {
        match element.name.as_str() {
            "vertex" => {
                let position_slots = ["x", "y", "z"].map(|axis| {
                    element.properties.iter().position(|p| p.name == axis)
                });
                if position_slots.iter().any(Option::is_none) {
                    return Err(PlyError::MissingProperty("vertex x/y/z"));
                }
                mesh.positions.reserve(element.count);
                for _ in 0..element.count {
                    let record = read_record(element, values)?;
                    let coord = |axis: usize| {
                        position_slots[axis]
                            .and_then(|slot| record[slot].first().copied())
                            .unwrap_or(0.0) as f32
                    };
                    mesh.positions.push(Vec3::new(coord(0), coord(1), coord(2)));
                }
            }
            "face" => {
                let slot = element
                    .properties
                    .iter()
                    .position(|p| {
                        matches!(p.kind, PropertyKind::List { .. })
                            && (p.name == "vertex_indices" || p.name == "vertex_index")
                    })
                    .ok_or(PlyError::MissingProperty("face vertex_indices"))?;
                polygons.reserve(element.count);
                for _ in 0..element.count {
                    let mut record = read_record(element, values)?;
                    let indices = std::mem::take(&mut record[slot]);
                    polygons.push(indices.into_iter().map(|i| i as usize).collect());
                }
            }
            _ => {
                for _ in 0..element.count {
                    read_record(element, values)?;
                }
            }
        }
    }

    let vertex_count = mesh.positions.len();
    let mut skipped = 0;
    for polygon in polygons {
        if polygon.len() < 3 {
            skipped += 1;
            continue;
        }
        if let Some(&index) = polygon.iter().find(|&&i| i >= vertex_count) {
            return Err(PlyError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        for i in 1..polygon.len() - 1 {
            mesh.triangles
                .push([polygon[0] as u32, polygon[i] as u32, polygon[i + 1] as u32]);
        }
    }
    if skipped > 0 {
        log::warn!("Skipped {} PLY faces with fewer than 3 vertices", skipped);
    }

    Ok(mesh)
}

/// One record of `element`: a value list per property (scalars have one entry).
fn read_record(element: &Element, values: &mut dyn ValueSource) -> PlyResult<Vec<Vec<f64>>> {
    element
        .properties
        .iter()
        .map(|property| match property.kind {
            PropertyKind::Scalar(ty) => Ok(vec![values.next_value(ty)?]),
            PropertyKind::List { count, item } => {
                let n = values.next_value(count)?;
                if n < 0.0 || n.fract() != 0.0 {
                    return Err(PlyError::InvalidValue(format!("list length {}", n)));
                }
                (0..n as usize).map(|_| values.next_value(item)).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_QUAD: &str = "ply
format ascii 1.0
comment a unit quad
element vertex 4
property float x
property float y
property float z
property float nx
element face 1
property list uchar int vertex_indices
end_header
0 0 0 0
1 0 0 0
1 1 0 0
0 1 0 0
4 0 1 2 3
";

    #[test]
    fn test_ascii_quad_is_fan_triangulated() {
        let mesh = parse_ply(ASCII_QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.positions.len(), 4);
        assert_eq!(mesh.positions[2], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    fn binary_triangle(big_endian: bool) -> Vec<u8> {
        let format = if big_endian {
            "binary_big_endian"
        } else {
            "binary_little_endian"
        };
        let mut data = format!(
            "ply\nformat {} 1.0\nelement vertex 3\nproperty double x\nproperty double y\n\
             property double z\nelement face 1\nproperty list uchar uint vertex_index\n\
             end_header\n",
            format
        )
        .into_bytes();
        let vertices = [[0.0f64, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 3.0, -1.5]];
        for v in vertices {
            for c in v {
                data.extend(if big_endian { c.to_be_bytes() } else { c.to_le_bytes() });
            }
        }
        data.push(3);
        for i in [0u32, 1, 2] {
            data.extend(if big_endian { i.to_be_bytes() } else { i.to_le_bytes() });
        }
        data
    }

    #[test]
    fn test_binary_bodies() {
        for big_endian in [false, true] {
            let mesh = parse_ply(binary_triangle(big_endian).as_slice()).unwrap();
            assert_eq!(mesh.positions[2], Vec3::new(0.0, 3.0, -1.5));
            assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        }
    }

    #[test]
    fn test_truncated_binary_body() {
        let mut data = binary_triangle(false);
        data.truncate(data.len() - 2);
        assert!(matches!(
            parse_ply(data.as_slice()),
            Err(PlyError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_header_errors() {
        assert!(matches!(
            parse_ply("obj\n".as_bytes()),
            Err(PlyError::MissingMagic)
        ));
        assert!(matches!(
            parse_ply("ply\nformat ascii_utf16 1.0\nend_header\n".as_bytes()),
            Err(PlyError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            parse_ply(
                "ply\nformat ascii 1.0\nelement vertex 1\nproperty half x\nend_header\n".as_bytes()
            ),
            Err(PlyError::UnsupportedProperty(_))
        ));
        assert!(matches!(
            parse_ply("ply\nformat ascii 1.0\nelement vertex 1\n".as_bytes()),
            Err(PlyError::Header { .. })
        ));
    }

    #[test]
    fn test_face_index_out_of_range() {
        let text = ASCII_QUAD.replace("4 0 1 2 3", "3 0 1 9");
        assert!(matches!(
            parse_ply(text.as_bytes()),
            Err(PlyError::IndexOutOfRange {
                index: 9,
                vertex_count: 4
            })
        ));
    }
}
