//! EXIF pass-through for exported images.
//!
//! Metadata is read from the original file, sanitized for the rendered
//! output and re-embedded into the encoded JPEG as an APP1 segment.
//! Sanitizing always drops the orientation tag, because the rendered
//! pixels are already oriented, and drops the region-of-interest tags when
//! the output geometry differs from the source.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Field, In, Reader, Tag, Value};
use thiserror::Error;

/// Tags that locate the subject in source pixel coordinates.
pub const REGION_OF_INTEREST_TAGS: [Tag; 2] = [Tag::SubjectArea, Tag::SubjectLocation];

/// Layout tags that describe the source file rather than the image and are
/// rebuilt by the writer.
const LAYOUT_TAGS: [Tag; 9] = [
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::StripOffsets,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
];

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

/// Errors that can occur while carrying metadata over.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to open {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to read EXIF: {0}")]
    Read(String),

    #[error("Failed to write EXIF: {0}")]
    Write(String),

    #[error("No metadata fields to write")]
    Empty,

    #[error("Not a JPEG stream")]
    NotJpeg,

    #[error("EXIF block of {0} bytes does not fit in one segment")]
    TooLarge(usize),
}

/// EXIF fields read from a source file.
#[derive(Debug, Clone)]
pub struct SourceMetadata {
    fields: Vec<Field>,
    little_endian: bool,
}

impl SourceMetadata {
    /// Wrap fields directly. Written big-endian.
    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self {
            fields,
            little_endian: false,
        }
    }

    /// Read EXIF from an image container (JPEG, PNG, TIFF...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetadataError> {
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .map_err(|e| MetadataError::Read(e.to_string()))?;
        Ok(Self {
            fields: exif.fields().cloned().collect(),
            little_endian: exif.little_endian(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, MetadataError> {
        let file = File::open(path).map_err(|e| MetadataError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let exif = Reader::new()
            .read_from_container(&mut BufReader::new(file))
            .map_err(|e| MetadataError::Read(e.to_string()))?;
        Ok(Self {
            fields: exif.fields().cloned().collect(),
            little_endian: exif.little_endian(),
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `tag` is present in any IFD.
    pub fn contains(&self, tag: Tag) -> bool {
        self.fields.iter().any(|f| f.tag == tag)
    }

    /// Metadata suitable for a rendered output.
    ///
    /// Orientation is dropped from every IFD. Region-of-interest tags are
    /// kept only when `geometry_identity` holds. Fields of unknown type are
    /// dropped, and so is the thumbnail IFD once the primary IFD is empty,
    /// since neither can be written back.
    pub fn sanitized(&self, geometry_identity: bool) -> SourceMetadata {
        let mut fields: Vec<Field> = self
            .fields
            .iter()
            .filter(|f| f.tag != Tag::Orientation)
            .filter(|f| !LAYOUT_TAGS.contains(&f.tag))
            .filter(|f| geometry_identity || !REGION_OF_INTEREST_TAGS.contains(&f.tag))
            .filter(|f| !matches!(f.value, Value::Unknown(..)))
            .cloned()
            .collect();
        if !fields.iter().any(|f| f.ifd_num == In::PRIMARY) {
            fields.clear();
        }
        SourceMetadata {
            fields,
            little_endian: self.little_endian,
        }
    }

    /// Serialize the fields as a TIFF-structured EXIF block.
    pub fn to_exif_block(&self) -> Result<Vec<u8>, MetadataError> {
        if self.fields.is_empty() {
            return Err(MetadataError::Empty);
        }
        let mut writer = Writer::new();
        for field in &self.fields {
            writer.push_field(field);
        }
        let mut buffer = Cursor::new(Vec::new());
        writer
            .write(&mut buffer, self.little_endian)
            .map_err(|e| MetadataError::Write(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

/// Insert `tiff` as an APP1 EXIF segment into `jpeg`.
///
/// The segment goes right after SOI, or after a leading JFIF APP0 segment.
pub fn embed_exif(jpeg: &[u8], tiff: &[u8]) -> Result<Vec<u8>, MetadataError> {
    if jpeg.len() < 4 || jpeg[0..2] != [0xFF, 0xD8] {
        return Err(MetadataError::NotJpeg);
    }
    let payload = EXIF_HEADER.len() + tiff.len();
    if payload > MAX_SEGMENT_PAYLOAD {
        return Err(MetadataError::TooLarge(tiff.len()));
    }

    let mut insert_at = 2;
    if jpeg[2..4] == [0xFF, 0xE0] && jpeg.len() >= 6 {
        let app0_len = u16::from_be_bytes([jpeg[4], jpeg[5]]) as usize;
        insert_at = (4 + app0_len).min(jpeg.len());
    }

    let mut output = Vec::with_capacity(jpeg.len() + payload + 4);
    output.extend_from_slice(&jpeg[..insert_at]);
    output.extend_from_slice(&[0xFF, 0xE1]);
    output.extend_from_slice(&((payload + 2) as u16).to_be_bytes());
    output.extend_from_slice(EXIF_HEADER);
    output.extend_from_slice(tiff);
    output.extend_from_slice(&jpeg[insert_at..]);
    Ok(output)
}
