//! MetaImage (.mha / .mhd) reader and writer
//!
//! A MetaImage file is a `Key = Value` text header terminated by the
//! `ElementDataFile` line. With `ElementDataFile = LOCAL` the pixel data
//! follows the header in the same file (`.mha`); otherwise it names a sibling
//! data file (`.mhd` + `.raw`/`.zraw`).

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{DissolveError, Result};
use crate::models::{AnyImage, ElementType, Image, LabelPixel};
use crate::with_any_image;

/// Parsed MetaImage header
#[derive(Debug, Clone, PartialEq)]
pub struct MetaHeader {
    /// Extent along each axis
    pub dim_size: Vec<usize>,
    /// Pixel spacing
    pub spacing: Vec<f64>,
    /// Physical origin
    pub offset: Vec<f64>,
    /// Stored element type
    pub element_type: ElementType,
    /// Pixel data is zlib compressed
    pub compressed: bool,
    /// Size of the compressed stream, when known
    pub compressed_size: Option<usize>,
    /// Pixel data is big-endian
    pub msb: bool,
    /// Bytes to skip in a separate data file; -1 means "data is at the end"
    pub header_size: i64,
    /// `LOCAL` or a path relative to the header
    pub data_file: String,
}

impl MetaHeader {
    /// Number of pixels described by the header
    pub fn num_pixels(&self) -> Result<usize> {
        self.dim_size
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
            .ok_or_else(|| DissolveError::header(format!("DimSize {:?} is too large", self.dim_size)))
    }

    /// Uncompressed data size in bytes
    pub fn data_len(&self) -> Result<usize> {
        self.num_pixels()?
            .checked_mul(self.element_type.size())
            .ok_or_else(|| DissolveError::header(format!("DimSize {:?} is too large", self.dim_size)))
    }

    /// Parse header lines; returns the header and the number of bytes consumed
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut ndims: Option<usize> = None;
        let mut dim_size = None;
        let mut spacing = None;
        let mut element_size = None;
        let mut offset = None;
        let mut element_type = None;
        let mut compressed = false;
        let mut compressed_size = None;
        let mut msb = false;
        let mut header_size = 0;
        let mut data_file = None;

        let mut pos = 0;
        while pos < bytes.len() {
            let end = bytes[pos..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|i| pos + i + 1)
                .unwrap_or(bytes.len());
            let line = std::str::from_utf8(&bytes[pos..end])
                .map_err(|_| DissolveError::header("header is not valid text"))?
                .trim();
            pos = end;

            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| DissolveError::header(format!("expected 'Key = Value', got '{}'", line)))?;
            let key = key.trim();
            let value = value.trim();

            match key {
                "ObjectType" if !value.eq_ignore_ascii_case("Image") => {
                    return Err(DissolveError::header(format!("unsupported ObjectType '{}'", value)));
                }
                "NDims" => ndims = Some(parse_value::<usize>(key, value)?),
                "DimSize" => dim_size = Some(parse_values::<usize>(key, value)?),
                "ElementSpacing" => spacing = Some(parse_values::<f64>(key, value)?),
                "ElementSize" => element_size = Some(parse_values::<f64>(key, value)?),
                "Offset" | "Origin" | "Position" => offset = Some(parse_values::<f64>(key, value)?),
                "ElementType" => element_type = Some(value.parse::<ElementType>()?),
                "CompressedData" => compressed = parse_bool(key, value)?,
                "CompressedDataSize" => compressed_size = Some(parse_value::<usize>(key, value)?),
                "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => msb = parse_bool(key, value)?,
                "BinaryData" if !parse_bool(key, value)? => {
                    return Err(DissolveError::UnsupportedFormat("ASCII MetaImage data".into()));
                }
                "ElementNumberOfChannels" if value != "1" => {
                    return Err(DissolveError::UnsupportedPixelType(format!(
                        "{} channels per pixel",
                        value
                    )));
                }
                "HeaderSize" => header_size = parse_value::<i64>(key, value)?,
                "ElementDataFile" => {
                    data_file = Some(value.to_string());
                    break;
                }
                _ => {}
            }
        }

        let data_file = data_file.ok_or_else(|| DissolveError::header("missing ElementDataFile"))?;
        let dim_size = dim_size.ok_or_else(|| DissolveError::header("missing DimSize"))?;
        let element_type = element_type.ok_or_else(|| DissolveError::header("missing ElementType"))?;

        let ndims = ndims.unwrap_or(dim_size.len());
        if ndims == 0 || dim_size.len() != ndims {
            return Err(DissolveError::header(format!(
                "NDims is {} but DimSize has {} values",
                ndims,
                dim_size.len()
            )));
        }

        let spacing = spacing.or(element_size).unwrap_or_else(|| vec![1.0; ndims]);
        let offset = offset.unwrap_or_else(|| vec![0.0; ndims]);
        if spacing.len() != ndims || offset.len() != ndims {
            return Err(DissolveError::header(format!(
                "spacing/offset do not have {} values",
                ndims
            )));
        }

        let header = Self {
            dim_size,
            spacing,
            offset,
            element_type,
            compressed,
            compressed_size,
            msb,
            header_size,
            data_file,
        };
        header.data_len()?;

        Ok((header, pos))
    }

    /// Render the header text
    pub fn to_text(&self) -> String {
        let join = |values: Vec<String>| values.join(" ");
        let ndims = self.dim_size.len();
        let identity: Vec<String> = (0..ndims * ndims)
            .map(|i| if i % (ndims + 1) == 0 { "1" } else { "0" }.to_string())
            .collect();

        let mut text = String::new();
        text.push_str("ObjectType = Image\n");
        text.push_str(&format!("NDims = {}\n", ndims));
        text.push_str("BinaryData = True\n");
        text.push_str(&format!("BinaryDataByteOrderMSB = {}\n", bool_str(self.msb)));
        text.push_str(&format!("CompressedData = {}\n", bool_str(self.compressed)));
        if let (true, Some(size)) = (self.compressed, self.compressed_size) {
            text.push_str(&format!("CompressedDataSize = {}\n", size));
        }
        text.push_str(&format!("TransformMatrix = {}\n", join(identity)));
        text.push_str(&format!(
            "Offset = {}\n",
            join(self.offset.iter().map(|v| v.to_string()).collect())
        ));
        text.push_str(&format!(
            "ElementSpacing = {}\n",
            join(self.spacing.iter().map(|v| v.to_string()).collect())
        ));
        text.push_str(&format!(
            "DimSize = {}\n",
            join(self.dim_size.iter().map(|v| v.to_string()).collect())
        ));
        text.push_str(&format!("ElementType = {}\n", self.element_type.to_met_name()));
        text.push_str(&format!("ElementDataFile = {}\n", self.data_file));
        text
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(DissolveError::header(format!("{} must be True or False, got '{}'", key, value))),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| DissolveError::header(format!("invalid {} '{}'", key, value)))
}

fn parse_values<T: std::str::FromStr>(key: &str, value: &str) -> Result<Vec<T>> {
    value
        .split_whitespace()
        .map(|v| parse_value(key, v))
        .collect()
}

/// Read a MetaImage file
pub fn read(path: &Path) -> Result<AnyImage> {
    let bytes = fs::read(path)?;
    let (header, consumed) = MetaHeader::parse(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        size = ?header.dim_size,
        element_type = %header.element_type,
        compressed = header.compressed,
        "read MetaImage header"
    );

    let raw = if header.data_file.eq_ignore_ascii_case("LOCAL") {
        bytes[consumed..].to_vec()
    } else {
        let data_path = data_file_path(path, &header.data_file)?;
        let data = fs::read(&data_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DissolveError::file_not_found(&data_path),
            _ => e.into(),
        })?;
        skip_header_bytes(data, &header)?
    };

    let data = if header.compressed {
        let stream = match header.compressed_size {
            Some(size) if size <= raw.len() => &raw[..size],
            _ => &raw[..],
        };
        // at most one byte past the expected length
        let limit = (header.data_len()? as u64).saturating_add(1);
        let mut decoded = Vec::new();
        ZlibDecoder::new(stream)
            .take(limit)
            .read_to_end(&mut decoded)
            .map_err(|e| DissolveError::header(format!("corrupt compressed data: {}", e)))?;
        decoded
    } else {
        raw
    };

    decode_any(&header, data)
}

/// Write a MetaImage file; `.mhd` writes pixel data to a sibling file
pub fn write(path: &Path, image: &AnyImage, compress: bool) -> Result<()> {
    let raw = with_any_image!(image, img => encode(img));
    let data = if compress {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw)?;
        encoder.finish()?
    } else {
        raw
    };

    let detached = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("mhd"));

    let data_file = if detached {
        let stem = path
            .file_stem()
            .ok_or_else(|| DissolveError::UnsupportedFormat(path.display().to_string()))?
            .to_string_lossy();
        format!("{}.{}", stem, if compress { "zraw" } else { "raw" })
    } else {
        "LOCAL".to_string()
    };

    let header = MetaHeader {
        dim_size: image.size().to_vec(),
        spacing: image.spacing().to_vec(),
        offset: image.origin().to_vec(),
        element_type: image.element_type(),
        compressed: compress,
        compressed_size: compress.then_some(data.len()),
        msb: false,
        header_size: 0,
        data_file,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if detached {
        fs::write(path, header.to_text())?;
        fs::write(path.with_file_name(&header.data_file), &data)?;
    } else {
        let mut file = fs::File::create(path)?;
        file.write_all(header.to_text().as_bytes())?;
        file.write_all(&data)?;
    }

    tracing::debug!(path = %path.display(), bytes = data.len(), "wrote MetaImage");
    Ok(())
}

fn data_file_path(header_path: &Path, name: &str) -> Result<PathBuf> {
    if name.eq_ignore_ascii_case("LIST") || name.contains('%') {
        return Err(DissolveError::UnsupportedFormat(format!(
            "multi-file ElementDataFile '{}'",
            name
        )));
    }
    let base = header_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(base.join(name))
}

fn skip_header_bytes(data: Vec<u8>, header: &MetaHeader) -> Result<Vec<u8>> {
    match header.header_size {
        0 => Ok(data),
        -1 if !header.compressed => {
            let len = header.data_len()?;
            if data.len() < len {
                return Err(DissolveError::TruncatedData {
                    expected: len,
                    found: data.len(),
                });
            }
            Ok(data[data.len() - len..].to_vec())
        }
        n if n > 0 => Ok(data.get(n as usize..).unwrap_or_default().to_vec()),
        n => Err(DissolveError::header(format!("unsupported HeaderSize {}", n))),
    }
}

fn decode_any(header: &MetaHeader, data: Vec<u8>) -> Result<AnyImage> {
    Ok(match header.element_type {
        ElementType::UChar => decode::<u8>(header, data)?.into(),
        ElementType::Char => decode::<i8>(header, data)?.into(),
        ElementType::UShort => decode::<u16>(header, data)?.into(),
        ElementType::Short => decode::<i16>(header, data)?.into(),
        ElementType::UInt => decode::<u32>(header, data)?.into(),
        ElementType::Int => decode::<i32>(header, data)?.into(),
        ElementType::ULongLong => decode::<u64>(header, data)?.into(),
        ElementType::LongLong => decode::<i64>(header, data)?.into(),
    })
}

fn decode<T: LabelPixel>(header: &MetaHeader, mut data: Vec<u8>) -> Result<Image<T>> {
    let expected = header.data_len()?;
    if data.len() < expected {
        return Err(DissolveError::TruncatedData {
            expected,
            found: data.len(),
        });
    }
    data.truncate(expected);

    let width = T::ELEMENT_TYPE.size();
    if header.msb && width > 1 {
        data.chunks_exact_mut(width).for_each(|c| c.reverse());
    }

    let pixels = data.chunks_exact(width).map(T::from_le_slice).collect();
    Image::from_vec(header.dim_size.clone(), pixels)?
        .with_spacing(header.spacing.clone())?
        .with_origin(header.offset.clone())
}

fn encode<T: LabelPixel>(image: &Image<T>) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.len() * T::ELEMENT_TYPE.size());
    for &pixel in image.data() {
        pixel.extend_le(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Image<u16> {
        Image::from_vec(vec![3, 2, 2], (0..12).map(|v| v * 300).collect())
            .unwrap()
            .with_spacing(vec![0.5, 1.0, 2.5])
            .unwrap()
            .with_origin(vec![-1.0, 0.0, 10.25])
            .unwrap()
    }

    #[test]
    fn test_write_read_mha() {
        let dir = TempDir::new().unwrap();
        let image: AnyImage = sample().into();

        for compress in [false, true] {
            let path = dir.path().join(format!("labels_{}.mha", compress));
            write(&path, &image, compress).unwrap();
            assert_eq!(read(&path).unwrap(), image);
        }
    }

    #[test]
    fn test_write_read_mhd() {
        let dir = TempDir::new().unwrap();
        let image: AnyImage = sample().into();

        let path = dir.path().join("labels.mhd");
        write(&path, &image, true).unwrap();
        assert!(dir.path().join("labels.zraw").exists());
        assert_eq!(read(&path).unwrap(), image);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("ElementDataFile = labels.zraw"));
        assert!(text.contains("ElementType = MET_USHORT"));
        assert!(text.contains("TransformMatrix = 1 0 0 0 1 0 0 0 1"));
    }

    #[test]
    fn test_parse_foreign_header() {
        let mut bytes = b"ObjectType = Image\r\n\
            NDims = 2\r\n\
            BinaryData = True\r\n\
            ElementByteOrderMSB = True\r\n\
            AnatomicalOrientation = RAI\r\n\
            ElementSize = 2 3\r\n\
            DimSize = 2 1\r\n\
            ElementType = MET_SHORT\r\n\
            ElementDataFile = LOCAL\r\n"
            .to_vec();
        bytes.extend_from_slice(&[0x00, 0x05, 0xff, 0xfe]);

        let (header, consumed) = MetaHeader::parse(&bytes).unwrap();
        assert_eq!(header.spacing, vec![2.0, 3.0]);
        assert!(header.msb);

        match decode_any(&header, bytes[consumed..].to_vec()).unwrap() {
            AnyImage::I16(image) => assert_eq!(image.data(), &[5, -2]),
            other => panic!("unexpected pixel type {:?}", other.element_type()),
        }
    }

    #[test]
    fn test_header_errors() {
        assert!(MetaHeader::parse(b"NDims = 2\nDimSize = 2 2\n").is_err());
        assert!(MetaHeader::parse(b"NDims = 3\nDimSize = 2 2\nElementType = MET_UCHAR\nElementDataFile = LOCAL\n").is_err());
        assert!(matches!(
            MetaHeader::parse(b"DimSize = 2\nElementType = MET_FLOAT\nElementDataFile = LOCAL\n"),
            Err(DissolveError::UnsupportedPixelType(_))
        ));
        assert!(MetaHeader::parse(b"ObjectType = Mesh\n").is_err());
    }

    #[test]
    fn test_truncated_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.mha");
        fs::write(
            &path,
            b"NDims = 2\nDimSize = 4 4\nElementType = MET_UCHAR\nElementDataFile = LOCAL\nabc",
        )
        .unwrap();

        assert!(matches!(
            read(&path),
            Err(DissolveError::TruncatedData { expected: 16, found: 3 })
        ));
    }

    #[test]
    fn test_oversized_dim_size() {
        let header = b"NDims = 2\nDimSize = 18446744073709551615 2\nElementType = MET_UCHAR\nElementDataFile = LOCAL\n";
        assert!(matches!(
            MetaHeader::parse(header),
            Err(DissolveError::InvalidHeader(_))
        ));

        let wide = b"NDims = 1\nDimSize = 4611686018427387904\nElementType = MET_INT\nElementDataFile = LOCAL\n";
        assert!(matches!(
            MetaHeader::parse(wide),
            Err(DissolveError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_compressed_data_shorter_than_dim_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.mha");

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[7u8; 8]).unwrap();
        let payload = encoder.finish().unwrap();

        let mut bytes = b"NDims = 3\n\
            DimSize = 100000 100000 100000\n\
            CompressedData = True\n\
            ElementType = MET_UCHAR\n\
            ElementDataFile = LOCAL\n"
            .to_vec();
        bytes.extend_from_slice(&payload);
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            read(&path),
            Err(DissolveError::TruncatedData {
                expected: 1_000_000_000_000_000,
                found: 8
            })
        ));
    }

    #[test]
    fn test_compressed_data_longer_than_dim_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("long.mha");

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[3u8; 4096]).unwrap();
        let payload = encoder.finish().unwrap();

        let mut bytes =
            b"NDims = 2\nDimSize = 2 2\nCompressedData = True\nElementType = MET_UCHAR\nElementDataFile = LOCAL\n"
                .to_vec();
        bytes.extend_from_slice(&payload);
        fs::write(&path, bytes).unwrap();

        match read(&path).unwrap() {
            AnyImage::U8(image) => assert_eq!(image.data(), &[3, 3, 3, 3]),
            other => panic!("unexpected pixel type {:?}", other.element_type()),
        }
    }

    #[test]
    fn test_missing_data_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orphan.mhd");
        fs::write(
            &path,
            "NDims = 1\nDimSize = 4\nElementType = MET_UCHAR\nElementDataFile = orphan.raw\n",
        )
        .unwrap();

        assert!(matches!(read(&path), Err(DissolveError::FileNotFound { .. })));
    }
}
