//! EXIF extraction for images

use super::{ExtractedMeta, Extraction, Extractor};
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use exif::{Exif, In, Reader, Tag};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// EXIF date tags in priority order, each paired with its offset tag
const DATE_TAGS: &[(Tag, Tag)] = &[
    (Tag::DateTimeOriginal, Tag::OffsetTimeOriginal),
    (Tag::DateTimeDigitized, Tag::OffsetTimeDigitized),
    (Tag::DateTime, Tag::OffsetTime),
];

/// Extractor for JPEG-class images
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

impl Extractor for ExifExtractor {
    fn extract(&self, path: &Path) -> Extraction {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => return Extraction::Failure(e.into()),
        };
        let mut reader = BufReader::new(file);

        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Some(exif),
            Err(e) => {
                trace!(?path, error = %e, "No EXIF data");
                None
            }
        };

        let (mut width, mut height) = exif.as_ref().and_then(exif_dimensions).unwrap_or((0, 0));
        let time = exif.as_ref().and_then(exif_time);

        if (width == 0 || height == 0)
            && let Some((w, h)) = header_dimensions(path)
        {
            trace!(?path, w, h, "Dimensions from image header");
            width = w;
            height = h;
        }

        match time {
            Some(time) => Extraction::Success(ExtractedMeta { width, height, time }),
            None => {
                trace!(?path, "No EXIF date, skipping");
                Extraction::Skip { width, height }
            }
        }
    }
}

/// Pixel dimensions from EXIF, only when both tags are present
fn exif_dimensions(exif: &Exif) -> Option<(u32, u32)> {
    let width = exif.get_field(Tag::PixelXDimension, In::PRIMARY)?.value.get_uint(0)?;
    let height = exif.get_field(Tag::PixelYDimension, In::PRIMARY)?.value.get_uint(0)?;
    Some((width, height))
}

/// Capture time from the first date tag that parses
fn exif_time(exif: &Exif) -> Option<DateTime<FixedOffset>> {
    for (date_tag, offset_tag) in DATE_TAGS {
        let Some(field) = exif.get_field(*date_tag, In::PRIMARY) else {
            continue;
        };
        let Some(naive) = parse_exif_datetime(&field.display_value().to_string()) else {
            continue;
        };

        let offset = exif
            .get_field(*offset_tag, In::PRIMARY)
            .and_then(|f| parse_exif_offset(&f.display_value().to_string()));

        let time = match offset {
            Some(offset) => offset.from_local_datetime(&naive).single(),
            None => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        };
        if time.is_some() {
            trace!(tag = ?date_tag, "Found EXIF date");
            return time;
        }
    }
    None
}

/// Dimensions from the image header, without decoding pixel data
fn header_dimensions(path: &Path) -> Option<(u32, u32)> {
    image::ImageReader::open(path)
        .ok()?
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    // display_value wraps ASCII values in quotes
    let s = s.trim().trim_matches('"');

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    let formats = ["%Y:%m:%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    None
}

/// Parse EXIF offset string format: "+HH:MM"
fn parse_exif_offset(s: &str) -> Option<FixedOffset> {
    s.trim().trim_matches('"').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use exif::experimental::Writer;
    use exif::{Field, Value};
    use std::io::Cursor;
    use tempfile::tempdir;

    /// Build a TIFF-encoded EXIF block
    fn exif_block(fields: &[Field]) -> Vec<u8> {
        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, false).unwrap();
        buf.into_inner()
    }

    /// Insert an APP1 EXIF segment right after the JPEG SOI marker
    fn with_exif(jpeg: &[u8], fields: &[Field]) -> Vec<u8> {
        let tiff = exif_block(fields);
        let len = (2 + 6 + tiff.len()) as u16;

        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    /// A bare JPEG with no frame header, so the header fallback finds nothing
    const EMPTY_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

    fn date_field(tag: Tag, value: &str) -> Field {
        Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![value.as_bytes().to_vec()]),
        }
    }

    fn encoded_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2024:01:15 14:30:00").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 14);

        let dt = parse_exif_datetime("\"2024:01:15 14:30:00\"").unwrap();
        assert_eq!(dt.year(), 2024);

        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_none());
        assert!(parse_exif_datetime("invalid").is_none());
    }

    #[test]
    fn test_parse_exif_offset() {
        let offset = parse_exif_offset("\"+09:00\"").unwrap();
        assert_eq!(offset.local_minus_utc(), 9 * 3600);
        assert!(parse_exif_offset("nonsense").is_none());
    }

    #[test]
    fn test_exif_time_uses_local_timezone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = with_exif(
            EMPTY_JPEG,
            &[date_field(Tag::DateTimeOriginal, "2016:07:18 14:05:00")],
        );
        std::fs::write(&path, bytes).unwrap();

        let Extraction::Success(meta) = ExifExtractor.extract(&path) else {
            panic!("expected success");
        };
        assert_eq!(meta.time.naive_local().to_string(), "2016-07-18 14:05:00");
        assert_eq!(meta.width, 0);
        assert_eq!(meta.height, 0);
    }

    #[test]
    fn test_exif_time_with_offset_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = with_exif(
            EMPTY_JPEG,
            &[
                date_field(Tag::DateTimeOriginal, "2016:07:18 14:05:00"),
                date_field(Tag::OffsetTimeOriginal, "+09:00"),
            ],
        );
        std::fs::write(&path, bytes).unwrap();

        let Extraction::Success(meta) = ExifExtractor.extract(&path) else {
            panic!("expected success");
        };
        assert_eq!(meta.time.to_rfc3339(), "2016-07-18T14:05:00+09:00");
    }

    #[test]
    fn test_falls_back_to_datetime_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = with_exif(
            EMPTY_JPEG,
            &[date_field(Tag::DateTime, "2019:03:02 08:00:00")],
        );
        std::fs::write(&path, bytes).unwrap();

        let Extraction::Success(meta) = ExifExtractor.extract(&path) else {
            panic!("expected success");
        };
        assert_eq!(meta.time.naive_local().to_string(), "2019-03-02 08:00:00");
    }

    #[test]
    fn test_exif_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = with_exif(
            EMPTY_JPEG,
            &[
                date_field(Tag::DateTimeOriginal, "2016:07:18 14:05:00"),
                Field {
                    tag: Tag::PixelXDimension,
                    ifd_num: In::PRIMARY,
                    value: Value::Long(vec![4032]),
                },
                Field {
                    tag: Tag::PixelYDimension,
                    ifd_num: In::PRIMARY,
                    value: Value::Long(vec![3024]),
                },
            ],
        );
        std::fs::write(&path, bytes).unwrap();

        let Extraction::Success(meta) = ExifExtractor.extract(&path) else {
            panic!("expected success");
        };
        assert_eq!((meta.width, meta.height), (4032, 3024));
    }

    #[test]
    fn test_dimensions_from_header_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = with_exif(
            &encoded_jpeg(8, 6),
            &[date_field(Tag::DateTimeOriginal, "2016:07:18 14:05:00")],
        );
        std::fs::write(&path, bytes).unwrap();

        let Extraction::Success(meta) = ExifExtractor.extract(&path) else {
            panic!("expected success");
        };
        assert_eq!((meta.width, meta.height), (8, 6));
    }

    #[test]
    fn test_no_exif_is_skip_with_header_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        std::fs::write(&path, encoded_jpeg(8, 6)).unwrap();

        assert!(matches!(
            ExifExtractor.extract(&path),
            Extraction::Skip { width: 8, height: 6 }
        ));
    }

    #[test]
    fn test_no_date_keeps_exif_dimensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = with_exif(
            EMPTY_JPEG,
            &[
                Field {
                    tag: Tag::PixelXDimension,
                    ifd_num: In::PRIMARY,
                    value: Value::Long(vec![640]),
                },
                Field {
                    tag: Tag::PixelYDimension,
                    ifd_num: In::PRIMARY,
                    value: Value::Long(vec![480]),
                },
            ],
        );
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            ExifExtractor.extract(&path),
            Extraction::Skip { width: 640, height: 480 }
        ));
    }

    #[test]
    fn test_garbage_is_skip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(matches!(
            ExifExtractor.extract(&path),
            Extraction::Skip { width: 0, height: 0 }
        ));
    }

    #[test]
    fn test_zero_date_is_skip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        let bytes = with_exif(
            EMPTY_JPEG,
            &[date_field(Tag::DateTimeOriginal, "0000:00:00 00:00:00")],
        );
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            ExifExtractor.extract(&path),
            Extraction::Skip { width: 0, height: 0 }
        ));
    }

    #[test]
    fn test_unopenable_is_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.jpg");

        assert!(matches!(
            ExifExtractor.extract(&path),
            Extraction::Failure(crate::error::Error::Io(_))
        ));
    }
}
