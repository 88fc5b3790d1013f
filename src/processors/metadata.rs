// imgpress/src/processors/metadata.rs
use exif::{Exif, In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Parses EXIF from an in-memory container. Missing or unreadable
    /// metadata is not an error for our purposes.
    pub fn read_metadata(&self, data: &[u8]) -> Option<Exif> {
        let mut cursor = Cursor::new(data);
        match Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => {
                log::debug!("Found EXIF data ({} fields)", exif.fields().len());
                Some(exif)
            }
            Err(exif::Error::NotFound(_)) => {
                log::debug!("No EXIF data found");
                None
            }
            Err(e) => {
                log::debug!("Ignoring unreadable EXIF: {}", e);
                None
            }
        }
    }

    pub fn orientation(&self, exif: &Exif) -> Option<u32> {
        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .filter(|value| (1..=8).contains(value))
    }

    /// Rotates/flips `image` so that it displays upright for the given
    /// EXIF orientation value.
    pub fn apply_orientation(&self, image: DynamicImage, orientation: u32) -> DynamicImage {
        match orientation {
            2 => image.fliph(),
            3 => image.rotate180(),
            4 => image.flipv(),
            5 => image.rotate90().fliph(),
            6 => image.rotate90(),
            7 => image.rotate270().fliph(),
            8 => image.rotate270(),
            _ => image,
        }
    }

    /// Reads the orientation tag from `data` and applies it to `image`.
    pub fn orient(&self, image: DynamicImage, data: &[u8]) -> DynamicImage {
        match self.read_metadata(data).and_then(|exif| self.orientation(&exif)) {
            Some(orientation) if orientation != 1 => {
                log::debug!("Applying EXIF orientation {}", orientation);
                self.apply_orientation(image, orientation)
            }
            _ => image,
        }
    }

    pub fn has_gps(&self, exif: &Exif) -> bool {
        exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_some()
            || exif.get_field(Tag::GPSLongitude, In::PRIMARY).is_some()
    }

    pub fn extract_common_metadata(&self, exif: &Exif) -> Vec<(String, String)> {
        let mut metadata = Vec::new();

        for field in exif.fields() {
            if field.ifd_num != In::PRIMARY {
                continue;
            }

            match field.tag {
                Tag::Make
                | Tag::Model
                | Tag::DateTimeOriginal
                | Tag::Orientation
                | Tag::Software
                | Tag::Artist
                | Tag::Copyright => {
                    let value = field.display_value().with_unit(exif).to_string();
                    metadata.push((field.tag.to_string(), value));
                }
                _ => {}
            }
        }

        metadata
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}
