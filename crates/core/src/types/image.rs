//! Product image records and shape normalization.
//!
//! Product images have been stored in three shapes over the life of the
//! catalog:
//!
//! 1. a bare URL string,
//! 2. a `{ "full": .., "thumb": .. }` pair,
//! 3. the current Cloudinary-derived record
//!    `{ "publicId", "variants", "formats", "metadata" }`.
//!
//! A broken backfill also left `{ "_id": .. }` stubs behind. [`RawImage`]
//! classifies a stored JSON value into one of these shapes exactly once, and
//! [`ImageNormalizer`] turns every shape into a canonical [`ImageRecord`].
//! Normalization never fails: anything unrecognized becomes the placeholder.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder image used when a product has no usable image.
pub const DEFAULT_PLACEHOLDER_URL: &str =
    "https://res.cloudinary.com/demo/image/upload/v1/samples/placeholder.jpg";

const CLOUDINARY_DELIVERY_BASE: &str = "https://res.cloudinary.com";

/// Target widths for each derived variant, in pixels.
const VARIANT_WIDTHS: VariantWidths = VariantWidths {
    micro: 64,
    thumb: 150,
    small: 320,
    medium: 640,
    large: 1280,
};

struct VariantWidths {
    micro: u32,
    thumb: u32,
    small: u32,
    medium: u32,
    large: u32,
}

/// Progressively larger renditions of the same image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageVariants {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub micro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

impl ImageVariants {
    /// Every slot set to the same URL.
    #[must_use]
    pub fn uniform(url: &str) -> Self {
        Self {
            micro: Some(url.to_owned()),
            thumb: Some(url.to_owned()),
            small: Some(url.to_owned()),
            medium: Some(url.to_owned()),
            large: Some(url.to_owned()),
            original: Some(url.to_owned()),
        }
    }
}

/// The same image encoded with different codecs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFormats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avif: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jpg: Option<String>,
}

/// Intrinsic dimensions of the source image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
}

/// A canonical product image record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Opaque identifier of the stored asset (Cloudinary public ID).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<ImageVariants>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formats: Option<ImageFormats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ImageMetadata>,
}

impl ImageRecord {
    /// A record is usable once it carries variants, formats, or a public ID.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.variants.is_some() || self.formats.is_some() || self.public_id.is_some()
    }

    /// URL to show in compact listings such as cart lines.
    ///
    /// Prefers the thumbnail, then the original, then an empty string.
    #[must_use]
    pub fn display_url(&self) -> &str {
        self.variants
            .as_ref()
            .and_then(|v| v.thumb.as_deref().or(v.original.as_deref()))
            .unwrap_or("")
    }
}

/// A stored image value, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum RawImage {
    /// A bare URL string.
    Legacy(String),
    /// The dual-resolution `{full, thumb}` pair.
    DualRes {
        full: Option<String>,
        thumb: Option<String>,
    },
    /// Already in canonical form (possibly partial).
    Canonical(ImageRecord),
    /// Null, an `{_id}` stub, or anything unrecognized.
    Empty,
}

impl RawImage {
    /// Classify one element of a stored `images` array.
    #[must_use]
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::String(url) if !url.trim().is_empty() => Self::Legacy(url.clone()),
            Value::Object(map) => {
                if map.contains_key("full") || map.contains_key("thumb") {
                    let full = string_field(value, "full");
                    let thumb = string_field(value, "thumb");
                    if full.is_none() && thumb.is_none() {
                        return Self::Empty;
                    }
                    return Self::DualRes { full, thumb };
                }

                let record = ImageRecord {
                    public_id: string_field(value, "publicId"),
                    variants: typed_field(value, "variants"),
                    formats: typed_field(value, "formats"),
                    metadata: typed_field(value, "metadata"),
                };
                if record.is_valid() {
                    Self::Canonical(record)
                } else {
                    Self::Empty
                }
            }
            _ => Self::Empty,
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
}

// A malformed sub-object is dropped on its own so the rest of the record survives.
fn typed_field<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Option<T> {
    value
        .get(key)
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

/// Converts stored image values into canonical [`ImageRecord`]s.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    placeholder_url: String,
    cloudinary_cloud: Option<String>,
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_URL)
    }
}

impl ImageNormalizer {
    /// Create a normalizer with the given placeholder URL and no derived-URL backfill.
    #[must_use]
    pub fn new(placeholder_url: impl Into<String>) -> Self {
        Self {
            placeholder_url: placeholder_url.into(),
            cloudinary_cloud: None,
        }
    }

    /// Enable backfilling missing variants/formats from Cloudinary delivery URLs.
    #[must_use]
    pub fn with_cloudinary(mut self, cloud_name: impl Into<String>) -> Self {
        self.cloudinary_cloud = Some(cloud_name.into());
        self
    }

    /// The placeholder record substituted for empty images.
    #[must_use]
    pub fn placeholder(&self) -> ImageRecord {
        ImageRecord {
            public_id: None,
            variants: Some(ImageVariants::uniform(&self.placeholder_url)),
            formats: None,
            metadata: Some(ImageMetadata {
                aspect_ratio: Some(1.0),
                ..ImageMetadata::default()
            }),
        }
    }

    /// Normalize a product's raw `images` field.
    ///
    /// Returns one record per input element, or a single placeholder when the
    /// field is absent, null, or an empty array. A non-array value is treated
    /// as a one-element array.
    #[must_use]
    pub fn normalize_images(&self, images: Option<&Value>) -> Vec<ImageRecord> {
        let normalized: Vec<ImageRecord> = match images {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| self.normalize(RawImage::classify(item)))
                .collect(),
            Some(single) => vec![self.normalize(RawImage::classify(single))],
        };

        if normalized.is_empty() {
            vec![self.placeholder()]
        } else {
            normalized
        }
    }

    /// Produce the canonical record for one classified image.
    #[must_use]
    pub fn normalize(&self, raw: RawImage) -> ImageRecord {
        match raw {
            RawImage::Legacy(url) => ImageRecord {
                variants: Some(ImageVariants {
                    original: Some(url),
                    ..ImageVariants::default()
                }),
                ..ImageRecord::default()
            },
            RawImage::DualRes { full, thumb } => ImageRecord {
                variants: Some(ImageVariants {
                    original: full,
                    thumb,
                    ..ImageVariants::default()
                }),
                ..ImageRecord::default()
            },
            RawImage::Canonical(mut record) => {
                self.backfill_derived(&mut record);
                let metadata = record.metadata.get_or_insert_with(ImageMetadata::default);
                if metadata.aspect_ratio.is_none() {
                    metadata.aspect_ratio = Some(1.0);
                }
                record
            }
            RawImage::Empty => self.placeholder(),
        }
    }

    fn backfill_derived(&self, record: &mut ImageRecord) {
        let (Some(cloud), Some(public_id)) =
            (self.cloudinary_cloud.as_deref(), record.public_id.as_deref())
        else {
            return;
        };

        let url = |transform: Option<String>| match transform {
            Some(t) => format!("{CLOUDINARY_DELIVERY_BASE}/{cloud}/image/upload/{t}/{public_id}"),
            None => format!("{CLOUDINARY_DELIVERY_BASE}/{cloud}/image/upload/{public_id}"),
        };
        let sized = |width: u32| Some(format!("w_{width},c_limit,q_auto,f_auto"));

        let variants = record.variants.get_or_insert_with(ImageVariants::default);
        fill(&mut variants.micro, || url(sized(VARIANT_WIDTHS.micro)));
        fill(&mut variants.thumb, || url(sized(VARIANT_WIDTHS.thumb)));
        fill(&mut variants.small, || url(sized(VARIANT_WIDTHS.small)));
        fill(&mut variants.medium, || url(sized(VARIANT_WIDTHS.medium)));
        fill(&mut variants.large, || url(sized(VARIANT_WIDTHS.large)));
        fill(&mut variants.original, || url(None));

        let formats = record.formats.get_or_insert_with(ImageFormats::default);
        fill(&mut formats.avif, || url(Some("f_avif,q_auto".to_owned())));
        fill(&mut formats.webp, || url(Some("f_webp,q_auto".to_owned())));
        fill(&mut formats.jpg, || url(Some("f_jpg,q_auto".to_owned())));
    }
}

fn fill(slot: &mut Option<String>, make: impl FnOnce() -> String) {
    if slot.is_none() {
        *slot = Some(make());
    }
}
