//! Recipe model, write payloads, and list filters.

use std::fmt;
use std::path::Path;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::attribute::AttributeId;

/// Database identifier for recipes.
pub type RecipeId = i64;

/// Storage namespace for recipe images.
pub const RECIPE_IMAGE_NAMESPACE: &str = "uploads/recipe";

/// Number of fractional digits kept on prices.
pub const PRICE_SCALE: u32 = 2;

/// Validation errors raised by [`RecipeDraft::new`] and patch validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeValidationError {
    EmptyTitle,
    NegativeTime,
    NegativePrice,
}

impl fmt::Display for RecipeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::NegativeTime => write!(f, "time_minutes must not be negative"),
            Self::NegativePrice => write!(f, "price must not be negative"),
        }
    }
}

impl std::error::Error for RecipeValidationError {}

/// Normalize a price to the fixed two-digit scale.
fn normalize_price(price: Decimal) -> Result<Decimal, RecipeValidationError> {
    if price.is_sign_negative() {
        return Err(RecipeValidationError::NegativePrice);
    }
    let mut rounded = price.round_dp(PRICE_SCALE);
    rounded.rescale(PRICE_SCALE);
    Ok(rounded)
}

/// A stored recipe with its association id sets.
///
/// Attribute ids are kept sorted so equality checks and JSON output are
/// deterministic regardless of association row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image_path: Option<String>,
    pub tag_ids: Vec<AttributeId>,
    pub ingredient_ids: Vec<AttributeId>,
}

/// Validated payload for creating a recipe or fully replacing one.
///
/// Replace semantics: every field of the stored recipe takes the draft's
/// value, so an absent `link` or empty `tag_ids` clears the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tag_ids: Vec<AttributeId>,
    pub ingredient_ids: Vec<AttributeId>,
}

impl RecipeDraft {
    /// Validate scalar fields and normalize the price scale.
    pub fn new(
        title: impl Into<String>,
        time_minutes: i32,
        price: Decimal,
        link: Option<String>,
        tag_ids: Vec<AttributeId>,
        ingredient_ids: Vec<AttributeId>,
    ) -> Result<Self, RecipeValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(RecipeValidationError::EmptyTitle);
        }
        if time_minutes < 0 {
            return Err(RecipeValidationError::NegativeTime);
        }
        Ok(Self {
            title,
            time_minutes,
            price: normalize_price(price)?,
            link,
            tag_ids,
            ingredient_ids,
        })
    }
}

/// Partial update: only `Some` fields are written; `None` leaves the stored
/// value untouched. Supplying an id set replaces that whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<AttributeId>>,
    pub ingredient_ids: Option<Vec<AttributeId>>,
}

impl RecipePatch {
    /// Validate the supplied fields, normalizing the price when present.
    pub fn validated(mut self) -> Result<Self, RecipeValidationError> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err(RecipeValidationError::EmptyTitle);
        }
        if let Some(time) = self.time_minutes
            && time < 0
        {
            return Err(RecipeValidationError::NegativeTime);
        }
        if let Some(price) = self.price {
            self.price = Some(normalize_price(price)?);
        }
        Ok(self)
    }

    /// True when no scalar column would change (association sets may still).
    #[must_use]
    pub fn has_scalar_changes(&self) -> bool {
        self.title.is_some()
            || self.time_minutes.is_some()
            || self.price.is_some()
            || self.link.is_some()
    }
}

/// Optional id-set filters applied to recipe listings.
///
/// Membership is OR within a set and AND across the two sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<AttributeId>>,
    pub ingredient_ids: Option<Vec<AttributeId>>,
}

impl RecipeFilter {
    /// Filter matching every recipe of the owner.
    #[must_use]
    pub fn unfiltered() -> Self {
        Self::default()
    }
}

/// Derive a collision-free storage path for an uploaded recipe image.
///
/// The original filename contributes only its extension (lowercased); the
/// base name is a fresh UUID, so repeated uploads of the same filename land
/// on distinct paths and user-supplied names never reach the filesystem.
#[must_use]
pub fn recipe_image_path(original_filename: &str) -> String {
    let base = Uuid::new_v4();
    match Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) => format!("{RECIPE_IMAGE_NAMESPACE}/{base}.{}", ext.to_lowercase()),
        None => format!("{RECIPE_IMAGE_NAMESPACE}/{base}"),
    }
}

/// Supported upload formats, sniffed by leading magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Canonical file extension for the format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// Identify an image payload from its magic bytes, if supported.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(Self::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn price(raw: &str) -> Decimal {
        raw.parse().expect("valid decimal literal")
    }

    #[test]
    fn draft_rejects_blank_title() {
        let result = RecipeDraft::new("  ", 5, price("1.00"), None, vec![], vec![]);
        assert_eq!(result, Err(RecipeValidationError::EmptyTitle));
    }

    #[test]
    fn draft_rejects_negative_time_and_price() {
        assert_eq!(
            RecipeDraft::new("Soup", -1, price("1.00"), None, vec![], vec![]),
            Err(RecipeValidationError::NegativeTime)
        );
        assert_eq!(
            RecipeDraft::new("Soup", 1, price("-0.01"), None, vec![], vec![]),
            Err(RecipeValidationError::NegativePrice)
        );
    }

    #[test]
    fn draft_rounds_price_to_two_digits() {
        let draft = RecipeDraft::new("Soup", 5, price("4.005"), None, vec![], vec![])
            .expect("valid draft");
        assert_eq!(draft.price, price("4.00"));
        assert_eq!(draft.price.scale(), PRICE_SCALE);
    }

    #[test]
    fn patch_without_fields_has_no_scalar_changes() {
        let patch = RecipePatch::default().validated().expect("valid patch");
        assert!(!patch.has_scalar_changes());
    }

    #[test]
    fn patch_with_only_tags_has_no_scalar_changes() {
        let patch = RecipePatch {
            tag_ids: Some(vec![1, 2]),
            ..RecipePatch::default()
        };
        assert!(!patch.has_scalar_changes());
    }

    #[rstest]
    #[case("dinner.JPG", Some("jpg"))]
    #[case("dinner.jpeg", Some("jpeg"))]
    #[case("noextension", None)]
    fn image_path_preserves_lowercased_extension(
        #[case] original: &str,
        #[case] extension: Option<&str>,
    ) {
        let path = recipe_image_path(original);
        assert!(path.starts_with("uploads/recipe/"));
        match extension {
            Some(ext) => assert!(path.ends_with(&format!(".{ext}"))),
            None => assert!(!path.contains('.')),
        }
    }

    #[test]
    fn image_paths_are_unique_per_call() {
        assert_ne!(recipe_image_path("a.png"), recipe_image_path("a.png"));
    }

    #[test]
    fn image_path_discards_directory_components() {
        let path = recipe_image_path("../../etc/passwd.png");
        assert!(path.starts_with("uploads/recipe/"));
        assert!(!path.contains(".."));
    }

    #[rstest]
    #[case(&[0xFF, 0xD8, 0xFF, 0xE0], Some(ImageFormat::Jpeg))]
    #[case(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00], Some(ImageFormat::Png))]
    #[case(b"GIF89a......", Some(ImageFormat::Gif))]
    #[case(b"RIFF\x00\x00\x00\x00WEBPVP8 ", Some(ImageFormat::Webp))]
    #[case(b"plain text, not an image", None)]
    #[case(&[], None)]
    fn sniff_recognises_supported_formats(
        #[case] bytes: &[u8],
        #[case] expected: Option<ImageFormat>,
    ) {
        assert_eq!(ImageFormat::sniff(bytes), expected);
    }
}
