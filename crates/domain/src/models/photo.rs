//! Donation photo upload.

use chrono::{DateTime, Utc};
use shared::validation::{photo_extension, validate_photo};
use uuid::Uuid;

use crate::errors::FieldErrors;

/// An image attached to a donation form.
#[derive(Clone)]
pub struct PhotoUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PhotoUpload {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Records a `photo` error if the type or size is not accepted.
    pub fn check(&self, errors: &mut FieldErrors) {
        if let Err(e) = validate_photo(&self.content_type, self.bytes.len()) {
            errors.add_validation("photo", &e);
        }
    }

    /// Storage key `{user_id}/{created_millis}.{ext}`.
    pub fn storage_key(&self, user_id: Uuid, at: DateTime<Utc>) -> String {
        let ext = photo_extension(&self.content_type).unwrap_or("bin");
        format!("{}/{}.{}", user_id, at.timestamp_millis(), ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::validation::MAX_PHOTO_BYTES;

    #[test]
    fn test_oversized_photo_reports_size() {
        let photo = PhotoUpload::new("image/jpeg", vec![0; 6 * 1024 * 1024]);
        let mut errors = FieldErrors::new();
        photo.check(&mut errors);
        assert_eq!(errors.get("photo"), Some("Image must be less than 5MB"));
    }

    #[test]
    fn test_wrong_type_reports_type() {
        let photo = PhotoUpload::new("application/pdf", vec![0; 10]);
        let mut errors = FieldErrors::new();
        photo.check(&mut errors);
        assert_eq!(
            errors.get("photo"),
            Some("Only JPEG, PNG, GIF, and WebP images are allowed")
        );
    }

    #[test]
    fn test_limit_is_inclusive() {
        let photo = PhotoUpload::new("image/webp", vec![0; MAX_PHOTO_BYTES]);
        let mut errors = FieldErrors::new();
        photo.check(&mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_storage_key() {
        let user = Uuid::nil();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let photo = PhotoUpload::new("image/png", vec![1, 2, 3]);
        assert_eq!(
            photo.storage_key(user, at),
            "00000000-0000-0000-0000-000000000000/1700000000123.png"
        );
    }

    #[test]
    fn test_debug_omits_bytes() {
        let photo = PhotoUpload::new("image/gif", vec![7; 4]);
        assert_eq!(
            format!("{:?}", photo),
            "PhotoUpload { content_type: \"image/gif\", len: 4 }"
        );
    }
}
