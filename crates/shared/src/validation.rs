//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum accepted photo size in bytes (5 MiB).
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted for donation photos.
pub const ALLOWED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

lazy_static! {
    static ref PHONE_REGEX: Regex = Regex::new(r"^[0-9\s+()\-]+$").unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(error("latitude_range", "Latitude must be between -90 and 90"))
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Validates an already-sanitized phone number.
///
/// Only digits, whitespace and `+()-` are allowed.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(error(
            "phone_format",
            "Phone can only contain digits, spaces, and +()-",
        ))
    }
}

/// Validates a photo upload by declared MIME type and size.
///
/// Runs before any bytes are handed to storage.
pub fn validate_photo(content_type: &str, size_bytes: usize) -> Result<(), ValidationError> {
    if !ALLOWED_PHOTO_TYPES.contains(&content_type) {
        return Err(error(
            "photo_type",
            "Only JPEG, PNG, GIF, and WebP images are allowed",
        ));
    }

    if size_bytes > MAX_PHOTO_BYTES {
        return Err(error("photo_size", "Image must be less than 5MB"));
    }

    Ok(())
}

/// File extension used when storing a photo of the given MIME type.
pub fn photo_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(18.5204).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(73.8567).is_ok());
        assert!(validate_longitude(180.1).is_err());
    }

    #[test]
    fn test_validate_longitude_error_message() {
        let err = validate_longitude(200.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Longitude must be between -180 and 180"
        );
    }

    #[test]
    fn test_validate_phone_accepts_international_format() {
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("(020) 2612 3456").is_ok());
        assert!(validate_phone("9876543210").is_ok());
    }

    #[test]
    fn test_validate_phone_rejects_letters() {
        let err = validate_phone("abc123").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Phone can only contain digits, spaces, and +()-"
        );
        assert!(validate_phone("98765x").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_photo_allowed_types() {
        for content_type in ALLOWED_PHOTO_TYPES {
            assert!(validate_photo(content_type, 1024).is_ok());
        }
    }

    #[test]
    fn test_validate_photo_rejects_other_types() {
        let err = validate_photo("image/svg+xml", 1024).unwrap_err();
        assert_eq!(err.code, "photo_type");
        assert!(validate_photo("application/pdf", 10).is_err());
    }

    #[test]
    fn test_validate_photo_size_boundary() {
        assert!(validate_photo("image/jpeg", MAX_PHOTO_BYTES).is_ok());

        let err = validate_photo("image/jpeg", MAX_PHOTO_BYTES + 1).unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Image must be less than 5MB");
    }

    #[test]
    fn test_validate_photo_six_mib_jpeg_rejected() {
        let err = validate_photo("image/jpeg", 6 * 1024 * 1024).unwrap_err();
        assert_eq!(err.code, "photo_size");
    }

    #[test]
    fn test_photo_extension() {
        assert_eq!(photo_extension("image/jpeg"), Some("jpg"));
        assert_eq!(photo_extension("image/webp"), Some("webp"));
        assert_eq!(photo_extension("text/html"), None);
    }
}
