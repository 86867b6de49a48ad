//! Input validation functions
//!
//! This module provides validation utilities for user input.
//! Uses both custom validators and the `validator` crate for derive macros.

/// Image MIME types accepted by the vision providers
pub const SUPPORTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/heic"];

/// Validate weight value (in kg)
pub fn validate_weight(weight_kg: f64) -> Result<(), String> {
    if weight_kg.is_nan() || weight_kg.is_infinite() {
        return Err("Weight must be a valid number".to_string());
    }
    if weight_kg < 20.0 {
        return Err("Weight must be at least 20 kg".to_string());
    }
    if weight_kg > 500.0 {
        return Err("Weight must be at most 500 kg".to_string());
    }
    Ok(())
}

/// Validate height value (in cm)
pub fn validate_height(height_cm: f64) -> Result<(), String> {
    if height_cm.is_nan() || height_cm.is_infinite() {
        return Err("Height must be a valid number".to_string());
    }
    if !(50.0..=300.0).contains(&height_cm) {
        return Err("Height must be between 50 and 300 cm".to_string());
    }
    Ok(())
}

/// Validate age (years)
pub fn validate_age(age: u32) -> Result<(), String> {
    if !(13..=120).contains(&age) {
        return Err("Age must be between 13 and 120".to_string());
    }
    Ok(())
}

/// Validate calorie value
pub fn validate_calories(calories: f64) -> Result<(), String> {
    if calories.is_nan() || calories.is_infinite() {
        return Err("Calories must be a valid number".to_string());
    }
    if calories < 0.0 {
        return Err("Calories cannot be negative".to_string());
    }
    if calories > 50000.0 {
        return Err("Calorie value unreasonably high".to_string());
    }
    Ok(())
}

/// Validate a macro amount in grams
pub fn validate_macro_grams(grams: f64) -> Result<(), String> {
    if grams.is_nan() || grams.is_infinite() {
        return Err("Macro amount must be a valid number".to_string());
    }
    if !(0.0..=2000.0).contains(&grams) {
        return Err("Macro amount must be between 0 and 2000 g".to_string());
    }
    Ok(())
}

/// Validate an image MIME type such as `image/jpeg`
pub fn validate_image_mime_type(mime_type: &str) -> Result<(), String> {
    let mime = mime_type.trim().to_lowercase();
    let well_formed = regex_lite::Regex::new(r"^image/[a-z0-9.+-]+$")
        .map(|re| re.is_match(&mime))
        .unwrap_or(false);
    if !well_formed {
        return Err("Invalid image MIME type".to_string());
    }
    if !SUPPORTED_IMAGE_TYPES.contains(&mime.as_str()) {
        return Err(format!("Unsupported image type: {}", mime));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_weight_bounds() {
        assert!(validate_weight(70.0).is_ok());
        assert!(validate_weight(19.9).is_err());
        assert!(validate_weight(500.1).is_err());
        assert!(validate_weight(f64::NAN).is_err());
    }

    #[test]
    fn test_height_bounds() {
        assert!(validate_height(175.0).is_ok());
        assert!(validate_height(30.0).is_err());
        assert!(validate_height(f64::INFINITY).is_err());
    }

    #[test]
    fn test_age_bounds() {
        assert!(validate_age(30).is_ok());
        assert!(validate_age(5).is_err());
        assert!(validate_age(121).is_err());
    }

    #[test]
    fn test_calories() {
        assert!(validate_calories(2000.0).is_ok());
        assert!(validate_calories(-1.0).is_err());
        assert!(validate_calories(60000.0).is_err());
    }

    #[rstest]
    #[case("image/jpeg", true)]
    #[case("IMAGE/PNG", true)]
    #[case("image/webp", true)]
    #[case("image/gif", false)]
    #[case("text/plain", false)]
    #[case("jpeg", false)]
    fn test_image_mime_type(#[case] mime: &str, #[case] ok: bool) {
        assert_eq!(validate_image_mime_type(mime).is_ok(), ok);
    }

    proptest! {
        #[test]
        fn prop_macro_grams_in_range_are_valid(grams in 0.0f64..=2000.0) {
            prop_assert!(validate_macro_grams(grams).is_ok());
        }

        #[test]
        fn prop_negative_macro_grams_are_invalid(grams in -1e6f64..-0.001) {
            prop_assert!(validate_macro_grams(grams).is_err());
        }
    }
}
