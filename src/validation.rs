use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::product::{CreateProductRequest, UpdateProductRequest};

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9\-._~:/?#\[\]@!$&'()*+,;=%]{1,2048}$").unwrap()
});

pub fn email(s: &str) -> bool {
    RE_EMAIL.is_match(s)
}

pub fn url(s: &str) -> bool {
    RE_URL.is_match(s) && s.len() <= 2048
}

// Authentication validation
pub fn password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".into());
    }
    if password.len() > 128 {
        return Err("Password must be less than 128 characters".into());
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_letter {
        return Err("Password must contain at least one letter".into());
    }
    if !has_digit {
        return Err("Password must contain at least one number".into());
    }

    // Check for common patterns
    let lower = password.to_lowercase();
    if lower.contains("password") || lower.contains("123456") || lower.contains("qwerty") {
        return Err("Password contains common patterns".into());
    }

    Ok(())
}

pub fn validate_email_strict(email_str: &str) -> Result<(), String> {
    if !email(email_str) {
        return Err("Invalid email format".into());
    }
    if email_str.len() > 254 {
        return Err("Email too long".into());
    }
    let parts: Vec<&str> = email_str.split('@').collect();
    if parts.len() != 2 {
        return Err("Invalid email format".into());
    }
    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || local.len() > 64 {
        return Err("Invalid email local part".into());
    }
    if domain.is_empty() || !domain.contains('.') {
        return Err("Invalid email domain".into());
    }
    Ok(())
}

// Product validation. Messages mirror the declarative schema the dashboard
// was written against, so its inline error display keeps working.
pub fn validate_new_product(req: &CreateProductRequest) -> Result<(), String> {
    if req.name.trim().is_empty() {
        return Err("Please add a product name".into());
    }
    if req.category.trim().is_empty() {
        return Err("Please add a product category".into());
    }
    if !req.price.is_finite() || req.price < 0.0 {
        return Err("Price cannot be negative".into());
    }
    if let Some(link) = &req.affiliate_link {
        if !link.trim().is_empty() && !url(link.trim()) {
            return Err("Affiliate link must be a valid URL".into());
        }
    }
    Ok(())
}

pub fn validate_product_update(req: &UpdateProductRequest) -> Result<(), String> {
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err("Please add a product name".into());
        }
    }
    if let Some(category) = &req.category {
        if category.trim().is_empty() {
            return Err("Please add a product category".into());
        }
    }
    if let Some(price) = req.price {
        if !price.is_finite() || price < 0.0 {
            return Err("Price cannot be negative".into());
        }
    }
    if let Some(link) = &req.affiliate_link {
        if !link.trim().is_empty() && !url(link.trim()) {
            return Err("Affiliate link must be a valid URL".into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_req(v: serde_json::Value) -> CreateProductRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn email_validation() {
        assert!(validate_email_strict("user@example.com").is_ok());
        assert!(validate_email_strict("not-an-email").is_err());
        assert!(validate_email_strict("a@b").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(password_strength("s3curePhrase").is_ok());
        assert!(password_strength("short1").is_err());
        assert!(password_strength("lettersonly").is_err());
        assert!(password_strength("password123").is_err());
    }

    #[test]
    fn product_requires_name_and_category() {
        let req = create_req(serde_json::json!({
            "name": "", "price": 1.0, "category": "Brakes"
        }));
        assert_eq!(
            validate_new_product(&req).unwrap_err(),
            "Please add a product name"
        );

        let req = create_req(serde_json::json!({
            "name": "Pad", "price": 1.0, "category": " "
        }));
        assert_eq!(
            validate_new_product(&req).unwrap_err(),
            "Please add a product category"
        );
    }

    #[test]
    fn product_rejects_negative_price() {
        let req = create_req(serde_json::json!({
            "name": "Pad", "price": -0.5, "category": "Brakes"
        }));
        assert_eq!(
            validate_new_product(&req).unwrap_err(),
            "Price cannot be negative"
        );
    }

    #[test]
    fn update_checks_only_submitted_fields() {
        let update: UpdateProductRequest =
            serde_json::from_value(serde_json::json!({ "stock": 5 })).unwrap();
        assert!(validate_product_update(&update).is_ok());

        let update: UpdateProductRequest =
            serde_json::from_value(serde_json::json!({ "price": -1.0 })).unwrap();
        assert!(validate_product_update(&update).is_err());
    }

    #[test]
    fn affiliate_link_must_be_http() {
        let req = create_req(serde_json::json!({
            "name": "Pad", "price": 2.0, "category": "Brakes",
            "affiliateLink": "ftp://nope"
        }));
        assert!(validate_new_product(&req).is_err());

        let req = create_req(serde_json::json!({
            "name": "Pad", "price": 2.0, "category": "Brakes",
            "affiliateLink": "https://parts.example.com/pad"
        }));
        assert!(validate_new_product(&req).is_ok());
    }
}
