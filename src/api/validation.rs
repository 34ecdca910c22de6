use super::ApiError;
use crate::services::validation::CART_KEY_MAX;

pub fn validate_account_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid account ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

/// Checks the `{product_id}/{category}` pair addressing a cart line.
pub fn validate_cart_key<'a>(
    product_id: &'a str,
    category: &'a str,
) -> Result<(&'a str, &'a str), ApiError> {
    let product_id = product_id.trim();
    let category = category.trim();

    if product_id.is_empty() || category.is_empty() {
        return Err(ApiError::validation(
            "Product ID and category cannot be empty",
        ));
    }

    if product_id.chars().count() > CART_KEY_MAX || category.chars().count() > CART_KEY_MAX {
        return Err(ApiError::validation(format!(
            "Product ID and category must be {CART_KEY_MAX} characters or less"
        )));
    }

    Ok((product_id, category))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_account_id() {
        assert!(validate_account_id(1).is_ok());
        assert!(validate_account_id(12345).is_ok());
        assert!(validate_account_id(0).is_err());
        assert!(validate_account_id(-1).is_err());
    }

    #[test]
    fn test_validate_cart_key() {
        assert_eq!(validate_cart_key(" p-1 ", "shoes").unwrap(), ("p-1", "shoes"));
        assert!(validate_cart_key("", "shoes").is_err());
        assert!(validate_cart_key("p-1", "  ").is_err());
        assert!(validate_cart_key(&"x".repeat(CART_KEY_MAX), "shoes").is_ok());
        assert!(validate_cart_key(&"x".repeat(CART_KEY_MAX + 1), "shoes").is_err());
    }
}
