//! Add-product form validation.

use super::view::ProductForm;
use crate::upload::PendingUpload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("product name is empty")]
    EmptyName,
    #[error("price is not a number")]
    InvalidPrice,
    #[error("no image selected")]
    MissingImage,
}

/// A form that passed validation, still borrowing the selected image.
#[derive(Debug)]
pub struct ValidProduct<'a> {
    pub name: String,
    pub price: f64,
    pub category: Option<String>,
    pub image: &'a PendingUpload,
}

/// Check the form before anything touches the network.
///
/// # Errors
///
/// Returns the first failing check, in name, price, image order.
pub fn validate<'a>(form: &ProductForm, image: Option<&'a PendingUpload>) -> Result<ValidProduct<'a>, ValidationError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let price = parse_price(&form.price).ok_or(ValidationError::InvalidPrice)?;
    let image = image.ok_or(ValidationError::MissingImage)?;

    let category = form.category.trim();
    Ok(ValidProduct {
        name: name.to_owned(),
        price,
        category: (!category.is_empty()).then(|| category.to_owned()),
        image,
    })
}

/// Parse a typed price. A decimal comma is accepted (`12,50`); negative,
/// infinite, and NaN values are rejected.
#[must_use]
pub fn parse_price(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replacen(',', ".", 1);
    match normalized.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Some(price),
        _ => None,
    }
}

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;
