//! Request validation — turns a raw JSON body into a normalized product and platform selection.
//!
//! Every violated field is reported, not just the first. Validation is pure and runs
//! before any prompt is built or any external call is made. The API client runs the
//! same checks before sending.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::platform::Platform;
use crate::models::product::{PlatformSelection, Product};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const CATEGORY_MAX_CHARS: usize = 50;
pub const PRICE_MAX: f64 = 999_999.99;
pub const MAX_POSTS_PER_PLATFORM: u64 = 10;

/// One offending field, addressed by its dotted path (`product.name`, `platforms.x.count`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All validation failures for a request. Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("Validation failed: {}", summarize(.details))]
pub struct ValidationErrors {
    pub details: Vec<FieldError>,
}

fn summarize(details: &[FieldError]) -> String {
    details
        .iter()
        .map(|d| format!("{}: {}", d.field, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// A single-field failure.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.details.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.details.iter().any(|d| d.field == field)
    }
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateInput {
    pub product: Product,
    pub platforms: PlatformSelection,
}

/// Validates a `{ product, platforms }` body.
pub fn validate_request(body: &Value) -> Result<GenerateInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let Some(body) = body.as_object() else {
        return Err(ValidationErrors::single(
            "body",
            "Request body must be a JSON object",
        ));
    };

    let product = match body.get("product") {
        Some(Value::Object(fields)) => validate_product(fields, &mut errors),
        Some(Value::Null) | None => {
            errors.push("product", "Product details are required");
            None
        }
        Some(_) => {
            errors.push("product", "Product must be an object");
            None
        }
    };

    let platforms = validate_platforms(body.get("platforms"), &mut errors);

    match (product, platforms) {
        (Some(product), Some(platforms)) if errors.is_empty() => Ok(GenerateInput {
            product,
            platforms,
        }),
        _ => Err(errors),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Product
// ────────────────────────────────────────────────────────────────────────────

fn validate_product(fields: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<Product> {
    let name = required_text(
        fields,
        "name",
        "Product name",
        NAME_MIN_CHARS,
        NAME_MAX_CHARS,
        errors,
    );
    let description = required_text(
        fields,
        "description",
        "Product description",
        DESCRIPTION_MIN_CHARS,
        DESCRIPTION_MAX_CHARS,
        errors,
    );
    let price = validate_price(fields.get("price"), errors);
    let category = validate_category(fields.get("category"), errors);

    Some(Product {
        name: name?,
        description: description?,
        price: price?,
        category: category?,
    })
}

fn required_text(
    fields: &Map<String, Value>,
    key: &str,
    label: &str,
    min: usize,
    max: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let field = format!("product.{key}");
    let raw = match fields.get(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => {
            errors.push(field, format!("{label} is required"));
            return None;
        }
        Some(_) => {
            errors.push(field, format!("{label} must be a string"));
            return None;
        }
    };

    let text = normalize_whitespace(raw);
    let len = text.chars().count();
    if len < min {
        errors.push(field, format!("{label} must be at least {min} characters"));
        None
    } else if len > max {
        errors.push(field, format!("{label} must not exceed {max} characters"));
        None
    } else {
        Some(text)
    }
}

fn validate_price(value: Option<&Value>, errors: &mut ValidationErrors) -> Option<f64> {
    const FIELD: &str = "product.price";

    let price = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::Null) | None => {
            errors.push(FIELD, "Product price is required");
            return None;
        }
        Some(_) => None,
    };

    let Some(price) = price.filter(|p| p.is_finite()) else {
        errors.push(FIELD, "Product price must be a valid number");
        return None;
    };

    if price > PRICE_MAX {
        errors.push(FIELD, "Product price must not exceed $999,999.99");
        return None;
    }

    let price = normalize_price(price);
    if price <= 0.0 {
        errors.push(FIELD, "Product price must be positive");
        return None;
    }
    Some(price)
}

/// Outer `None` means invalid; `Some(None)` means no category was given.
fn validate_category(value: Option<&Value>, errors: &mut ValidationErrors) -> Option<Option<String>> {
    const FIELD: &str = "product.category";

    match value {
        Some(Value::Null) | None => Some(None),
        Some(Value::String(s)) => {
            let category = normalize_whitespace(s);
            if category.chars().count() > CATEGORY_MAX_CHARS {
                errors.push(
                    FIELD,
                    format!("Product category must not exceed {CATEGORY_MAX_CHARS} characters"),
                );
                None
            } else if category.is_empty() {
                Some(None)
            } else {
                Some(Some(category))
            }
        }
        Some(_) => {
            errors.push(FIELD, "Product category must be a string");
            None
        }
    }
}

/// Trims and collapses every internal whitespace run to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates to whole cents. The epsilon absorbs binary representation error so
/// that 19.99 stays 19.99 while 49.999 becomes 49.99.
pub fn normalize_price(price: f64) -> f64 {
    ((price * 100.0) + 1e-6).floor() / 100.0
}

// ────────────────────────────────────────────────────────────────────────────
// Platforms
// ────────────────────────────────────────────────────────────────────────────

fn validate_platforms(
    value: Option<&Value>,
    errors: &mut ValidationErrors,
) -> Option<PlatformSelection> {
    const FIELD: &str = "platforms";

    let entries = match value {
        Some(Value::Object(entries)) => entries,
        Some(Value::Null) | None => {
            errors.push(FIELD, "At least one platform must be selected");
            return None;
        }
        Some(_) => {
            errors.push(FIELD, "Platforms must be an object keyed by platform id");
            return None;
        }
    };

    let mut selection = PlatformSelection::new();
    let mut entry_errors = false;

    for (key, request) in entries {
        let Some(platform) = Platform::from_id(key) else {
            errors.push(
                format!("{FIELD}.{key}"),
                format!("Unsupported platform '{key}'; expected one of x, instagram, linkedin"),
            );
            entry_errors = true;
            continue;
        };

        match post_count(request) {
            Ok(count) => selection.insert(platform, count),
            Err(message) => {
                errors.push(format!("{FIELD}.{key}.count"), message);
                entry_errors = true;
            }
        }
    }

    if entry_errors {
        return None;
    }
    if selection.is_empty() {
        errors.push(
            FIELD,
            "At least one platform must be selected with a positive post count",
        );
        return None;
    }
    Some(selection)
}

fn post_count(request: &Value) -> Result<u32, String> {
    let count = request
        .as_object()
        .and_then(|fields| fields.get("count"))
        .ok_or_else(|| "Post count is required".to_string())?;

    let count = count
        .as_u64()
        .ok_or_else(|| "Post count must be a non-negative integer".to_string())?;

    if count > MAX_POSTS_PER_PLATFORM {
        return Err(format!(
            "Post count must not exceed {MAX_POSTS_PER_PLATFORM}"
        ));
    }
    Ok(count as u32)
}
