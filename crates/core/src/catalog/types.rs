//! Product types and validation rules.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Product {
    /// Unique identifier, assigned by the store on create.
    #[serde(default)]
    pub id: u64,
    /// Product name.
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    /// Product description.
    #[serde(default)]
    pub description: String,
    /// Unit price. Must be greater than zero.
    #[validate(custom(function = validate_price))]
    pub price: Decimal,
    /// Stock keeping unit, `{word}-{word}-{word}` in lowercase.
    #[validate(custom(function = validate_sku))]
    pub sku: String,
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("price").with_message("price must be greater than zero".into()))
    }
}

fn validate_sku(sku: &str) -> Result<(), ValidationError> {
    let mut segments = sku.split('-');
    let well_formed = segments
        .by_ref()
        .take(3)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_lowercase()))
        .count()
        == 3
        && segments.next().is_none();

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("sku")
            .with_message("sku must match {word}-{word}-{word}".into()))
    }
}

/// The default coffee menu the catalog starts with.
#[must_use]
pub fn seed_products() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            name: "Espresso".to_string(),
            description: "Strong and bold espresso coffee.".to_string(),
            price: dec!(2.50),
            sku: "coffee-espresso-basic".to_string(),
        },
        Product {
            id: 2,
            name: "Cappuccino".to_string(),
            description: "Espresso with steamed milk and foam.".to_string(),
            price: dec!(3.00),
            sku: "coffee-cappuccino-foam".to_string(),
        },
        Product {
            id: 3,
            name: "Latte".to_string(),
            description: "Espresso with steamed milk and a light layer of foam.".to_string(),
            price: dec!(3.50),
            sku: "coffee-latte-smooth".to_string(),
        },
        Product {
            id: 4,
            name: "Americano".to_string(),
            description: "Espresso with added hot water.".to_string(),
            price: dec!(2.75),
            sku: "coffee-americano-water".to_string(),
        },
        Product {
            id: 5,
            name: "Mocha".to_string(),
            description: "Espresso with chocolate, steamed milk, and whipped cream.".to_string(),
            price: dec!(4.00),
            sku: "coffee-mocha-choco".to_string(),
        },
        Product {
            id: 6,
            name: "Macchiato".to_string(),
            description: "Espresso with a small amount of steamed milk and foam.".to_string(),
            price: dec!(3.25),
            sku: "coffee-macchiato-steam".to_string(),
        },
        Product {
            id: 7,
            name: "Flat White".to_string(),
            description: "Espresso with steamed milk, similar to a latte but with less foam."
                .to_string(),
            price: dec!(3.75),
            sku: "coffee-flatwhite-creamy".to_string(),
        },
    ]
}
